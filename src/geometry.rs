//! Bounding-box area on a spherical earth.

use crate::changeset::BoundingBox;

/// WGS84 equatorial radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// How bbox coordinates are fed into the polygon builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BboxAxisOrder {
    /// Longitude as x, latitude as y.
    #[default]
    LonLat,
    /// Latitude as x, longitude as y. Reproduces feature files generated by
    /// the older extraction scripts.
    LatLon,
}

/// Geodesic area of the bounding box in square kilometers.
pub fn bbox_area_km2(bbox: &BoundingBox, order: BboxAxisOrder) -> f64 {
    let ring = match order {
        BboxAxisOrder::LonLat => bbox_ring(bbox.min_lon, bbox.min_lat, bbox.max_lon, bbox.max_lat),
        BboxAxisOrder::LatLon => bbox_ring(bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon),
    };
    ring_area_m2(&ring) / 1_000_000.0
}

fn bbox_ring(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> [(f64, f64); 4] {
    [(min_x, min_y), (max_x, min_y), (max_x, max_y), (min_x, max_y)]
}

/// Area of an open ring of `(lon, lat)` degree pairs in square meters.
///
/// Chamberlain & Duquette, "Some Algorithms for Polygons on a Sphere" (2007).
pub fn ring_area_m2(ring: &[(f64, f64)]) -> f64 {
    let n = ring.len();
    if n < 3 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in 0..n {
        let (prev_lon, _) = ring[(i + n - 1) % n];
        let (_, lat) = ring[i];
        let (next_lon, _) = ring[(i + 1) % n];
        total += (next_lon.to_radians() - prev_lon.to_radians()) * lat.to_radians().sin();
    }

    (total * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> BoundingBox {
        BoundingBox {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    #[test]
    fn test_small_square_at_equator() {
        // ~1.11km x ~1.11km
        let area = bbox_area_km2(&bbox(0.0, 0.0, 0.01, 0.01), BboxAxisOrder::LonLat);
        assert!((area - 1.2392).abs() < 0.001, "area was {area}");
    }

    #[test]
    fn test_degenerate_bbox_has_zero_area() {
        let area = bbox_area_km2(&bbox(10.0, 45.0, 10.0, 45.0), BboxAxisOrder::LonLat);
        assert_eq!(area, 0.0);
    }

    #[test]
    fn test_area_shrinks_towards_poles() {
        let equator = bbox_area_km2(&bbox(0.0, 0.0, 1.0, 1.0), BboxAxisOrder::LonLat);
        let north = bbox_area_km2(&bbox(0.0, 60.0, 1.0, 61.0), BboxAxisOrder::LonLat);
        assert!(north < equator);
        assert!((north / equator - 0.49).abs() < 0.02);
    }

    #[test]
    fn test_axis_order_matters_for_asymmetric_bbox() {
        let b = bbox(13.3, 52.4, 13.5, 52.6);
        let lon_lat = bbox_area_km2(&b, BboxAxisOrder::LonLat);
        let lat_lon = bbox_area_km2(&b, BboxAxisOrder::LatLon);
        assert!(lon_lat > 0.0);
        assert!(lat_lon > 0.0);
        assert!((lon_lat - lat_lon).abs() > 1.0);
    }

    #[test]
    fn test_ring_area_too_few_points() {
        assert_eq!(ring_area_m2(&[(0.0, 0.0), (1.0, 1.0)]), 0.0);
    }

    #[test]
    fn test_ring_area_independent_of_winding() {
        let ccw = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        let cw = [(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0)];
        assert!((ring_area_m2(&ccw) - ring_area_m2(&cw)).abs() < 1e-6);
    }
}
