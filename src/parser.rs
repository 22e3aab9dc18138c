//! JSON parser for real changeset documents.
//!
//! A real changeset is `{"metadata": {...}, "elements": [...]}` where each
//! modified or deleted element embeds the version it replaced under `old`.
//! Numeric values show up both as JSON numbers and as strings.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::changeset::{BoundingBox, Changeset, ChangesetFeature, ElementType, FeatureId, Geometry};
use crate::error::{ExtractError, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    fn text(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Number(n) => n.as_i64(),
            Scalar::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawChangeset {
    metadata: RawMetadata,
    #[serde(default)]
    elements: Vec<RawElement>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    id: Scalar,
    uid: Option<Scalar>,
    user: Option<String>,
    min_lat: Option<Scalar>,
    min_lon: Option<Scalar>,
    max_lat: Option<Scalar>,
    max_lon: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct RawElement {
    #[serde(rename = "type")]
    element_type: Option<String>,
    id: Option<Scalar>,
    version: Option<Scalar>,
    action: Option<String>,
    lat: Option<Scalar>,
    lon: Option<Scalar>,
    #[serde(default)]
    nodes: Vec<Value>,
    #[serde(default)]
    tags: Option<BTreeMap<String, String>>,
    old: Option<Box<RawElement>>,
}

/// Decodes one real changeset JSON document into a [`Changeset`].
///
/// # Errors
///
/// Returns [`ExtractError::Json`] for malformed JSON and
/// [`ExtractError::Parse`] or [`ExtractError::InvalidCoordinate`] when the
/// document does not describe a valid changeset.
pub fn parse_changeset(bytes: &[u8]) -> Result<Changeset> {
    let raw: RawChangeset = serde_json::from_slice(bytes)?;

    let mut features = Vec::with_capacity(raw.elements.len() * 2);
    for element in &raw.elements {
        let feature = to_feature(element, None)?;
        if let Some(old) = &element.old {
            let old_feature = to_feature(old, Some(&feature))?;
            features.push(feature);
            features.push(old_feature);
        } else {
            features.push(feature);
        }
    }

    Ok(Changeset {
        id: raw.metadata.id.text(),
        uid: raw.metadata.uid.as_ref().map(Scalar::text),
        username: raw.metadata.user.clone(),
        bbox: parse_bbox(&raw.metadata)?,
        features,
    })
}

/// Converts a raw element. `parent` is set for an `old` version, which
/// inherits identity and action from the element that replaced it.
fn to_feature(element: &RawElement, parent: Option<&ChangesetFeature>) -> Result<ChangesetFeature> {
    let id = match (&element.element_type, &element.id, parent) {
        (Some(t), Some(id), _) => FeatureId::new(t.parse()?, parse_i64("id", id)?),
        (_, _, Some(parent)) => parent.id,
        _ => return Err(ExtractError::parse("element without type or id")),
    };

    let action = match (&element.action, parent) {
        (_, Some(parent)) => parent.action,
        (Some(action), None) => action.parse()?,
        (None, None) => return Err(ExtractError::Parse(format!("element {id} has no action"))),
    };

    let version = match &element.version {
        Some(v) => parse_i64("version", v)?,
        None => return Err(ExtractError::Parse(format!("element {id} has no version"))),
    };
    let version = u64::try_from(version)
        .map_err(|_| ExtractError::Parse(format!("element {id} has negative version")))?;

    Ok(ChangesetFeature {
        id,
        version,
        action,
        geometry: element_geometry(id.element_type, element)?,
        properties: element.tags.clone().unwrap_or_default(),
    })
}

fn element_geometry(element_type: ElementType, element: &RawElement) -> Result<Geometry> {
    match element_type {
        ElementType::Node => match (&element.lon, &element.lat) {
            (Some(lon), Some(lat)) => Ok(Geometry::Point(
                parse_coordinate("lon", lon)?,
                parse_coordinate("lat", lat)?,
            )),
            _ => Ok(Geometry::Empty),
        },
        ElementType::Way => {
            let coords: Vec<(f64, f64)> = element
                .nodes
                .iter()
                .filter_map(|node| {
                    let lon = node.get("lon").and_then(value_as_f64)?;
                    let lat = node.get("lat").and_then(value_as_f64)?;
                    Some((lon, lat))
                })
                .collect();
            if coords.len() < 2 {
                Ok(Geometry::Empty)
            } else {
                Ok(Geometry::LineString(coords))
            }
        }
        ElementType::Relation => Ok(Geometry::Empty),
    }
}

fn parse_bbox(metadata: &RawMetadata) -> Result<Option<BoundingBox>> {
    let (Some(min_lon), Some(min_lat), Some(max_lon), Some(max_lat)) = (
        &metadata.min_lon,
        &metadata.min_lat,
        &metadata.max_lon,
        &metadata.max_lat,
    ) else {
        return Ok(None);
    };

    Ok(Some(BoundingBox {
        min_lon: parse_coordinate("min_lon", min_lon)?,
        min_lat: parse_coordinate("min_lat", min_lat)?,
        max_lon: parse_coordinate("max_lon", max_lon)?,
        max_lat: parse_coordinate("max_lat", max_lat)?,
    }))
}

fn parse_coordinate(field: &'static str, value: &Scalar) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ExtractError::InvalidCoordinate {
            field,
            value: value.text(),
        })
}

fn parse_i64(field: &str, value: &Scalar) -> Result<i64> {
    value
        .as_i64()
        .ok_or_else(|| ExtractError::Parse(format!("{field} is not an integer: {}", value.text())))
}

fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
