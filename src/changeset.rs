//! In-memory model of a parsed changeset.
//!
//! A [`Changeset`] is a flat, unordered collection of [`ChangesetFeature`]
//! versions. Modify and delete edits appear as two features sharing one
//! [`FeatureId`]: the version written by this changeset and the version it
//! replaced.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ExtractError;

/// OSM element kind. Part of a feature's identity since ids are only unique per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Node => "node",
            ElementType::Way => "way",
            ElementType::Relation => "relation",
        }
    }
}

impl FromStr for ElementType {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(ElementType::Node),
            "way" => Ok(ElementType::Way),
            "relation" => Ok(ElementType::Relation),
            other => Err(ExtractError::Parse(format!("unknown element type '{other}'"))),
        }
    }
}

/// Stable identity of a feature across its versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureId {
    pub element_type: ElementType,
    pub id: i64,
}

impl FeatureId {
    pub fn new(element_type: ElementType, id: i64) -> Self {
        Self { element_type, id }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.element_type.as_str(), self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Modify,
    Delete,
}

impl FromStr for Action {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(Action::Create),
            "modify" => Ok(Action::Modify),
            "delete" => Ok(Action::Delete),
            other => Err(ExtractError::Parse(format!("unknown action '{other}'"))),
        }
    }
}

/// Coordinates are `(lon, lat)` in degrees.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Geometry {
    Point(f64, f64),
    LineString(Vec<(f64, f64)>),
    #[default]
    Empty,
}

/// One version of a geographic object touched by a changeset.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangesetFeature {
    pub id: FeatureId,
    pub version: u64,
    pub action: Action,
    pub geometry: Geometry,
    pub properties: BTreeMap<String, String>,
}

/// Axis-aligned extent declared in changeset metadata, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Changeset {
    pub id: String,
    pub uid: Option<String>,
    pub username: Option<String>,
    pub bbox: Option<BoundingBox>,
    pub features: Vec<ChangesetFeature>,
}

impl Changeset {
    /// All versions of `feature_id` present in the changeset, in input order.
    pub fn versions_of(&self, feature_id: FeatureId) -> impl Iterator<Item = &ChangesetFeature> {
        self.features.iter().filter(move |f| f.id == feature_id)
    }
}
