//! Error types for changeset feature extraction.

use thiserror::Error;

use crate::changeset::FeatureId;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// A modified or deleted feature did not resolve to exactly two versions.
    #[error("malformed changeset: feature {feature_id} has {found} versions, expected 2")]
    VersionCount { feature_id: FeatureId, found: usize },

    #[error("malformed changeset: feature {feature_id} has two copies of version {version}")]
    DuplicateVersion { feature_id: FeatureId, version: u64 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid coordinate for {field}: {value}")]
    InvalidCoordinate { field: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    pub fn parse<E: std::fmt::Display>(e: E) -> Self {
        Self::Parse(e.to_string())
    }

    /// True for errors that mean the changeset itself is inconsistent and
    /// should be skipped rather than retried.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            ExtractError::VersionCount { .. } | ExtractError::DuplicateVersion { .. }
        )
    }
}
