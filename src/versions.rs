//! Pairing of old and new versions of an edited feature.

use crate::changeset::{Changeset, ChangesetFeature, FeatureId};
use crate::error::{ExtractError, Result};

/// The version written by a changeset and the version it replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VersionPair<'a> {
    pub new: &'a ChangesetFeature,
    pub old: &'a ChangesetFeature,
}

/// Finds both versions of `feature_id` in the changeset, newest first.
///
/// # Errors
///
/// Returns [`ExtractError::VersionCount`] unless exactly two versions are
/// present, and [`ExtractError::DuplicateVersion`] if both carry the same
/// version number.
pub fn resolve_versions(changeset: &Changeset, feature_id: FeatureId) -> Result<VersionPair<'_>> {
    let mut versions: Vec<&ChangesetFeature> = changeset.versions_of(feature_id).collect();
    if versions.len() != 2 {
        return Err(ExtractError::VersionCount {
            feature_id,
            found: versions.len(),
        });
    }

    versions.sort_by(|a, b| b.version.cmp(&a.version));
    let (new, old) = (versions[0], versions[1]);
    if new.version == old.version {
        return Err(ExtractError::DuplicateVersion {
            feature_id,
            version: new.version,
        });
    }

    Ok(VersionPair { new, old })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::{Action, ElementType, Geometry};
    use std::collections::BTreeMap;

    #[test]
    fn test_resolve_orders_newest_first() {
        let changeset = changeset_with(vec![node(5, 3, Action::Modify), node(5, 4, Action::Modify)]);
        let pair = resolve_versions(&changeset, id(5)).unwrap();
        assert_eq!(pair.new.version, 4);
        assert_eq!(pair.old.version, 3);
    }

    #[test]
    fn test_resolve_is_order_independent() {
        let forward = changeset_with(vec![node(5, 4, Action::Delete), node(5, 3, Action::Delete)]);
        let backward = changeset_with(vec![node(5, 3, Action::Delete), node(5, 4, Action::Delete)]);

        let a = resolve_versions(&forward, id(5)).unwrap();
        let b = resolve_versions(&backward, id(5)).unwrap();
        assert_eq!(a, b);
        assert_eq!(resolve_versions(&forward, id(5)).unwrap(), a);
    }

    #[test]
    fn test_resolve_ignores_other_features() {
        let changeset = changeset_with(vec![
            node(1, 1, Action::Create),
            node(5, 2, Action::Modify),
            node(5, 1, Action::Modify),
            node(6, 9, Action::Modify),
        ]);
        let pair = resolve_versions(&changeset, id(5)).unwrap();
        assert_eq!(pair.new.id, id(5));
        assert_eq!(pair.old.id, id(5));
    }

    #[test]
    fn test_resolve_single_version_is_malformed() {
        let changeset = changeset_with(vec![node(5, 2, Action::Modify)]);
        let err = resolve_versions(&changeset, id(5)).unwrap_err();
        assert!(matches!(err, ExtractError::VersionCount { found: 1, .. }));
    }

    #[test]
    fn test_resolve_three_versions_is_malformed() {
        let changeset = changeset_with(vec![
            node(5, 1, Action::Modify),
            node(5, 2, Action::Modify),
            node(5, 3, Action::Modify),
        ]);
        let err = resolve_versions(&changeset, id(5)).unwrap_err();
        assert!(matches!(err, ExtractError::VersionCount { found: 3, .. }));
    }

    #[test]
    fn test_resolve_equal_versions_is_malformed() {
        let changeset = changeset_with(vec![node(5, 2, Action::Modify), node(5, 2, Action::Modify)]);
        let err = resolve_versions(&changeset, id(5)).unwrap_err();
        assert!(matches!(err, ExtractError::DuplicateVersion { version: 2, .. }));
    }

    // Helper functions for tests
    fn id(n: i64) -> FeatureId {
        FeatureId::new(ElementType::Node, n)
    }

    fn node(n: i64, version: u64, action: Action) -> ChangesetFeature {
        ChangesetFeature {
            id: id(n),
            version,
            action,
            geometry: Geometry::Empty,
            properties: BTreeMap::new(),
        }
    }

    fn changeset_with(features: Vec<ChangesetFeature>) -> Changeset {
        Changeset {
            id: "1".to_string(),
            uid: None,
            username: None,
            bbox: None,
            features,
        }
    }
}
