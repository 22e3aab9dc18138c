//! Partitions a changeset's features by edit action.

use std::collections::HashSet;

use crate::changeset::{Action, Changeset, ChangesetFeature};
use crate::error::Result;
use crate::versions::{VersionPair, resolve_versions};

/// Features of one changeset grouped by action.
///
/// Each bucket is computed independently, so a feature that was both
/// modified and deleted in the same changeset shows up in both.
#[derive(Debug, Default)]
pub struct Classification<'a> {
    pub created: Vec<&'a ChangesetFeature>,
    pub modified: Vec<VersionPair<'a>>,
    pub deleted: Vec<VersionPair<'a>>,
}

impl Classification<'_> {
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.created.len(), self.modified.len(), self.deleted.len())
    }
}

pub fn classify(changeset: &Changeset) -> Result<Classification<'_>> {
    Ok(Classification {
        created: features_created(changeset),
        modified: paired_by_action(changeset, Action::Modify)?,
        deleted: paired_by_action(changeset, Action::Delete)?,
    })
}

pub fn features_created(changeset: &Changeset) -> Vec<&ChangesetFeature> {
    changeset
        .features
        .iter()
        .filter(|f| f.action == Action::Create)
        .collect()
}

/// One [`VersionPair`] per distinct feature carrying `action`, in order of
/// first appearance.
fn paired_by_action(changeset: &Changeset, action: Action) -> Result<Vec<VersionPair<'_>>> {
    let mut seen = HashSet::new();
    let mut pairs = Vec::new();

    for feature in changeset.features.iter().filter(|f| f.action == action) {
        if seen.insert(feature.id) {
            pairs.push(resolve_versions(changeset, feature.id)?);
        }
    }

    Ok(pairs)
}
