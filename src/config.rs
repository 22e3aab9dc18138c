//! Enrichment stage selection.

use crate::features::Column;
use crate::geometry::BboxAxisOrder;

/// Optional stages applied on top of the base action counts.
///
/// The label join always runs; these stages only add columns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Enrichment {
    /// Join contributor id, name and profile counts.
    pub contributor: bool,
    /// Compute the changeset bbox area. `None` disables the stage.
    pub geometry: Option<BboxAxisOrder>,
}

impl Enrichment {
    pub fn full() -> Self {
        Self {
            contributor: true,
            geometry: Some(BboxAxisOrder::default()),
        }
    }

    /// Output columns for this configuration, in fixed order.
    pub fn columns(&self) -> Vec<Column> {
        let mut columns = Column::BASE.to_vec();
        if self.contributor {
            columns.extend(Column::CONTRIBUTOR);
        }
        if self.geometry.is_some() {
            columns.push(Column::ChangesetBboxArea);
        }
        columns
    }
}
