//! Balanced sampling of labelled changeset rows.
//!
//! Picks up to N harmful and M not-harmful rows from a labelled changeset
//! export, preserving the rows verbatim, to build training sets.

use std::io::{Read, Write};

use csv::{ReaderBuilder, WriterBuilder};
use tracing::info;

use crate::error::Result;

/// Column holding the `True`/`False` label in the changeset export.
pub const DEFAULT_LABEL_COLUMN: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLimits {
    pub harmful: usize,
    pub not_harmful: usize,
    /// Rows before this index, header included, are skipped.
    pub start_row: usize,
    pub label_column: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleCounts {
    pub harmful: usize,
    pub not_harmful: usize,
}

/// Copies matching rows from `input` to `output` in input order.
pub fn sample_rows<R: Read, W: Write>(
    input: R,
    output: W,
    limits: SampleLimits,
) -> Result<SampleCounts> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(output);
    let mut counts = SampleCounts::default();

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        if i < limits.start_row {
            continue;
        }
        if counts.harmful >= limits.harmful && counts.not_harmful >= limits.not_harmful {
            break;
        }

        let keep = match record.get(limits.label_column) {
            Some("True") if counts.harmful < limits.harmful => {
                counts.harmful += 1;
                true
            }
            Some("False") if counts.not_harmful < limits.not_harmful => {
                counts.not_harmful += 1;
                true
            }
            _ => false,
        };
        if keep {
            wtr.write_record(&record)?;
        }
    }

    wtr.flush()?;
    info!(
        harmful = counts.harmful,
        not_harmful = counts.not_harmful,
        "Sampling complete"
    );
    Ok(counts)
}
