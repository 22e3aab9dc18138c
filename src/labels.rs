//! Harmful/not-harmful labels keyed by changeset id.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use tracing::{debug, info};

use crate::error::Result;

/// In-memory label table loaded from a `changeset_id,harmful` CSV.
#[derive(Debug, Default)]
pub struct LabelTable {
    labels: HashMap<String, bool>,
}

impl LabelTable {
    /// Loads the table from a CSV file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or is not valid CSV. There is no
    /// partial mode without labels.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let table = Self::from_reader(file)?;
        info!(path = %path.display(), labels = table.len(), "Label table loaded");
        Ok(table)
    }

    /// Reads rows with the changeset id in column 0 and the label in column 1.
    ///
    /// Rows whose label is not a boolean (such as a header) are skipped. When
    /// an id repeats, the first row wins.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut labels = HashMap::new();
        for record in rdr.records() {
            let record = record?;
            let (Some(id), Some(label)) = (record.get(0), record.get(1)) else {
                continue;
            };
            match parse_label(label) {
                Some(harmful) => {
                    labels.entry(id.trim().to_string()).or_insert(harmful);
                }
                None => debug!(row = ?record, "Skipping row without boolean label"),
            }
        }

        Ok(Self { labels })
    }

    /// Returns the label for `changeset_id`, or `None` if it was never labelled.
    pub fn lookup(&self, changeset_id: &str) -> Option<bool> {
        self.labels.get(changeset_id.trim()).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

fn parse_label(value: &str) -> Option<bool> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") => Some(true),
        v if v.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}
