//! CSV emission of feature rows.

use std::io::Write;

use csv::WriterBuilder;
use tracing::debug;

use crate::error::{ExtractError, Result};
use crate::features::{Column, FeatureRow};

/// Writes feature rows as CSV, preceded by a single header line.
///
/// The header goes out with the first row, so a run that emits nothing
/// writes nothing. Construct one emitter per run and share it.
pub struct RowEmitter<W: Write> {
    writer: csv::Writer<W>,
    columns: Vec<Column>,
    header_written: bool,
    rows_written: usize,
}

impl<W: Write> RowEmitter<W> {
    pub fn new(writer: W, columns: Vec<Column>) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false) // header is managed here, not by csv
            .from_writer(writer);

        Self {
            writer,
            columns,
            header_written: false,
            rows_written: 0,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Serializes `row` in column order. Unknown fields are left empty.
    pub fn emit(&mut self, row: &FeatureRow) -> Result<()> {
        if !self.header_written {
            debug!(columns = self.columns.len(), "Writing CSV header");
            self.writer
                .write_record(self.columns.iter().map(Column::name))?;
            self.header_written = true;
        }

        self.writer.write_record(
            self.columns
                .iter()
                .map(|column| row.field(*column).unwrap_or_default()),
        )?;
        self.writer.flush()?;
        self.rows_written += 1;

        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| ExtractError::Io(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str) -> FeatureRow {
        FeatureRow {
            changeset_id: id.to_string(),
            harmful: Some(true),
            features_created: 1,
            features_modified: 2,
            features_deleted: 3,
            ..Default::default()
        }
    }

    fn emit_all(columns: Vec<Column>, rows: &[FeatureRow]) -> String {
        let mut emitter = RowEmitter::new(Vec::new(), columns);
        for r in rows {
            emitter.emit(r).unwrap();
        }
        String::from_utf8(emitter.into_inner().unwrap()).unwrap()
    }

    #[test]
    fn test_single_row_has_header() {
        let content = emit_all(Column::BASE.to_vec(), &[row("1")]);
        assert_eq!(
            content,
            "changeset_id,harmful,features_created,features_modified,features_deleted\n\
             1,True,1,2,3\n"
        );
    }

    #[test]
    fn test_header_written_once_for_many_rows() {
        let rows: Vec<_> = (0..100).map(|i| row(&i.to_string())).collect();
        let content = emit_all(Column::BASE.to_vec(), &rows);

        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 101);
        let header_count = lines.iter().filter(|l| l.starts_with("changeset_id")).count();
        assert_eq!(header_count, 1);
    }

    #[test]
    fn test_nothing_written_without_rows() {
        let content = emit_all(Column::BASE.to_vec(), &[]);
        assert!(content.is_empty());
    }

    #[test]
    fn test_missing_fields_are_empty() {
        let mut columns = Column::BASE.to_vec();
        columns.extend(Column::CONTRIBUTOR);
        columns.push(Column::ChangesetBboxArea);

        let content = emit_all(columns, &[row("9").with_label(None)]);
        let data = content.lines().nth(1).unwrap();
        assert_eq!(data, "9,,1,2,3,,,,,");
    }

    #[test]
    fn test_round_trip_with_quotes_and_commas() {
        let mut columns = Column::BASE.to_vec();
        columns.extend(Column::CONTRIBUTOR);

        let mut r = row("77");
        r.user_id = Some("5".to_string());
        r.user_name = Some("Smith, \"Map\" Maker".to_string());
        r.user_changesets = Some(4);
        let content = emit_all(columns.clone(), &[r.clone()]);

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().unwrap().clone();
        let names: Vec<_> = columns.iter().map(Column::name).collect();
        assert_eq!(headers.iter().collect::<Vec<_>>(), names);

        let record = rdr.records().next().unwrap().unwrap();
        for (i, column) in columns.iter().enumerate() {
            assert_eq!(record.get(i).unwrap(), r.field(*column).unwrap_or_default());
        }
        assert_eq!(record.get(6).unwrap(), "Smith, \"Map\" Maker");
    }

    #[test]
    fn test_rows_written_counter() {
        let mut emitter = RowEmitter::new(Vec::new(), Column::BASE.to_vec());
        emitter.emit(&row("1")).unwrap();
        emitter.emit(&row("2")).unwrap();
        assert_eq!(emitter.rows_written(), 2);
        assert_eq!(emitter.columns().len(), 5);
    }
}
