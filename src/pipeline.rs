//! Per-changeset extraction and the batch driver around it.

use std::io::Write;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, warn};

use crate::changeset::Changeset;
use crate::config::Enrichment;
use crate::error::ExtractError;
use crate::features::{Column, FeatureRow};
use crate::geometry::bbox_area_km2;
use crate::labels::LabelTable;
use crate::output::RowEmitter;
use crate::parser::parse_changeset;
use crate::profiles::{ContributorProfile, ProfileLookup};

/// Turns parsed changesets into feature rows.
pub struct Extractor {
    labels: LabelTable,
    enrichment: Enrichment,
    profiles: Option<ProfileLookup>,
}

impl Extractor {
    pub fn new(labels: LabelTable, enrichment: Enrichment) -> Self {
        Self {
            labels,
            enrichment,
            profiles: None,
        }
    }

    /// Profile source for the contributor stage. Without one, profile
    /// columns stay empty.
    pub fn with_profiles(mut self, profiles: ProfileLookup) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn columns(&self) -> Vec<Column> {
        self.enrichment.columns()
    }

    /// Builds the feature row for one changeset.
    ///
    /// Missing labels, profiles and bounding boxes leave their fields empty.
    ///
    /// # Errors
    ///
    /// Fails only when the changeset is malformed.
    pub async fn extract(&self, changeset: &Changeset) -> Result<FeatureRow, ExtractError> {
        let harmful = self.labels.lookup(&changeset.id);
        if harmful.is_none() {
            debug!("No label for changeset");
        }
        let mut row = FeatureRow::from_changeset(changeset)?.with_label(harmful);

        if self.enrichment.contributor {
            let profile = match (&self.profiles, &changeset.uid) {
                (Some(profiles), Some(uid)) => profiles.lookup(uid).await,
                _ => ContributorProfile::default(),
            };
            row = row.with_contributor(changeset, &profile);
        }

        if let Some(order) = self.enrichment.geometry {
            let area = changeset.bbox.as_ref().map(|bbox| bbox_area_km2(bbox, order));
            if area.is_none() {
                debug!("Changeset has no bounding box");
            }
            row = row.with_bbox_area(area);
        }

        Ok(row)
    }
}

/// What happened to one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    Emitted,
    Blank,
    ParseError,
    Malformed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub emitted: usize,
    pub parse_errors: usize,
    pub malformed: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Emitted => self.emitted += 1,
            LineOutcome::ParseError => self.parse_errors += 1,
            LineOutcome::Malformed => self.malformed += 1,
            LineOutcome::Blank => {}
        }
    }
}

/// Parses, extracts and emits one JSON line.
///
/// Lines that are not UTF-8 or not a valid changeset, and malformed
/// changesets, are logged and reported as outcomes; only a failure to
/// write output is an error.
pub async fn process_line<W: Write>(
    extractor: &Extractor,
    emitter: &Mutex<RowEmitter<W>>,
    line: &[u8],
) -> Result<LineOutcome> {
    let text = match std::str::from_utf8(line) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Skipping line that is not valid UTF-8");
            return Ok(LineOutcome::ParseError);
        }
    };
    if text.trim().is_empty() {
        return Ok(LineOutcome::Blank);
    }

    let changeset = match parse_changeset(text.as_bytes()) {
        Ok(changeset) => changeset,
        Err(e) => {
            warn!(error = %e, "Skipping unparseable changeset");
            return Ok(LineOutcome::ParseError);
        }
    };

    let span = tracing::info_span!("changeset", changeset_id = %changeset.id);
    let row = match extractor.extract(&changeset).instrument(span).await {
        Ok(row) => row,
        Err(e) => {
            warn!(changeset_id = %changeset.id, error = %e, "Skipping changeset");
            return Ok(if e.is_malformed() {
                LineOutcome::Malformed
            } else {
                LineOutcome::ParseError
            });
        }
    };

    emitter
        .lock()
        .map_err(|_| anyhow::anyhow!("row emitter lock poisoned"))?
        .emit(&row)?;
    Ok(LineOutcome::Emitted)
}

/// Processes every line of `input`, keeping at most `concurrency`
/// extractions in flight.
pub async fn run<R, W>(
    extractor: Arc<Extractor>,
    input: R,
    emitter: Arc<Mutex<RowEmitter<W>>>,
    concurrency: usize,
) -> Result<RunSummary>
where
    R: AsyncBufRead + Unpin,
    W: Write + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut summary = RunSummary::default();
    // split on raw bytes so one undecodable line cannot end the batch
    let mut lines = input.split(b'\n');
    let mut line_no = 0usize;

    while let Some(line) = lines.next_segment().await? {
        line_no += 1;
        let permit = semaphore.clone().acquire_owned().await?;
        let extractor = extractor.clone();
        let emitter = emitter.clone();

        tasks.spawn(
            async move {
                let _permit = permit;
                process_line(&extractor, &emitter, &line).await
            }
            .instrument(tracing::debug_span!("line", line_no)),
        );

        while let Some(done) = tasks.try_join_next() {
            summary.record(done??);
        }
    }

    while let Some(done) = tasks.join_next().await {
        summary.record(done??);
    }

    info!(
        lines = line_no,
        emitted = summary.emitted,
        parse_errors = summary.parse_errors,
        malformed = summary.malformed,
        "Extraction finished"
    );
    Ok(summary)
}
