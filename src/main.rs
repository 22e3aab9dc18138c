//! CLI entry point for changeset feature extraction.
//!
//! Provides subcommands for turning real changeset dumps into labelled
//! feature rows and for sampling a balanced labelled changeset list.

use anyhow::{Context, Result};
use changeset_features::{
    config::Enrichment,
    fetch::BasicClient,
    geometry::BboxAxisOrder,
    labels::LabelTable,
    output::RowEmitter,
    pipeline::{Extractor, run},
    profiles::{DEFAULT_PROFILE_URL, OsmCommentsClient, ProfileCache, ProfileLookup},
    sample::{DEFAULT_LABEL_COLUMN, SampleLimits, sample_rows},
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "changeset_features")]
#[command(about = "Extract machine-learning features from OSM changesets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract one feature row per changeset from a JSON-lines dump
    Extract {
        /// Real changesets, one JSON document per line
        #[arg(short, long)]
        changesets: PathBuf,

        /// CSV of `changeset_id,harmful` labels
        #[arg(short, long)]
        labels: PathBuf,

        /// CSV file to write rows to (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum number of changesets processed concurrently
        #[arg(long, default_value_t = 5)]
        concurrency: usize,

        /// Add contributor id, name and profile counts
        #[arg(long, default_value_t = false)]
        contributor: bool,

        /// Add the changeset bounding-box area in square kilometers
        #[arg(long, default_value_t = false)]
        geometry: bool,

        /// Build the bbox polygon with latitude as x, as older feature files did
        #[arg(long, default_value_t = false)]
        legacy_bbox_order: bool,

        /// Directory for cached contributor profiles
        #[arg(long, env = "PROFILE_CACHE_DIR")]
        profile_cache_dir: Option<PathBuf>,

        /// Profile endpoint; `{uid}` is replaced with the contributor id
        #[arg(long, env = "PROFILE_API_URL", default_value = DEFAULT_PROFILE_URL)]
        profile_url: String,

        /// Refetch cached profiles older than this many days
        #[arg(long)]
        profile_max_age_days: Option<i64>,

        /// Timeout for a single profile request, in seconds
        #[arg(long, default_value_t = 30)]
        profile_timeout: u64,
    },
    /// Sample harmful and not-harmful rows from a labelled changeset CSV
    Sample {
        /// Labelled changeset CSV
        #[arg(short, long)]
        changesets: PathBuf,

        /// Maximum number of harmful rows to keep
        #[arg(long)]
        harmful: usize,

        /// Maximum number of not-harmful rows to keep
        #[arg(long)]
        not_harmful: usize,

        /// Skip rows before this index
        #[arg(long, default_value_t = 0)]
        start_row: usize,

        /// Zero-based index of the label column
        #[arg(long, default_value_t = DEFAULT_LABEL_COLUMN)]
        label_column: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file. Stdout carries CSV.
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/changeset_features.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("changeset_features.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            changesets,
            labels,
            output,
            concurrency,
            contributor,
            geometry,
            legacy_bbox_order,
            profile_cache_dir,
            profile_url,
            profile_max_age_days,
            profile_timeout,
        } => {
            let labels = LabelTable::load(&labels)
                .with_context(|| format!("failed to load label table {}", labels.display()))?;

            let enrichment = Enrichment {
                contributor,
                geometry: geometry.then_some(if legacy_bbox_order {
                    BboxAxisOrder::LatLon
                } else {
                    BboxAxisOrder::LonLat
                }),
            };

            let mut extractor = Extractor::new(labels, enrichment);
            if contributor {
                let http = BasicClient::with_timeout(Duration::from_secs(profile_timeout))?;
                let mut lookup =
                    ProfileLookup::new(Box::new(OsmCommentsClient::new(http, profile_url)));
                if let Some(dir) = profile_cache_dir {
                    let mut cache = ProfileCache::new(&dir);
                    if let Some(days) = profile_max_age_days {
                        cache = cache.with_max_age(chrono::Duration::days(days));
                    }
                    info!(dir = %dir.display(), "Profile cache enabled");
                    lookup = lookup.with_cache(cache);
                }
                extractor = extractor.with_profiles(lookup);
            }

            let writer: Box<dyn Write + Send> = match &output {
                Some(path) => Box::new(
                    std::fs::File::create(path)
                        .with_context(|| format!("failed to create {}", path.display()))?,
                ),
                None => Box::new(std::io::stdout()),
            };
            let emitter = Arc::new(Mutex::new(RowEmitter::new(writer, extractor.columns())));

            let input = tokio::fs::File::open(&changesets)
                .await
                .with_context(|| format!("failed to open {}", changesets.display()))?;

            info!(
                changesets = %changesets.display(),
                concurrency,
                contributor,
                geometry,
                "Starting extraction"
            );
            run(
                Arc::new(extractor),
                tokio::io::BufReader::new(input),
                emitter,
                concurrency,
            )
            .await?;
        }
        Commands::Sample {
            changesets,
            harmful,
            not_harmful,
            start_row,
            label_column,
        } => {
            let input = std::fs::File::open(&changesets)
                .with_context(|| format!("failed to open {}", changesets.display()))?;
            let limits = SampleLimits {
                harmful,
                not_harmful,
                start_row,
                label_column,
            };
            sample_rows(input, std::io::stdout().lock(), limits)?;
        }
    }

    Ok(())
}
