//! Scrape command implementation for the georisk CLI.

use std::{io::Write, time::Duration};

use camino::Utf8PathBuf;
use clap::Parser;
use georisk_core::{Area, AreaRegistry, BoundingBox};
use georisk_data::{
    BatchOptions, BatchRunner, BatchSummary, DEFAULT_BATCH_DELAY, DEFAULT_OUTPUT_DIR,
    ScrapeReport, Scraper,
    batch::error_chain,
    overpass::{
        DEFAULT_CLIENT_TIMEOUT_SECS, DEFAULT_ENDPOINT, DEFAULT_MAX_ATTEMPTS, HttpOverpassSource,
        HttpOverpassSourceConfig, OverpassSource, RetryPolicy, Sleeper, ThreadSleeper,
    },
};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::{
    ARG_ALL_AREAS, ARG_AREA, ARG_BATCH_DELAY_SECS, ARG_BBOX, ARG_ENDPOINT, ARG_MAX_ATTEMPTS,
    ARG_OUTPUT, ARG_OUTPUT_DIR, ARG_TIMEOUT_SECS, CUSTOM_AREA_NAME, CliError, DEFAULT_AREA,
};

/// CLI arguments for the `scrape` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch building footprints for one area, a custom bounding \
                 box, or every built-in area, classify each building's \
                 seismic risk and write GeoJSON. Options can come from CLI \
                 flags, configuration files, or GEORISK_* environment \
                 variables.",
    about = "Scrape buildings into GeoJSON"
)]
#[ortho_config(prefix = "GEORISK")]
pub(crate) struct ScrapeArgs {
    /// Built-in area to scrape, or the name used with --bbox.
    #[arg(long = ARG_AREA, value_name = "name")]
    #[serde(default)]
    pub(crate) area: Option<String>,
    /// Custom bounding box as "south,west,north,east".
    #[arg(long = ARG_BBOX, value_name = "S,W,N,E", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// Scrape every built-in area in order.
    #[arg(
        long = ARG_ALL_AREAS,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    #[serde(default)]
    pub(crate) all_areas: Option<bool>,
    /// Output file; relative paths resolve against --output-dir.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
    /// Directory for output files (default "data").
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Overpass interpreter URL.
    #[arg(long = ARG_ENDPOINT, value_name = "url")]
    #[serde(default)]
    pub(crate) endpoint: Option<String>,
    /// Client-side request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// Attempts per area before giving up.
    #[arg(long = ARG_MAX_ATTEMPTS, value_name = "n")]
    #[serde(default)]
    pub(crate) max_attempts: Option<u32>,
    /// Pause between areas in batch mode, in seconds.
    #[arg(long = ARG_BATCH_DELAY_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) batch_delay_secs: Option<u64>,
}

impl ScrapeArgs {
    pub(crate) fn into_config(self) -> Result<ScrapeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScrapeConfig::try_from(merged)
    }
}

/// What a scrape invocation covers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ScrapeTarget {
    /// One area, optionally with an explicit output file.
    Single {
        area: Area,
        output: Option<Utf8PathBuf>,
    },
    /// Every area of the built-in registry.
    All,
}

/// Resolved `scrape` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ScrapeConfig {
    pub(crate) target: ScrapeTarget,
    pub(crate) output_dir: Utf8PathBuf,
    pub(crate) endpoint: String,
    pub(crate) timeout: Duration,
    pub(crate) max_attempts: u32,
    pub(crate) batch_delay: Duration,
}

impl TryFrom<ScrapeArgs> for ScrapeConfig {
    type Error = CliError;

    fn try_from(args: ScrapeArgs) -> Result<Self, Self::Error> {
        let target = resolve_target(&args)?;
        let timeout_secs = args.timeout_secs.unwrap_or(DEFAULT_CLIENT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_TIMEOUT_SECS,
                reason: "must be at least 1",
            });
        }
        let max_attempts = args.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        if max_attempts == 0 {
            return Err(CliError::InvalidArgument {
                field: ARG_MAX_ATTEMPTS,
                reason: "must be at least 1",
            });
        }
        Ok(Self {
            target,
            output_dir: args
                .output_dir
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR)),
            endpoint: args.endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_owned()),
            timeout: Duration::from_secs(timeout_secs),
            max_attempts,
            batch_delay: args
                .batch_delay_secs
                .map_or(DEFAULT_BATCH_DELAY, Duration::from_secs),
        })
    }
}

fn resolve_target(args: &ScrapeArgs) -> Result<ScrapeTarget, CliError> {
    if args.all_areas.unwrap_or(false) {
        let conflict = [
            (ARG_OUTPUT, args.output.is_some()),
            (ARG_BBOX, args.bbox.is_some()),
            (ARG_AREA, args.area.is_some()),
        ]
        .into_iter()
        .find_map(|(field, set)| set.then_some(field));
        return match conflict {
            Some(second) => Err(CliError::ConflictingArguments {
                first: ARG_ALL_AREAS,
                second,
            }),
            None => Ok(ScrapeTarget::All),
        };
    }

    let area = match &args.bbox {
        Some(raw) => {
            let bounds: BoundingBox = raw.parse().map_err(|source| CliError::InvalidBbox {
                value: raw.clone(),
                source,
            })?;
            let name = args.area.as_deref().unwrap_or(CUSTOM_AREA_NAME);
            Area::new(name, bounds)
        }
        None => lookup_area(args.area.as_deref().unwrap_or(DEFAULT_AREA))?,
    };
    Ok(ScrapeTarget::Single {
        area,
        output: args.output.clone(),
    })
}

fn lookup_area(name: &str) -> Result<Area, CliError> {
    let registry = AreaRegistry::kenya();
    registry
        .get(name)
        .cloned()
        .ok_or_else(|| CliError::UnknownArea {
            name: name.to_owned(),
            known: registry.names().collect::<Vec<_>>().join(", "),
        })
}

/// Builds the Overpass source for a resolved configuration.
pub(crate) trait SourceBuilder {
    fn build(&self, config: &ScrapeConfig) -> Result<Box<dyn OverpassSource>, CliError>;
}

pub(crate) struct HttpSourceBuilder;

impl SourceBuilder for HttpSourceBuilder {
    fn build(&self, config: &ScrapeConfig) -> Result<Box<dyn OverpassSource>, CliError> {
        let source = HttpOverpassSource::with_config(
            HttpOverpassSourceConfig::new(config.endpoint.clone()).with_timeout(config.timeout),
        )?;
        Ok(Box::new(source))
    }
}

pub(crate) fn run_scrape(args: ScrapeArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_scrape_with(args, &HttpSourceBuilder, &ThreadSleeper, &mut stdout)
}

pub(crate) fn run_scrape_with(
    args: ScrapeArgs,
    builder: &dyn SourceBuilder,
    sleeper: &dyn Sleeper,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    execute_scrape(&config, builder, sleeper, writer)
}

pub(crate) fn execute_scrape(
    config: &ScrapeConfig,
    builder: &dyn SourceBuilder,
    sleeper: &dyn Sleeper,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let source = builder.build(config)?;
    info!("Using Overpass endpoint {}", source.endpoint());
    let scraper = Scraper::new(source)
        .with_sleeper(sleeper)
        .with_policy(RetryPolicy::new(config.max_attempts))
        .with_output_dir(config.output_dir.clone());
    match &config.target {
        ScrapeTarget::Single { area, output } => {
            let report = scraper.scrape_area(area, output.as_deref())?;
            write_report(writer, &report)
        }
        ScrapeTarget::All => {
            let summary = BatchRunner::new(&scraper)
                .with_options(BatchOptions::default().with_delay(config.batch_delay))
                .run(&AreaRegistry::kenya());
            write_summary(writer, &summary)?;
            check_summary(&summary)
        }
    }
}

fn write_report(writer: &mut dyn Write, report: &ScrapeReport) -> Result<(), CliError> {
    writeln!(
        writer,
        "{}: {} features written to {} ({} dropped without geometry, {} attempt(s))",
        report.area, report.features, report.path, report.dropped, report.attempts
    )
    .map_err(CliError::WriteOutput)
}

fn write_summary(writer: &mut dyn Write, summary: &BatchSummary) -> Result<(), CliError> {
    for outcome in &summary.outcomes {
        match &outcome.result {
            Ok(report) => write_report(writer, report)?,
            Err(error) => writeln!(writer, "{}: failed: {}", outcome.area, error_chain(error))
                .map_err(CliError::WriteOutput)?,
        }
    }
    Ok(())
}

fn check_summary(summary: &BatchSummary) -> Result<(), CliError> {
    let failed: Vec<&str> = summary.failed().map(|(area, _)| area).collect();
    if failed.is_empty() {
        return Ok(());
    }
    Err(CliError::BatchFailed {
        failed: failed.len(),
        total: summary.outcomes.len(),
        areas: failed.join(", "),
    })
}
