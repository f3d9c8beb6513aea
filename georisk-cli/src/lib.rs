//! Command-line interface for the georisk building scraper.
#![forbid(unsafe_code)]

use std::io::Write;

use clap::{Parser, Subcommand};
use georisk_core::AreaRegistry;

mod error;
mod scrape;

pub use error::CliError;

use scrape::{ScrapeArgs, run_scrape};

const ARG_AREA: &str = "area";
const ARG_BBOX: &str = "bbox";
const ARG_ALL_AREAS: &str = "all-areas";
const ARG_OUTPUT: &str = "output";
const ARG_OUTPUT_DIR: &str = "output-dir";
const ARG_ENDPOINT: &str = "endpoint";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_MAX_ATTEMPTS: &str = "max-attempts";
const ARG_BATCH_DELAY_SECS: &str = "batch-delay-secs";

/// Area scraped when neither `--area` nor `--bbox` is given.
const DEFAULT_AREA: &str = "Nairobi";
/// Name given to a `--bbox` area when `--area` is absent.
const CUSTOM_AREA_NAME: &str = "custom";

/// Run the georisk CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Scrape(args) => run_scrape(args),
        Command::Areas => {
            let mut stdout = std::io::stdout().lock();
            write_areas(&mut stdout, &AreaRegistry::kenya())
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "georisk",
    about = "Scrape building footprints and estimate their seismic risk",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch, classify and write buildings for one or more areas.
    Scrape(ScrapeArgs),
    /// List the built-in areas and their bounding boxes.
    Areas,
}

fn write_areas(writer: &mut dyn Write, registry: &AreaRegistry) -> Result<(), CliError> {
    let width = registry.names().map(str::len).max().unwrap_or(0);
    for area in registry {
        writeln!(writer, "{:<width$}  {}", area.name, area.bounds).map_err(CliError::WriteOutput)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests;
