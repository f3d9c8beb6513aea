//! Error types emitted by the georisk CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>`.

use std::sync::Arc;

use georisk_core::ParseBoundsError;
use georisk_data::{ScrapeError, overpass::SourceBuildError};
use thiserror::Error;

/// Errors emitted by the georisk CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// Two options that cannot be combined were both set.
    #[error("--{first} cannot be combined with --{second}")]
    ConflictingArguments {
        /// Option taking precedence in the message.
        first: &'static str,
        /// Option it conflicts with.
        second: &'static str,
    },
    /// The named area is not in the registry.
    #[error("unknown area {name:?} (known areas: {known})")]
    UnknownArea {
        /// Requested name.
        name: String,
        /// Comma-separated registry names.
        known: String,
    },
    /// `--bbox` could not be parsed.
    #[error("invalid --bbox {value:?}")]
    InvalidBbox {
        /// Raw option value.
        value: String,
        /// Parse failure.
        #[source]
        source: ParseBoundsError,
    },
    /// A numeric option is out of range.
    #[error("--{field} {reason}")]
    InvalidArgument {
        /// Offending option.
        field: &'static str,
        /// What was wrong with it.
        reason: &'static str,
    },
    /// The HTTP source could not be constructed.
    #[error("failed to prepare the Overpass client")]
    BuildSource(#[from] SourceBuildError),
    /// A single-area scrape failed.
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    /// At least one area of a batch run failed.
    #[error("{failed} of {total} areas failed: {areas}")]
    BatchFailed {
        /// Number of failed areas.
        failed: usize,
        /// Number of areas attempted.
        total: usize,
        /// Comma-separated names of the failed areas.
        areas: String,
    },
    /// Writing the command's report failed.
    #[error("failed to write output")]
    WriteOutput(#[source] std::io::Error),
}
