//! Data access and processing for the georisk building scraper.
//!
//! Responsibilities:
//! - Build Overpass queries and fetch them with bounded retries
//!   ([`overpass`]).
//! - Normalise raw elements into classified building features
//!   ([`normalize`]).
//! - Persist collections as GeoJSON ([`writer`]).
//! - Orchestrate single-area scrapes and sequential batches ([`pipeline`],
//!   [`batch`]).
//!
//! Boundaries:
//! - Domain types and risk rules live in `georisk-core`.
//! - Argument parsing and process exit codes live in `georisk-cli`.
//!
//! Invariants:
//! - At most one request is in flight.
//! - Output files are replaced atomically and only after a successful fetch.

pub mod batch;
pub mod normalize;
pub mod overpass;
pub mod pipeline;
pub mod writer;

pub use batch::{AreaOutcome, BatchOptions, BatchRunner, BatchSummary, DEFAULT_BATCH_DELAY};
pub use normalize::{NormalizeReport, normalize};
pub use pipeline::{DEFAULT_OUTPUT_DIR, ScrapeError, ScrapeReport, Scraper};
pub use writer::{ReadError, WriteError, read_feature_collection, write_feature_collection};
