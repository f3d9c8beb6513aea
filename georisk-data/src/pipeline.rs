//! Single-area scrape: query, fetch, normalise and write.

use camino::{Utf8Path, Utf8PathBuf};
use georisk_core::{Area, InvalidBoundsError};
use log::{info, warn};
use thiserror::Error;

use crate::{
    normalize::normalize,
    overpass::{
        FetchError, OverpassQuery, OverpassSource, QueryOptions, RetryPolicy, Sleeper,
        ThreadSleeper, fetch_with_retry,
    },
    writer::{WriteError, write_feature_collection},
};

/// Directory used when no output directory is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// Outcome of a successful scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeReport {
    /// Area name.
    pub area: String,
    /// File the collection was written to.
    pub path: Utf8PathBuf,
    /// Features written.
    pub features: usize,
    /// Buildings dropped for lack of geometry.
    pub dropped: usize,
    /// Duplicate identifiers skipped.
    pub duplicates: usize,
    /// Malformed numeric tags left unset.
    pub invalid_values: usize,
    /// Fetch attempts used.
    pub attempts: u32,
}

/// Errors that abort a single-area scrape.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The area's bounding box was rejected before any request.
    #[error("invalid bounding box for {area}")]
    InvalidBounds {
        /// Area name.
        area: String,
        /// Validation failure.
        #[source]
        source: InvalidBoundsError,
    },
    /// The upstream query failed.
    #[error("failed to fetch buildings for {area}")]
    Fetch {
        /// Area name.
        area: String,
        /// Fetch failure.
        #[source]
        source: FetchError,
    },
    /// The output file could not be written.
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ScrapeError {
    /// Whether the error arose before any request was made.
    #[must_use]
    pub const fn is_invalid_bounds(&self) -> bool {
        matches!(self, Self::InvalidBounds { .. })
    }
}

/// Runs scrapes against one source with shared settings.
///
/// # Examples
/// ```
/// use georisk_core::{Area, BoundingBox};
/// use georisk_data::{
///     Scraper,
///     overpass::{OverpassResponse, test_support::{RecordingSleeper, ScriptedSource}},
/// };
///
/// let dir = tempfile::tempdir()?;
/// let out = camino::Utf8Path::from_path(dir.path()).expect("utf8 path");
/// let scraper = Scraper::new(ScriptedSource::always(OverpassResponse::default()))
///     .with_sleeper(RecordingSleeper::default())
///     .with_output_dir(out);
///
/// let area = Area::new("Nairobi", BoundingBox::new(-1.35, 36.70, -1.20, 36.95));
/// let report = scraper.scrape_area(&area, None)?;
/// assert_eq!(report.features, 0);
/// assert!(report.path.ends_with("nairobi_buildings.geojson"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Scraper<S, Z = ThreadSleeper> {
    source: S,
    sleeper: Z,
    policy: RetryPolicy,
    options: QueryOptions,
    output_dir: Utf8PathBuf,
}

impl<S: OverpassSource> Scraper<S> {
    /// Scraper with default retry policy, query options and output
    /// directory, sleeping on the current thread.
    pub fn new(source: S) -> Self {
        Self {
            source,
            sleeper: ThreadSleeper,
            policy: RetryPolicy::default(),
            options: QueryOptions::default(),
            output_dir: Utf8PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl<S: OverpassSource, Z: Sleeper> Scraper<S, Z> {
    /// Replace the sleeper used for retry backoff and batch pacing.
    pub fn with_sleeper<Y: Sleeper>(self, sleeper: Y) -> Scraper<S, Y> {
        Scraper {
            source: self.source,
            sleeper,
            policy: self.policy,
            options: self.options,
            output_dir: self.output_dir,
        }
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the query options.
    #[must_use]
    pub fn with_query_options(mut self, options: QueryOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the directory that relative output file names resolve against.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Underlying source.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Sleeper shared by retries and batch pacing.
    pub const fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Utf8Path {
        &self.output_dir
    }

    /// Build the query for `area`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidBounds`] when the area's box is invalid.
    pub fn query_for(&self, area: &Area) -> Result<OverpassQuery, ScrapeError> {
        self.options
            .build(area.bounds)
            .map_err(|source| ScrapeError::InvalidBounds {
                area: area.name.clone(),
                source,
            })
    }

    /// Destination for `area`: `file_name` or the area's default name,
    /// joined onto the output directory unless absolute.
    #[must_use]
    pub fn output_path(&self, area: &Area, file_name: Option<&Utf8Path>) -> Utf8PathBuf {
        match file_name {
            Some(path) => self.output_dir.join(path),
            None => self.output_dir.join(area.default_file_name()),
        }
    }

    /// Scrape `area` and write its collection.
    ///
    /// The bounding box is validated before any request, so an invalid area
    /// never reaches the source.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] for invalid bounds, fetch failures after
    /// retries, or write failures. Nothing is written unless the fetch
    /// succeeded.
    pub fn scrape_area(
        &self,
        area: &Area,
        file_name: Option<&Utf8Path>,
    ) -> Result<ScrapeReport, ScrapeError> {
        let query = self.query_for(area)?;
        self.scrape_with_query(area, &query, file_name)
    }

    /// Run an already built query for `area`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Fetch`] or [`ScrapeError::Write`].
    pub fn scrape_with_query(
        &self,
        area: &Area,
        query: &OverpassQuery,
        file_name: Option<&Utf8Path>,
    ) -> Result<ScrapeReport, ScrapeError> {
        info!("Scraping buildings for {} {}", area.name, query.bounds());
        let fetched = fetch_with_retry(&self.source, query, &self.policy, &self.sleeper)
            .map_err(|source| ScrapeError::Fetch {
                area: area.name.clone(),
                source,
            })?;
        let report = normalize(&fetched.response);
        if report.dropped_without_geometry > 0 {
            warn!(
                "Dropped {} buildings without resolvable geometry in {}",
                report.dropped_without_geometry, area.name
            );
        }
        let path = self.output_path(area, file_name);
        write_feature_collection(&path, &report.collection)?;
        Ok(ScrapeReport {
            area: area.name.clone(),
            path,
            features: report.collection.len(),
            dropped: report.dropped_without_geometry,
            duplicates: report.duplicates,
            invalid_values: report.invalid_values,
            attempts: fetched.attempts,
        })
    }
}
