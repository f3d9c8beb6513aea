//! Sequential multi-area runs with per-area failure isolation.

use std::time::Duration;

use georisk_core::{Area, AreaRegistry};
use log::{info, warn};

use crate::{
    overpass::{OverpassSource, Sleeper},
    pipeline::{ScrapeError, ScrapeReport, Scraper},
};

/// Pause between consecutive network-bound runs when none is configured.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(10);

/// Batch pacing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Pause before each network-bound run after the first.
    pub delay: Duration,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_BATCH_DELAY,
        }
    }
}

impl BatchOptions {
    /// Set the inter-run delay.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Result of one area within a batch.
#[derive(Debug)]
pub struct AreaOutcome {
    /// Area name.
    pub area: String,
    /// Report or failure.
    pub result: Result<ScrapeReport, ScrapeError>,
}

impl AreaOutcome {
    /// Whether the area was written.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-area outcomes in registry order.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// One entry per registry area.
    pub outcomes: Vec<AreaOutcome>,
}

impl BatchSummary {
    /// Successful outcomes.
    pub fn succeeded(&self) -> impl Iterator<Item = &ScrapeReport> {
        self.outcomes
            .iter()
            .filter_map(|outcome| outcome.result.as_ref().ok())
    }

    /// Failed areas with their errors.
    pub fn failed(&self) -> impl Iterator<Item = (&str, &ScrapeError)> {
        self.outcomes.iter().filter_map(|outcome| {
            outcome
                .result
                .as_ref()
                .err()
                .map(|error| (outcome.area.as_str(), error))
        })
    }

    /// Whether every area succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(AreaOutcome::is_success)
    }
}

/// Runs a [`Scraper`] over every area of a registry.
///
/// Areas run strictly one after another. An area whose bounding box is
/// rejected never reaches the network and does not trigger a pause; every
/// other run after the first is preceded by the configured delay, slept on
/// the scraper's sleeper.
#[derive(Debug)]
pub struct BatchRunner<'a, S, Z> {
    scraper: &'a Scraper<S, Z>,
    options: BatchOptions,
}

impl<'a, S: OverpassSource, Z: Sleeper> BatchRunner<'a, S, Z> {
    /// Runner over `scraper` with default options.
    pub fn new(scraper: &'a Scraper<S, Z>) -> Self {
        Self {
            scraper,
            options: BatchOptions::default(),
        }
    }

    /// Replace the batch options.
    #[must_use]
    pub const fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Scrape every area in `registry`, in order.
    pub fn run(&self, registry: &AreaRegistry) -> BatchSummary {
        let mut summary = BatchSummary::default();
        let mut network_runs = 0_usize;
        let total = registry.len();
        for (position, area) in registry.iter().enumerate() {
            info!("Batch {}/{total}: {}", position + 1, area.name);
            let result = self.run_area(area, &mut network_runs);
            match &result {
                Ok(report) => info!(
                    "{}: {} features written to {}",
                    area.name, report.features, report.path
                ),
                Err(error) => warn!("{}: {}", area.name, error_chain(error)),
            }
            summary.outcomes.push(AreaOutcome {
                area: area.name.clone(),
                result,
            });
        }
        summary
    }

    fn run_area(
        &self,
        area: &Area,
        network_runs: &mut usize,
    ) -> Result<ScrapeReport, ScrapeError> {
        let query = self.scraper.query_for(area)?;
        if *network_runs > 0 && !self.options.delay.is_zero() {
            info!(
                "Waiting {}s before querying {}",
                self.options.delay.as_secs(),
                area.name
            );
            self.scraper.sleeper().sleep(self.options.delay);
        }
        *network_runs += 1;
        self.scraper.scrape_with_query(area, &query, None)
    }
}

/// Render an error and its sources as `outer: inner: ...`.
#[must_use]
pub fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut rendered = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        rendered.push_str(": ");
        rendered.push_str(&cause.to_string());
        source = cause.source();
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overpass::{
        OverpassResponse,
        test_support::{RecordingSleeper, ScriptedSource},
    };
    use camino::Utf8PathBuf;
    use georisk_core::BoundingBox;
    use rstest::rstest;
    use tempfile::TempDir;

    fn utf8(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp dir")
    }

    fn registry(boxes: &[(&str, BoundingBox)]) -> AreaRegistry {
        AreaRegistry::new(
            boxes
                .iter()
                .map(|(name, bounds)| Area::new(*name, *bounds)),
        )
        .expect("unique names")
    }

    #[rstest]
    fn delays_only_between_network_runs() {
        let dir = TempDir::new().expect("temp dir");
        let scraper = Scraper::new(ScriptedSource::always(OverpassResponse::default()))
            .with_sleeper(RecordingSleeper::default())
            .with_output_dir(utf8(&dir));
        let areas = registry(&[
            ("Bad", BoundingBox::new(1.0, 0.0, 0.0, 1.0)),
            ("A", BoundingBox::new(0.0, 0.0, 1.0, 1.0)),
            ("Worse", BoundingBox::new(0.0, 2.0, 1.0, 1.0)),
            ("B", BoundingBox::new(2.0, 2.0, 3.0, 3.0)),
        ]);
        let summary = BatchRunner::new(&scraper)
            .with_options(BatchOptions::default().with_delay(Duration::from_secs(3)))
            .run(&areas);

        assert_eq!(scraper.sleeper().delays(), [Duration::from_secs(3)]);
        assert_eq!(scraper.source().call_count(), 2);
        assert_eq!(summary.succeeded().count(), 2);
        let failed: Vec<&str> = summary.failed().map(|(name, _)| name).collect();
        assert_eq!(failed, ["Bad", "Worse"]);
        assert!(!summary.all_succeeded());
    }

    #[rstest]
    fn zero_delay_never_sleeps() {
        let dir = TempDir::new().expect("temp dir");
        let scraper = Scraper::new(ScriptedSource::always(OverpassResponse::default()))
            .with_sleeper(RecordingSleeper::default())
            .with_output_dir(utf8(&dir));
        let summary = BatchRunner::new(&scraper)
            .with_options(BatchOptions::default().with_delay(Duration::ZERO))
            .run(&AreaRegistry::kenya());
        assert!(summary.all_succeeded());
        assert_eq!(summary.outcomes.len(), 5);
        assert!(scraper.sleeper().delays().is_empty());
    }

    #[rstest]
    fn default_delay_is_ten_seconds() {
        assert_eq!(BatchOptions::default().delay, Duration::from_secs(10));
    }

    #[rstest]
    fn error_chain_includes_causes() {
        let area = Area::new("Bad", BoundingBox::new(1.0, 0.0, 0.0, 1.0));
        let scraper = Scraper::new(ScriptedSource::default());
        let error = scraper.query_for(&area).expect_err("invalid");
        let rendered = error_chain(&error);
        assert!(rendered.starts_with("invalid bounding box for Bad: "));
    }

    #[rstest]
    fn error_chain_names_each_cause_once() {
        let dir = TempDir::new().expect("temp dir");
        let unavailable = crate::overpass::TransportError::Http {
            url: "stub://overpass".to_owned(),
            status: 503,
            message: "Service Unavailable".to_owned(),
        };
        let scraper = Scraper::new(ScriptedSource::new(vec![Err(unavailable)]))
            .with_sleeper(RecordingSleeper::default())
            .with_policy(crate::overpass::RetryPolicy::no_retry())
            .with_output_dir(utf8(&dir));
        let area = Area::new("A", BoundingBox::new(0.0, 0.0, 1.0, 1.0));
        let error = scraper.scrape_area(&area, None).expect_err("upstream fails");
        assert_eq!(
            error_chain(&error),
            "failed to fetch buildings for A: request failed after 1 attempt(s): \
             request to stub://overpass failed with status 503: Service Unavailable"
        );
    }
}
