//! Deterministic test doubles for Overpass sources and clocks.
//!
//! [`ScriptedSource`] replays a fixed sequence of outcomes without touching
//! the network, and [`RecordingSleeper`] records requested delays instead of
//! blocking, so retry and pacing behaviour can be asserted instantly.

use std::{
    cell::RefCell,
    collections::VecDeque,
    time::Duration,
};

use super::{OverpassQuery, OverpassResponse, OverpassSource, Sleeper, TransportError};

/// Endpoint reported by [`ScriptedSource`].
pub const STUB_ENDPOINT: &str = "stub://overpass";

/// Stub [`OverpassSource`] replaying scripted outcomes in order.
///
/// Once the script runs out the fallback response is returned, or a network
/// error when no fallback was set.
///
/// # Example
///
/// ```
/// use georisk_core::BoundingBox;
/// use georisk_data::overpass::{
///     OverpassQuery, OverpassResponse, OverpassSource, test_support::ScriptedSource,
/// };
///
/// let source = ScriptedSource::always(OverpassResponse::default());
/// let query = OverpassQuery::builder(BoundingBox::new(0.0, 0.0, 1.0, 1.0))
///     .build()
///     .expect("valid bounds");
/// assert!(source.fetch(&query).is_ok());
/// assert!(source.fetch(&query).is_ok());
/// assert_eq!(source.call_count(), 2);
/// ```
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: RefCell<VecDeque<Result<OverpassResponse, TransportError>>>,
    fallback: Option<OverpassResponse>,
    queries: RefCell<Vec<String>>,
}

impl ScriptedSource {
    /// Replay `outcomes` in order.
    #[must_use]
    pub fn new(outcomes: impl IntoIterator<Item = Result<OverpassResponse, TransportError>>) -> Self {
        Self {
            script: RefCell::new(outcomes.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Answer every query with `response`.
    #[must_use]
    pub fn always(response: OverpassResponse) -> Self {
        Self::default().with_fallback(response)
    }

    /// Return `response` once the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, response: OverpassResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    /// Number of fetches made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.queries.borrow().len()
    }

    /// Query texts received, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }
}

impl OverpassSource for ScriptedSource {
    fn endpoint(&self) -> &str {
        STUB_ENDPOINT
    }

    fn fetch(&self, query: &OverpassQuery) -> Result<OverpassResponse, TransportError> {
        self.queries.borrow_mut().push(query.as_str().to_owned());
        if let Some(outcome) = self.script.borrow_mut().pop_front() {
            return outcome;
        }
        self.fallback.clone().ok_or_else(|| TransportError::Network {
            url: STUB_ENDPOINT.to_owned(),
            message: "scripted source exhausted".to_owned(),
        })
    }
}

/// [`Sleeper`] that records delays instead of waiting.
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    /// Delays requested so far, in order.
    #[must_use]
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.borrow().clone()
    }

    /// Sum of all requested delays.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.delays.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.delays.borrow_mut().push(duration);
    }
}
