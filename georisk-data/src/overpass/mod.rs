//! Overpass API access: query construction, transport and retries.
//!
//! A scrape starts from an [`OverpassQuery`], which can only be obtained by
//! validating a bounding box. [`fetch_with_retry`] runs the query against an
//! [`OverpassSource`] under a [`RetryPolicy`], sleeping on a [`Sleeper`]
//! between attempts.
//!
//! # Example
//!
//! ```no_run
//! use georisk_core::BoundingBox;
//! use georisk_data::overpass::{
//!     HttpOverpassSource, OverpassQuery, RetryPolicy, ThreadSleeper, fetch_with_retry,
//! };
//!
//! let source = HttpOverpassSource::new()?;
//! let query = OverpassQuery::builder(BoundingBox::new(-0.15, 34.7, -0.05, 34.8)).build()?;
//! let fetched = fetch_with_retry(&source, &query, &RetryPolicy::default(), &ThreadSleeper)?;
//! println!("{} elements after {} attempt(s)", fetched.response.elements.len(), fetched.attempts);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod error;
mod fetch;
mod query;
mod response;
mod retry;
mod source;

#[doc(hidden)]
pub mod test_support;

pub use error::{FetchError, SourceBuildError, TransportError};
pub use fetch::{Fetched, fetch_with_retry};
pub use query::{
    DEFAULT_KINDS, DEFAULT_SERVER_TIMEOUT_SECS, OverpassQuery, OverpassQueryBuilder, PRIMARY_KEY,
    QueryOptions,
};
pub use response::{Element, LatLon, Member, OverpassResponse};
pub use retry::{
    Backoff, DEFAULT_BACKOFF_STEP, DEFAULT_MAX_ATTEMPTS, RetryPolicy, RetryPredicate, Sleeper,
    ThreadSleeper,
};
pub use source::{
    DEFAULT_CLIENT_TIMEOUT_SECS, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT, HttpOverpassSource,
    HttpOverpassSourceConfig, OverpassSource,
};
