//! Retrying fetch loop.

use log::{info, warn};

use super::{FetchError, OverpassQuery, OverpassResponse, OverpassSource, RetryPolicy, Sleeper};

/// A successful fetch and the attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched {
    /// Decoded response.
    pub response: OverpassResponse,
    /// Attempts used, starting at 1.
    pub attempts: u32,
}

/// Run `query` against `source`, retrying per `policy`.
///
/// Every attempt is independent: nothing from a failed attempt is carried
/// into the next. Between attempts the policy's backoff is slept on
/// `sleeper`; no sleep follows the final attempt.
///
/// # Errors
///
/// Returns [`FetchError::Fatal`] as soon as a non-retryable error occurs and
/// [`FetchError::Exhausted`] once every permitted attempt has failed.
///
/// # Examples
/// ```
/// use georisk_core::BoundingBox;
/// use georisk_data::overpass::{
///     OverpassQuery, OverpassResponse, RetryPolicy, TransportError, fetch_with_retry,
///     test_support::{RecordingSleeper, ScriptedSource},
/// };
///
/// let source = ScriptedSource::new([
///     Err(TransportError::Http { url: "stub".into(), status: 503, message: String::new() }),
///     Ok(OverpassResponse::default()),
/// ]);
/// let sleeper = RecordingSleeper::default();
/// let query = OverpassQuery::builder(BoundingBox::new(0.0, 0.0, 1.0, 1.0)).build()?;
///
/// let fetched = fetch_with_retry(&source, &query, &RetryPolicy::default(), &sleeper)?;
/// assert_eq!(fetched.attempts, 2);
/// assert_eq!(sleeper.total().as_secs(), 5);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn fetch_with_retry<S, Z>(
    source: &S,
    query: &OverpassQuery,
    policy: &RetryPolicy,
    sleeper: &Z,
) -> Result<Fetched, FetchError>
where
    S: OverpassSource + ?Sized,
    Z: Sleeper + ?Sized,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;
    loop {
        info!(
            "Querying {} for {} (attempt {attempt}/{max_attempts})",
            source.endpoint(),
            query.bounds()
        );
        match source.fetch(query) {
            Ok(response) => {
                info!("Fetched {} elements", response.elements.len());
                if let Some(remark) = &response.remark {
                    warn!("Overpass remark: {remark}");
                }
                return Ok(Fetched {
                    response,
                    attempts: attempt,
                });
            }
            Err(error) if !policy.is_retryable(&error) => {
                warn!("Attempt {attempt} failed permanently: {error}");
                return Err(FetchError::Fatal {
                    attempt,
                    source: error,
                });
            }
            Err(error) if attempt >= max_attempts => {
                warn!("Attempt {attempt} failed: {error}");
                return Err(FetchError::Exhausted {
                    attempts: attempt,
                    source: error,
                });
            }
            Err(error) => {
                let delay = policy.backoff().delay(attempt);
                warn!(
                    "Attempt {attempt} failed: {error}; retrying in {}s",
                    delay.as_secs()
                );
                sleeper.sleep(delay);
                attempt += 1;
            }
        }
    }
}
