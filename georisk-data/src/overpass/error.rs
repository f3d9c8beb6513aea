//! Error types produced while talking to an Overpass endpoint.

use thiserror::Error;

/// Failure of a single request attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The client-side timeout elapsed.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Endpoint URL.
        url: String,
        /// Configured client timeout.
        timeout_secs: u64,
    },
    /// The connection failed or was reset.
    #[error("network error contacting {url}: {message}")]
    Network {
        /// Endpoint URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}: {message}")]
    Http {
        /// Endpoint URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Short description of the failure.
        message: String,
    },
    /// The body of a successful response was not valid Overpass JSON.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Endpoint URL.
        url: String,
        /// Decoder error description.
        message: String,
    },
}

impl TransportError {
    /// Whether retrying the same request may succeed.
    ///
    /// Timeouts, connection failures, `429 Too Many Requests` and `5xx`
    /// responses are transient. Other client errors and undecodable bodies
    /// indicate a problem with the request itself.
    ///
    /// # Examples
    /// ```
    /// use georisk_data::overpass::TransportError;
    ///
    /// let overloaded = TransportError::Http {
    ///     url: "https://overpass.example".into(),
    ///     status: 504,
    ///     message: "Gateway Timeout".into(),
    /// };
    /// assert!(overloaded.is_transient());
    /// ```
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. } => false,
        }
    }
}

/// Failure of a fetch after the retry policy has run its course.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// A non-retryable error ended the fetch.
    #[error("request failed permanently on attempt {attempt}")]
    Fatal {
        /// Attempt on which the error occurred, starting at 1.
        attempt: u32,
        /// Underlying cause.
        #[source]
        source: TransportError,
    },
    /// Every permitted attempt failed with a retryable error.
    #[error("request failed after {attempts} attempt(s)")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Cause of the final attempt's failure.
        #[source]
        source: TransportError,
    },
}

impl FetchError {
    /// The last underlying transport error.
    #[must_use]
    pub const fn last_cause(&self) -> &TransportError {
        match self {
            Self::Fatal { source, .. } | Self::Exhausted { source, .. } => source,
        }
    }

    /// Number of attempts made before giving up.
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        match self {
            Self::Fatal { attempt, .. } => *attempt,
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }
}

/// Errors returned when constructing an HTTP source.
#[derive(Debug, Error)]
pub enum SourceBuildError {
    /// The HTTP client could not be built.
    #[error("failed to build HTTP client")]
    HttpClient(#[source] reqwest::Error),
    /// The Tokio runtime could not be built.
    #[error("failed to build Tokio runtime")]
    Runtime(#[source] std::io::Error),
}
