//! Blocking Overpass sources.
//!
//! [`OverpassSource`] is synchronous so the pipeline stays strictly
//! sequential. [`HttpOverpassSource`] bridges to the async `reqwest` client by
//! blocking on a private Tokio runtime, or on the caller's runtime when one is
//! already running on a multi-threaded scheduler.

use std::time::Duration;

use log::debug;
use reqwest::Client;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};

use super::{OverpassQuery, OverpassResponse, SourceBuildError, TransportError};

/// Public Overpass interpreter endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://overpass-api.de/api/interpreter";

/// Default user agent for Overpass requests.
pub const DEFAULT_USER_AGENT: &str = concat!("georisk/", env!("CARGO_PKG_VERSION"));

/// Default client-side timeout in seconds.
pub const DEFAULT_CLIENT_TIMEOUT_SECS: u64 = 120;

/// Something that can answer an Overpass query.
pub trait OverpassSource {
    /// URL requests are sent to, used in logs and errors.
    fn endpoint(&self) -> &str;

    /// Run `query` once.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] describing why the attempt failed.
    fn fetch(&self, query: &OverpassQuery) -> Result<OverpassResponse, TransportError>;
}

impl<T: OverpassSource + ?Sized> OverpassSource for &T {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn fetch(&self, query: &OverpassQuery) -> Result<OverpassResponse, TransportError> {
        (**self).fetch(query)
    }
}

impl<T: OverpassSource + ?Sized> OverpassSource for Box<T> {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn fetch(&self, query: &OverpassQuery) -> Result<OverpassResponse, TransportError> {
        (**self).fetch(query)
    }
}

/// Configuration for [`HttpOverpassSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOverpassSourceConfig {
    /// Interpreter URL receiving the `data` form field.
    pub endpoint: String,
    /// Client-side limit for one request, independent of the query's
    /// server-side timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpOverpassSourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            timeout: Duration::from_secs(DEFAULT_CLIENT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpOverpassSourceConfig {
    /// Configuration targeting `endpoint` with default settings.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set the client-side timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Overpass source that POSTs queries over HTTP.
///
/// # Examples
/// ```no_run
/// use std::time::Duration;
/// use georisk_core::BoundingBox;
/// use georisk_data::overpass::{
///     HttpOverpassSource, HttpOverpassSourceConfig, OverpassQuery, OverpassSource,
/// };
///
/// let config = HttpOverpassSourceConfig::default().with_timeout(Duration::from_secs(90));
/// let source = HttpOverpassSource::with_config(config)?;
/// let query = OverpassQuery::builder(BoundingBox::new(-4.1, 39.6, -4.0, 39.75)).build()?;
/// let response = source.fetch(&query)?;
/// println!("{} elements", response.elements.len());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct HttpOverpassSource {
    client: Client,
    config: HttpOverpassSourceConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpOverpassSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOverpassSource")
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish_non_exhaustive()
    }
}

impl HttpOverpassSource {
    /// Source targeting the public endpoint with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`SourceBuildError`] if the HTTP client or runtime fails to build.
    pub fn new() -> Result<Self, SourceBuildError> {
        Self::with_config(HttpOverpassSourceConfig::default())
    }

    /// Source using an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SourceBuildError`] if the HTTP client or runtime fails to build.
    pub fn with_config(config: HttpOverpassSourceConfig) -> Result<Self, SourceBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(SourceBuildError::HttpClient)?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SourceBuildError::Runtime)?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &HttpOverpassSourceConfig {
        &self.config
    }

    async fn fetch_async(&self, query: &OverpassQuery) -> Result<OverpassResponse, TransportError> {
        let url = self.config.endpoint.as_str();
        debug!("POST {url} ({} bytes of Overpass QL)", query.as_str().len());
        let response = self
            .client
            .post(url)
            .form(&[("data", query.as_str())])
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected status")
                    .to_owned(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err))?;
        serde_json::from_slice(&body).map_err(|err| TransportError::Decode {
            url: url.to_owned(),
            message: err.to_string(),
        })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error) -> TransportError {
        let url = self.config.endpoint.clone();
        if error.is_timeout() {
            return TransportError::Timeout {
                url,
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return TransportError::Http {
                url,
                status: status.as_u16(),
                message: error.to_string(),
            };
        }
        if error.is_decode() {
            return TransportError::Decode {
                url,
                message: error.to_string(),
            };
        }
        TransportError::Network {
            url,
            message: error.to_string(),
        }
    }
}

impl OverpassSource for HttpOverpassSource {
    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Run `query` against the configured endpoint.
    ///
    /// Inside a multi-threaded Tokio runtime the caller's runtime drives the
    /// request through `block_in_place`; otherwise the source's own
    /// current-thread runtime is used.
    fn fetch(&self, query: &OverpassQuery) -> Result<OverpassResponse, TransportError> {
        let future = self.fetch_async(query);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            _ => self.runtime.block_on(future),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn config_defaults_to_public_endpoint() {
        let config = HttpOverpassSourceConfig::default();
        assert_eq!(config.endpoint, "https://overpass-api.de/api/interpreter");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.user_agent.starts_with("georisk/"));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = HttpOverpassSourceConfig::new("http://localhost:12345/api/interpreter")
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("georisk-test/1.0");
        assert_eq!(config.endpoint, "http://localhost:12345/api/interpreter");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.user_agent, "georisk-test/1.0");
    }

    #[rstest]
    fn source_reports_its_endpoint() {
        let source = HttpOverpassSource::with_config(HttpOverpassSourceConfig::new(
            "http://localhost:12345/api/interpreter",
        ))
        .expect("source should build");
        assert_eq!(source.endpoint(), "http://localhost:12345/api/interpreter");
    }

    #[rstest]
    fn refused_connection_is_transient() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
        let port = listener.local_addr().expect("local addr").port();
        drop(listener);

        let config = HttpOverpassSourceConfig::new(format!("http://127.0.0.1:{port}/api/interpreter"))
            .with_timeout(Duration::from_secs(5));
        let source = HttpOverpassSource::with_config(config).expect("source should build");
        let query = OverpassQuery::builder(georisk_core::BoundingBox::new(0.0, 0.0, 1.0, 1.0))
            .build()
            .expect("valid bounds");

        let err = source.fetch(&query).expect_err("nothing is listening");
        assert!(err.is_transient(), "expected a transient error, got {err:?}");
    }
}
