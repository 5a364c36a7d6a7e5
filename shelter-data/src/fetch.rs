//! HTTP access for the municipal data sources.
//!
//! [`Fetcher`] is synchronous so city adapters stay plain functions.
//! [`HttpFetcher`] bridges to async `reqwest` by blocking on a Tokio runtime
//! it owns; tests substitute the stub in [`crate::test_support`].

use std::fmt;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// User agent identifying this tool, its version and the host OS.
///
/// # Examples
/// ```
/// use shelter_data::fair_user_agent;
///
/// assert!(fair_user_agent().starts_with("shelter-map/"));
/// ```
#[must_use]
pub fn fair_user_agent() -> String {
    format!(
        "shelter-map/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

/// A single HTTP request issued by a city adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// A `GET` request for `url`.
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// A `POST` request for `url` carrying `body`.
    #[must_use]
    pub fn post(url: Url, body: impl Into<Vec<u8>>) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: Vec::new(),
            body: Some(body.into()),
        }
    }

    /// Add a request header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A successful response: status 2xx, body fully read.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    /// Value of the `Content-Type` header, if sent.
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// Errors raised by a [`Fetcher`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    Http { url: String, status: u16 },
    /// The request did not complete in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },
    /// The request failed below HTTP.
    #[error("network error contacting {url}: {message}")]
    Network { url: String, message: String },
    /// Building the client or runtime failed.
    #[error("failed to initialise HTTP client: {message}")]
    Setup { message: String },
}

/// Synchronous HTTP transport used by city adapters.
pub trait Fetcher {
    /// Perform `request`, returning the response body on a 2xx status.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failures and non-success statuses.
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Configuration for [`HttpFetcher`].
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: fair_user_agent(),
        }
    }
}

impl HttpFetcherConfig {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// [`Fetcher`] backed by `reqwest`.
///
/// Owns a current-thread Tokio runtime reused across calls. Inside an
/// existing multi-threaded runtime the caller's handle is used through
/// [`tokio::task::block_in_place`] instead.
pub struct HttpFetcher {
    client: Client,
    config: HttpFetcherConfig,
    runtime: Runtime,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpFetcher {
    /// Create a fetcher with the default timeout and user agent.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Setup`] if the client or runtime fails to build.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(HttpFetcherConfig::default())
    }

    /// Create a fetcher with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Setup`] if the client or runtime fails to build.
    pub fn with_config(config: HttpFetcherConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(|err| FetchError::Setup {
                message: err.to_string(),
            })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| FetchError::Setup {
                message: err.to_string(),
            })?;
        Ok(Self {
            client,
            config,
            runtime,
        })
    }

    async fn fetch_async(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.url.as_str();
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?
            .error_for_status()
            .map_err(|err| self.convert_reqwest_error(&err, url))?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response
            .bytes()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;
        Ok(HttpResponse {
            content_type,
            body: body.to_vec(),
        })
    }

    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }
        if let Some(status) = error.status() {
            return FetchError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
            };
        }
        FetchError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        log::debug!("{} {}", request.method, request.url);
        let future = self.fetch_async(request);
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
    fn user_agent_names_tool_and_os() {
        let agent = fair_user_agent();
        assert!(agent.starts_with(&format!("shelter-map/{} (", env!("CARGO_PKG_VERSION"))));
        assert!(agent.ends_with(&format!("({})", std::env::consts::OS)));
    }

    #[rstest]
    fn default_config_uses_thirty_second_timeout() {
        let config = HttpFetcherConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.user_agent, fair_user_agent());
    }

    #[rstest]
    fn request_builders_record_headers_and_body() {
        let url = Url::parse("https://example.org/api").expect("valid url");
        let request = HttpRequest::post(url.clone(), "{}").with_header("content-type", "application/json");
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url, url);
        assert_eq!(request.body.as_deref(), Some(b"{}".as_slice()));
        assert_eq!(
            request.headers,
            vec![("content-type".to_owned(), "application/json".to_owned())]
        );
    }

    #[rstest]
    fn fetcher_builds_outside_a_runtime() {
        let fetcher = HttpFetcher::with_config(
            HttpFetcherConfig::default().with_user_agent("shelter-map-tests/0"),
        )
        .expect("fetcher should build");
        assert_eq!(fetcher.config.user_agent, "shelter-map-tests/0");
    }
}
