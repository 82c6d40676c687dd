//! Low-level typed-JSON transport.
//!
//! [`Fetcher`] executes one request described by a [`RequestSpec`] against a
//! node's HTTP API and decodes the response into a caller-chosen type. It
//! never retries and never swallows failures; every outcome is reported
//! through [`Error`](crate::error::Error) so callers can distinguish
//! unreachable daemons, non-success statuses and undecodable payloads.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::base_url::BaseUrl;
use crate::error::{Error, ResponseError, ResponseParseError};

pub use reqwest::Method;

/// Every API route lives under this prefix.
pub const API_PREFIX: &str = "api/v1";

/// Default User-Agent string for HTTP requests, identifying this client
/// and its version to node operators.
pub const DEFAULT_USER_AGENT: &str = concat!("arbora/", env!("CARGO_PKG_VERSION"));

/// Query string under construction. Preserves insertion order; absent
/// values are omitted rather than serialized as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        QueryParams(Vec::new())
    }

    /// Appends one key/value pair.
    pub fn push(&mut self, key: &str, value: impl ToString) {
        self.0.push((key.to_string(), value.to_string()));
    }

    /// Appends the pair only when a value is present.
    pub fn push_opt(&mut self, key: &str, value: Option<impl ToString>) {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Per-request knobs independent of the route.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Overall deadline for the request. `None` means no client-side limit.
    pub timeout: Option<Duration>,
    /// Cancelling this token abandons the request.
    pub abort: Option<CancellationToken>,
}

/// One API request: route, query, headers and an optional JSON body.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub options: RequestOptions,
}

impl RequestSpec {
    /// Starts a request for `path` relative to the API prefix.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        RequestSpec {
            method,
            path: path.into(),
            query: QueryParams::new(),
            headers: Vec::new(),
            body: None,
            options: RequestOptions::default(),
        }
    }

    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Authenticates the request with a session id.
    pub fn with_bearer(self, token: &str) -> Self {
        self.with_header("Authorization", &format!("Bearer {token}"))
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encode`] when the payload cannot be represented as
    /// JSON.
    pub fn with_json(mut self, body: &impl Serialize) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| Error::Encode {
            message: e.to_string(),
        })?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options = options;
        self
    }
}

/// A fully resolved HTTP request handed to the backend.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    pub timeout: Option<Duration>,
}

/// Raw HTTP response: status plus unparsed body bytes.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Transport-level failure inside a backend.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct BackendError {
    pub message: String,
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        BackendError {
            message: err.to_string(),
        }
    }
}

/// Trait for executing HTTP requests.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP backends in tests.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Executes one request and returns the raw response.
    ///
    /// Implementations report only transport failures as errors;
    /// non-success HTTP statuses are returned as ordinary responses.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BackendError>;
}

/// Real HTTP backend implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestBackend {
    client: reqwest::Client,
}

impl ReqwestBackend {
    /// Creates a new ReqwestBackend with default configuration.
    pub fn new() -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| BackendError {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self { client })
    }
}

impl Default for ReqwestBackend {
    fn default() -> Self {
        Self::new().expect("Failed to create default HTTP backend")
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BackendError> {
        let mut builder = self.client.request(request.method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Executes [`RequestSpec`]s against one node and decodes the replies.
#[derive(Clone)]
pub struct Fetcher {
    base_url: BaseUrl,
    backend: Arc<dyn HttpBackend>,
}

impl fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetcher")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Fetcher {
    /// Creates a fetcher for `base_url` backed by the default reqwest
    /// backend.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized. Use
    /// [`Fetcher::with_backend`] to handle backend construction yourself.
    pub fn new(base_url: BaseUrl) -> Self {
        Self::with_backend(base_url, Arc::new(ReqwestBackend::default()))
    }

    /// Creates a fetcher with a caller-supplied backend.
    pub fn with_backend(base_url: BaseUrl, backend: Arc<dyn HttpBackend>) -> Self {
        Fetcher { base_url, backend }
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Executes the request and decodes a successful response into `T`.
    ///
    /// # Errors
    ///
    /// * [`Error::Request`] when the daemon could not be reached.
    /// * [`Error::Response`] for any non-success HTTP status.
    /// * [`Error::Parse`] when the body is not JSON or does not match `T`.
    /// * [`Error::Cancelled`] when the abort token fires first.
    pub async fn fetch_ok<T>(&self, spec: RequestSpec) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let RequestSpec {
            method,
            path,
            query,
            mut headers,
            body,
            options,
        } = spec;

        let url = self.build_url(&path, &query)?;

        let body = match body {
            Some(value) => {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
                let bytes = serde_json::to_vec(&value).map_err(|e| Error::Encode {
                    message: e.to_string(),
                })?;
                Some(bytes)
            }
            None => None,
        };

        debug!(method = %method, url = %url, "sending API request");

        let request = HttpRequest {
            method: method.clone(),
            url: url.clone(),
            headers,
            body,
            timeout: options.timeout,
        };

        let send = self.backend.send(request);
        let result = match options.abort {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(url = %url, "request cancelled");
                        return Err(Error::Cancelled {
                            url: url.to_string(),
                        });
                    }
                    result = send => result,
                }
            }
            None => send.await,
        };

        let response = result.map_err(|e| {
            warn!(url = %url, error = %e, "request failed");
            Error::Request {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        if !(200..300).contains(&response.status) {
            return Err(Self::response_error(method, &url, &response).into());
        }

        Self::decode_body(method, &url, &response.body)
    }

    /// Joins the base URL, API prefix, path and query into a full URL.
    fn build_url(&self, path: &str, query: &QueryParams) -> Result<Url, Error> {
        let address = if path.is_empty() {
            format!("{}/{}", self.base_url, API_PREFIX)
        } else {
            format!("{}/{}/{}", self.base_url, API_PREFIX, path)
        };
        let mut url = Url::parse(&address).map_err(|e| Error::Request {
            url: address.clone(),
            message: format!("invalid request URL: {e}"),
        })?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    fn response_error(method: Method, url: &Url, response: &HttpResponse) -> ResponseError {
        let body: Option<serde_json::Value> = serde_json::from_slice(&response.body).ok();
        // The daemon reports its reason under "error"; older generations
        // used "message".
        let message = body
            .as_ref()
            .and_then(|value| value.get("error").or_else(|| value.get("message")))
            .and_then(|value| value.as_str())
            .map(String::from);

        warn!(
            method = %method,
            url = %url,
            status = response.status,
            "daemon answered with error status"
        );

        ResponseError {
            method,
            url: url.to_string(),
            status: response.status,
            message,
            body,
        }
    }

    fn decode_body<T>(method: Method, url: &Url, body: &[u8]) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| ResponseParseError::invalid_json(method.clone(), url.to_string(), &e))?;
        let decoded = serde_json::from_value(value)
            .map_err(|e| ResponseParseError::unexpected_shape(method, url.to_string(), &e))?;
        Ok(decoded)
    }
}
