//! Error types for the transport and resource clients.
//!
//! The taxonomy mirrors how callers react: [`Error::Request`] means the
//! daemon was never reached, [`ResponseError`] carries a non-success HTTP
//! status (404 maps to a not-found view), and [`ResponseParseError`] means
//! the daemon answered with a payload of an unexpected shape, which
//! indicates client/daemon version skew rather than a transient fault.

use std::fmt;

use reqwest::Method;
use thiserror::Error;

/// Errors returned by the [`Fetcher`](crate::fetcher::Fetcher) and every
/// typed client method.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The request never produced an HTTP response (DNS failure, refused
    /// connection, timeout).
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    /// The daemon answered with a non-success status.
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// The response body did not decode into the expected shape.
    #[error(transparent)]
    Parse(#[from] ResponseParseError),

    /// The request body could not be encoded as JSON. Payload types are
    /// plain data, so this is a programmer error.
    #[error("could not encode request body: {message}")]
    Encode { message: String },

    /// The request was cancelled through the token supplied in
    /// [`RequestOptions`](crate::fetcher::RequestOptions).
    #[error("request to {url} was cancelled")]
    Cancelled { url: String },
}

impl Error {
    /// True when the daemon reported 404 for the requested resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Response(err) if err.is_not_found())
    }
}

/// Non-success HTTP response from the daemon.
#[derive(Debug, Clone)]
pub struct ResponseError {
    /// HTTP method of the failed request.
    pub method: Method,
    /// Full URL the request was issued against.
    pub url: String,
    /// Numeric HTTP status.
    pub status: u16,
    /// Daemon-provided error message, when the error body carried one.
    pub message: Option<String>,
    /// Decoded error body, when the daemon sent JSON.
    pub body: Option<serde_json::Value>,
}

impl ResponseError {
    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }
}

impl fmt::Display for ResponseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} failed with status {}",
            self.method, self.url, self.status
        )?;
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResponseError {}

/// Why a response body failed to decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseFailure {
    /// The body was not valid JSON at all.
    InvalidJson,
    /// The body was JSON but did not match the expected shape.
    UnexpectedShape,
}

/// Response body that could not be decoded into the expected type.
///
/// `failure` distinguishes "not JSON" from "JSON of the wrong shape";
/// `detail` names the offending field for shape mismatches.
#[derive(Debug, Clone)]
pub struct ResponseParseError {
    pub method: Method,
    pub url: String,
    pub failure: ParseFailure,
    pub detail: String,
}

impl ResponseParseError {
    /// Body was not parseable as JSON.
    pub fn invalid_json(method: Method, url: impl Into<String>, err: &serde_json::Error) -> Self {
        ResponseParseError {
            method,
            url: url.into(),
            failure: ParseFailure::InvalidJson,
            detail: err.to_string(),
        }
    }

    /// Body was JSON but failed schema validation.
    pub fn unexpected_shape(
        method: Method,
        url: impl Into<String>,
        err: &serde_json::Error,
    ) -> Self {
        ResponseParseError {
            method,
            url: url.into(),
            failure: ParseFailure::UnexpectedShape,
            detail: err.to_string(),
        }
    }
}

impl fmt::Display for ResponseParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failure {
            ParseFailure::InvalidJson => write!(
                f,
                "{} {}: response body is not valid JSON: {}",
                self.method, self.url, self.detail
            ),
            ParseFailure::UnexpectedShape => write!(
                f,
                "{} {}: response does not match the expected shape: {}",
                self.method, self.url, self.detail
            ),
        }
    }
}

impl std::error::Error for ResponseParseError {}
