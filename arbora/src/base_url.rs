//! Daemon endpoint addressing.
//!
//! A [`BaseUrl`] identifies one node HTTP daemon by scheme, hostname and
//! port. It is an immutable value type with structural equality, used to
//! construct an [`HttpdClient`](crate::client::HttpdClient) and to persist
//! preferred seeds in configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Port the node HTTP daemon listens on by default.
pub const DEFAULT_HTTPD_PORT: u16 = 8080;

/// URL scheme for reaching a daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// Well-known port implied by the scheme when an address omits one.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
        }
    }
}

/// Errors produced when parsing a daemon address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBaseUrlError {
    /// Not parseable as a URL at all.
    #[error("invalid daemon address `{0}`")]
    InvalidAddress(String),

    /// Parsed, but with a scheme the daemon never speaks.
    #[error("unsupported scheme `{0}`, expected http or https")]
    UnsupportedScheme(String),

    /// Parsed, but without a usable hostname.
    #[error("daemon address `{0}` has no hostname")]
    MissingHost(String),
}

/// Address of one node HTTP daemon.
///
/// Equality is structural, so two values naming the same endpoint compare
/// equal regardless of how they were produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseUrl {
    pub hostname: String,
    pub port: u16,
    pub scheme: Scheme,
}

impl BaseUrl {
    /// Endpoint from explicit parts.
    pub fn new(scheme: Scheme, hostname: impl Into<String>, port: u16) -> Self {
        BaseUrl {
            hostname: hostname.into(),
            port,
            scheme,
        }
    }

    /// Plain-HTTP endpoint on the local host.
    pub fn localhost(port: u16) -> Self {
        BaseUrl::new(Scheme::Http, "127.0.0.1", port)
    }
}

impl Default for BaseUrl {
    fn default() -> Self {
        BaseUrl::localhost(DEFAULT_HTTPD_PORT)
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.hostname, self.port)
    }
}

impl FromStr for BaseUrl {
    type Err = ParseBaseUrlError;

    /// Parses `[scheme://]hostname[:port]`.
    ///
    /// The scheme defaults to `http`; a missing port defaults to the
    /// scheme's well-known port. Anything beyond the authority (a path,
    /// query or fragment) is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let candidate = if s.contains("://") {
            s.to_string()
        } else {
            format!("http://{s}")
        };
        let url =
            Url::parse(&candidate).map_err(|_| ParseBaseUrlError::InvalidAddress(s.to_string()))?;

        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => return Err(ParseBaseUrlError::UnsupportedScheme(other.to_string())),
        };
        let hostname = url
            .host_str()
            .ok_or_else(|| ParseBaseUrlError::MissingHost(s.to_string()))?
            .to_string();
        if !matches!(url.path(), "" | "/") || url.query().is_some() || url.fragment().is_some() {
            return Err(ParseBaseUrlError::InvalidAddress(s.to_string()));
        }
        let port = url.port().unwrap_or_else(|| scheme.default_port());

        Ok(BaseUrl {
            hostname,
            port,
            scheme,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_hostname_defaults_to_http() {
        let url: BaseUrl = "seed.example.xyz".parse().unwrap();
        assert_eq!(url.scheme, Scheme::Http);
        assert_eq!(url.hostname, "seed.example.xyz");
        assert_eq!(url.port, 80);
    }

    #[test]
    fn test_parse_explicit_port() {
        let url: BaseUrl = "127.0.0.1:8080".parse().unwrap();
        assert_eq!(url, BaseUrl::localhost(8080));
    }

    #[test]
    fn test_parse_https_defaults_to_443() {
        let url: BaseUrl = "https://seed.example.xyz".parse().unwrap();
        assert_eq!(url.scheme, Scheme::Https);
        assert_eq!(url.port, 443);
    }

    #[test]
    fn test_parse_rejects_unsupported_scheme() {
        let err = "ftp://seed.example.xyz".parse::<BaseUrl>().unwrap_err();
        assert_eq!(err, ParseBaseUrlError::UnsupportedScheme("ftp".to_string()));
    }

    #[test]
    fn test_parse_rejects_path_suffix() {
        assert!(matches!(
            "http://seed.example.xyz/api".parse::<BaseUrl>(),
            Err(ParseBaseUrlError::InvalidAddress(_))
        ));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not a url".parse::<BaseUrl>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        let url = BaseUrl::new(Scheme::Https, "seed.example.xyz", 8443);
        let reparsed: BaseUrl = url.to_string().parse().unwrap();
        assert_eq!(url, reparsed);
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(BaseUrl::localhost(8080), "http://127.0.0.1:8080".parse().unwrap());
        assert_ne!(BaseUrl::localhost(8080), BaseUrl::localhost(8081));
    }

    #[test]
    fn test_serde_shape() {
        let url = BaseUrl::localhost(8080);
        let json = serde_json::to_value(&url).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"hostname": "127.0.0.1", "port": 8080, "scheme": "http"})
        );
        let back: BaseUrl = serde_json::from_value(json).unwrap();
        assert_eq!(back, url);
    }
}
