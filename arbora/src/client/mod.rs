//! Typed access to the daemon's resource families.
//!
//! [`HttpdClient`] owns the transport; per-family clients ([`SessionClient`],
//! [`RepoClient`], [`NodeClient`]) borrow it through cheap clones of the
//! underlying [`Fetcher`]. Methods map one-to-one onto API routes and
//! propagate every transport error unchanged; no method retries, caches or
//! aggregates pages.

mod node;
mod repos;
mod sessions;

pub use node::NodeClient;
pub use repos::{
    CommitsQuery, IssueListQuery, IssueStatusFilter, PatchListQuery, PatchStatusFilter, RepoClient,
    RepoListQuery, RepoShow,
};
pub use sessions::SessionClient;

use std::sync::Arc;

use crate::base_url::BaseUrl;
use crate::error::Error;
use crate::fetcher::{Fetcher, HttpBackend, Method, RequestOptions, RequestSpec};
use crate::types::Profile;

/// Client for one node's HTTP API.
#[derive(Debug, Clone)]
pub struct HttpdClient {
    fetcher: Fetcher,
}

impl HttpdClient {
    /// Creates a client for the node at `base_url` using the default
    /// reqwest backend.
    pub fn new(base_url: BaseUrl) -> Self {
        HttpdClient {
            fetcher: Fetcher::new(base_url),
        }
    }

    /// Creates a client with a caller-supplied transport backend.
    pub fn with_backend(base_url: BaseUrl, backend: Arc<dyn HttpBackend>) -> Self {
        HttpdClient {
            fetcher: Fetcher::with_backend(base_url, backend),
        }
    }

    pub fn base_url(&self) -> &BaseUrl {
        self.fetcher.base_url()
    }

    /// Session lifecycle operations.
    pub fn sessions(&self) -> SessionClient {
        SessionClient::new(self.fetcher.clone())
    }

    /// Repository browsing and collaboration operations.
    pub fn repos(&self) -> RepoClient {
        RepoClient::new(self.fetcher.clone())
    }

    /// Operations on the node itself.
    pub fn node(&self) -> NodeClient {
        NodeClient::new(self.fetcher.clone())
    }

    /// Fetches the local profile of the node operator.
    pub async fn get_profile(&self, options: RequestOptions) -> Result<Profile, Error> {
        self.fetcher
            .fetch_ok(RequestSpec::new(Method::GET, "profile").with_options(options))
            .await
    }
}
