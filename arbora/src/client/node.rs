//! Operations on the node itself: state, policies, seeding.

use tracing::debug;

use crate::error::Error;
use crate::fetcher::{Fetcher, Method, RequestOptions, RequestSpec};
use crate::types::{
    Node, NodeIdentity, NodeInfo, NodeStats, RepoPolicy, SeedingPolicy, SuccessResponse,
};

/// Client for the `node` resource family.
#[derive(Debug, Clone)]
pub struct NodeClient {
    fetcher: Fetcher,
}

impl NodeClient {
    pub(crate) fn new(fetcher: Fetcher) -> Self {
        NodeClient { fetcher }
    }

    /// Fetches the node's identity, configuration and running state.
    pub async fn get(&self, options: RequestOptions) -> Result<Node, Error> {
        self.fetcher
            .fetch_ok(RequestSpec::new(Method::GET, "node").with_options(options))
            .await
    }

    /// Fetches the API root: service identification and discovery links.
    pub async fn get_info(&self, options: RequestOptions) -> Result<NodeInfo, Error> {
        self.fetcher
            .fetch_ok(RequestSpec::new(Method::GET, "").with_options(options))
            .await
    }

    /// Fetches node-wide statistics.
    pub async fn get_stats(&self, options: RequestOptions) -> Result<NodeStats, Error> {
        self.fetcher
            .fetch_ok(RequestSpec::new(Method::GET, "stats").with_options(options))
            .await
    }

    /// Lists the seeding decisions for every repo the node knows.
    pub async fn get_policies(&self, options: RequestOptions) -> Result<Vec<RepoPolicy>, Error> {
        self.fetcher
            .fetch_ok(RequestSpec::new(Method::GET, "node/policies/repos").with_options(options))
            .await
    }

    /// Fetches the seeding decision for one repo.
    pub async fn get_policy_by_rid(
        &self,
        rid: &str,
        options: RequestOptions,
    ) -> Result<SeedingPolicy, Error> {
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::GET, format!("node/policies/repos/{rid}"))
                    .with_options(options),
            )
            .await
    }

    /// Starts seeding a repo.
    pub async fn seed(
        &self,
        rid: &str,
        session_id: &str,
        options: RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        debug!(rid, "seeding repo");
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::PUT, format!("node/policies/repos/{rid}"))
                    .with_bearer(session_id)
                    .with_options(options),
            )
            .await
    }

    /// Stops seeding a repo.
    pub async fn unseed(
        &self,
        rid: &str,
        session_id: &str,
        options: RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        debug!(rid, "unseeding repo");
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::DELETE, format!("node/policies/repos/{rid}"))
                    .with_bearer(session_id)
                    .with_options(options),
            )
            .await
    }

    /// Looks up the alias stored for a peer.
    pub async fn get_identity(
        &self,
        nid: &str,
        options: RequestOptions,
    ) -> Result<NodeIdentity, Error> {
        self.fetcher
            .fetch_ok(RequestSpec::new(Method::GET, format!("nodes/{nid}")).with_options(options))
            .await
    }
}
