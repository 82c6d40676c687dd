//! Session lifecycle: create, authorize, inspect, revoke.

use tracing::debug;

use crate::error::Error;
use crate::fetcher::{Fetcher, Method, RequestOptions, RequestSpec};
use crate::types::{Session, SessionAuth, SuccessResponse};

/// Client for the `sessions` resource family.
#[derive(Debug, Clone)]
pub struct SessionClient {
    fetcher: Fetcher,
}

impl SessionClient {
    pub(crate) fn new(fetcher: Fetcher) -> Self {
        SessionClient { fetcher }
    }

    /// Fetches a session by its id.
    pub async fn get_by_id(&self, id: &str, options: RequestOptions) -> Result<Session, Error> {
        self.fetcher
            .fetch_ok(RequestSpec::new(Method::GET, format!("sessions/{id}")).with_options(options))
            .await
    }

    /// Creates a new, unauthorized session.
    pub async fn create(&self, options: RequestOptions) -> Result<Session, Error> {
        debug!("creating session");
        self.fetcher
            .fetch_ok(RequestSpec::new(Method::POST, "sessions").with_options(options))
            .await
    }

    /// Authorizes a session by submitting a signature over its id.
    pub async fn update(
        &self,
        id: &str,
        auth: &SessionAuth,
        options: RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        debug!(session = id, "authorizing session");
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::PUT, format!("sessions/{id}"))
                    .with_json(auth)?
                    .with_options(options),
            )
            .await
    }

    /// Revokes a session. The session authenticates its own deletion.
    pub async fn delete(
        &self,
        id: &str,
        options: RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        debug!(session = id, "deleting session");
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::DELETE, format!("sessions/{id}"))
                    .with_bearer(id)
                    .with_options(options),
            )
            .await
    }
}
