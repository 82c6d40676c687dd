//! Background monitoring of a node's availability and session state.
//!
//! [`NodeMonitor`] polls the daemon on an interval and publishes a
//! [`NodeStatus`] through a watch channel. Consumers read the latest status
//! cheaply or subscribe for change notifications; identical consecutive
//! probe results are not re-published, so subscribers only wake on actual
//! transitions.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::HttpdClient;
use crate::error::Error;
use crate::fetcher::RequestOptions;
use crate::types::{Node, Session, SessionAuth, Timestamp};

/// How often the daemon is probed by default.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Last known state of the daemon.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NodeStatus {
    /// The daemon did not answer the last probe.
    #[default]
    Stopped,
    /// The daemon is reachable.
    Running { node: Node },
    /// The daemon is reachable and a valid authorized session is held.
    Authenticated { node: Node, session: Session },
}

impl NodeStatus {
    pub fn is_running(&self) -> bool {
        !matches!(self, NodeStatus::Stopped)
    }

    /// The held session, when authenticated.
    pub fn session(&self) -> Option<&Session> {
        match self {
            NodeStatus::Authenticated { session, .. } => Some(session),
            _ => None,
        }
    }
}

/// Polls one node in the background and publishes status transitions.
#[derive(Debug)]
pub struct NodeMonitor {
    client: HttpdClient,
    tx: Arc<watch::Sender<NodeStatus>>,
    shutdown: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl NodeMonitor {
    /// Starts monitoring with the default poll interval.
    pub fn spawn(client: HttpdClient) -> Self {
        Self::with_interval(client, DEFAULT_POLL_INTERVAL)
    }

    /// Starts monitoring with an explicit poll interval. The first probe
    /// runs immediately.
    pub fn with_interval(client: HttpdClient, poll_interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(NodeStatus::default());
        let tx = Arc::new(tx);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poll_loop(
            client.clone(),
            tx.clone(),
            shutdown.clone(),
            poll_interval,
        ));

        NodeMonitor {
            client,
            tx,
            shutdown,
            handle: Some(handle),
        }
    }

    /// The most recently published status.
    pub fn current(&self) -> NodeStatus {
        self.tx.borrow().clone()
    }

    /// Subscribes to status transitions.
    pub fn subscribe(&self) -> watch::Receiver<NodeStatus> {
        self.tx.subscribe()
    }

    /// Probes the daemon now, without waiting for the next tick.
    pub async fn refresh(&self) -> NodeStatus {
        let previous = self.current();
        let next = probe(&self.client, &previous).await;
        publish(&self.tx, next.clone());
        next
    }

    /// Authorizes `session_id` with the given signature and switches to the
    /// authenticated state.
    ///
    /// Returns the authorized session. If the daemon reports the session as
    /// still not valid, the monitor stays in the running state.
    pub async fn authenticate(
        &self,
        session_id: &str,
        sig: &str,
        pk: &str,
    ) -> Result<Session, Error> {
        let sessions = self.client.sessions();
        let auth = SessionAuth {
            sig: sig.to_string(),
            pk: pk.to_string(),
        };
        sessions
            .update(session_id, &auth, RequestOptions::default())
            .await?;

        let node = self.client.node().get(RequestOptions::default()).await?;
        let session = sessions
            .get_by_id(session_id, RequestOptions::default())
            .await?;

        let status = if session.is_valid_at(Timestamp::now()) {
            NodeStatus::Authenticated {
                node,
                session: session.clone(),
            }
        } else {
            warn!(session = session_id, "session not valid after authorizing");
            NodeStatus::Running { node }
        };
        publish(&self.tx, status);
        Ok(session)
    }

    /// Revokes the held session, if any, and re-probes.
    pub async fn disconnect(&self) -> Result<(), Error> {
        if let NodeStatus::Authenticated { session, .. } = self.current() {
            self.client
                .sessions()
                .delete(&session.session_id, RequestOptions::default())
                .await?;
        }
        self.refresh().await;
        Ok(())
    }

    /// Stops the polling task and waits for it to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for NodeMonitor {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn poll_loop(
    client: HttpdClient,
    tx: Arc<watch::Sender<NodeStatus>>,
    shutdown: CancellationToken,
    poll_interval: Duration,
) {
    let mut ticker = tokio::time::interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                debug!("node monitor stopping");
                return;
            }
            _ = ticker.tick() => {
                let previous = tx.borrow().clone();
                let next = probe(&client, &previous).await;
                if publish(&tx, next) {
                    debug!("node status changed");
                }
            }
        }
    }
}

/// Determines the next status from one round of requests.
async fn probe(client: &HttpdClient, previous: &NodeStatus) -> NodeStatus {
    let node: Node = match client.node().get(RequestOptions::default()).await {
        Ok(node) => node,
        Err(err) => {
            debug!(error = %err, "node unreachable");
            return NodeStatus::Stopped;
        }
    };

    // Revalidate a held session rather than silently keeping it forever.
    if let NodeStatus::Authenticated { session, .. } = previous {
        match client
            .sessions()
            .get_by_id(&session.session_id, RequestOptions::default())
            .await
        {
            Ok(session) if session.is_valid_at(Timestamp::now()) => {
                return NodeStatus::Authenticated { node, session };
            }
            Ok(_) => warn!("held session expired or was deauthorized"),
            Err(err) => warn!(error = %err, "held session could not be revalidated"),
        }
    }

    NodeStatus::Running { node }
}

/// Publishes `next` if it differs from the current status. Returns whether
/// subscribers were notified.
fn publish(tx: &watch::Sender<NodeStatus>, next: NodeStatus) -> bool {
    tx.send_if_modified(|current| {
        if *current == next {
            false
        } else {
            *current = next;
            true
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    use crate::base_url::BaseUrl;
    use crate::fetcher::{BackendError, HttpBackend, HttpRequest, HttpResponse};

    struct StubBackend;

    #[async_trait]
    impl HttpBackend for StubBackend {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, BackendError> {
            match request.url.path() {
                "/api/v1/node" => Ok(HttpResponse {
                    status: 200,
                    body: serde_json::to_vec(&json!({
                        "id": "z6MkltRpzcq2ybm13yQpyre58JUeMvZY6toxoZVpLZ8YabNf",
                        "agent": "/arbora:0.9.0/",
                        "config": null,
                        "state": "running"
                    }))
                    .unwrap(),
                }),
                _ => Ok(HttpResponse {
                    status: 404,
                    body: b"{}".to_vec(),
                }),
            }
        }
    }

    struct DownBackend;

    #[async_trait]
    impl HttpBackend for DownBackend {
        async fn send(&self, _request: HttpRequest) -> Result<HttpResponse, BackendError> {
            Err(BackendError {
                message: "connection refused".to_string(),
            })
        }
    }

    fn client(backend: Arc<dyn HttpBackend>) -> HttpdClient {
        HttpdClient::with_backend(BaseUrl::localhost(8080), backend)
    }

    #[tokio::test]
    async fn test_refresh_reports_running_node() {
        let monitor = NodeMonitor::with_interval(
            client(Arc::new(StubBackend)),
            Duration::from_secs(3600),
        );

        let status = monitor.refresh().await;
        match &status {
            NodeStatus::Running { node } => assert_eq!(node.agent, "/arbora:0.9.0/"),
            other => panic!("expected running, got {other:?}"),
        }
        assert!(status.is_running());
        assert!(status.session().is_none());

        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_unreachable_daemon_reports_stopped() {
        let monitor = NodeMonitor::with_interval(
            client(Arc::new(DownBackend)),
            Duration::from_secs(3600),
        );

        assert_eq!(monitor.refresh().await, NodeStatus::Stopped);
        monitor.shutdown().await;
    }

    #[tokio::test]
    async fn test_identical_probe_does_not_notify() {
        let monitor = NodeMonitor::with_interval(
            client(Arc::new(StubBackend)),
            Duration::from_secs(3600),
        );

        let mut rx = monitor.subscribe();
        monitor.refresh().await;
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        monitor.refresh().await;
        assert!(!rx.has_changed().unwrap());

        monitor.shutdown().await;
    }
}
