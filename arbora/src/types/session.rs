//! Web sessions used to authorize mutations.

use serde::{Deserialize, Serialize};

use crate::types::shared::Timestamp;

/// Whether a session has been signed by the node key yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Authorized,
    Unauthorized,
}

/// A session issued by the daemon. Created unauthorized; authorizing it
/// requires submitting a signature over the session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub status: SessionStatus,
    pub public_key: String,
    pub alias: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

impl Session {
    /// An authorized session that has not yet expired.
    pub fn is_valid_at(&self, now: Timestamp) -> bool {
        self.status == SessionStatus::Authorized && self.expires_at >= now
    }
}

/// Signature submitted to authorize a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionAuth {
    pub sig: String,
    pub pk: String,
}
