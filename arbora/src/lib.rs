//! Arbora - typed async client for sovereign code forge nodes
//!
//! This library speaks the JSON HTTP API exposed by a forge node daemon:
//! repositories, issues, patches, commits, diffs, sessions and node policy
//! management, plus the supporting machinery a long-lived client needs
//! (request memoization, latest-wins task execution, background node
//! monitoring).
//!
//! # High-Level API
//!
//! Most interactions go through an [`client::HttpdClient`] bound to one
//! daemon address:
//!
//! ```ignore
//! use arbora::base_url::BaseUrl;
//! use arbora::client::HttpdClient;
//! use arbora::fetcher::RequestOptions;
//!
//! let client = HttpdClient::new(BaseUrl::localhost(8080));
//! let repo = client
//!     .repos()
//!     .get_by_rid("arb:z3gqcJUoA1n9HaHKufZs5FCSGazv5", RequestOptions::default())
//!     .await?;
//! println!("{} has {} open issues", repo.name, repo.issues.open);
//! ```
//!
//! Long-running consumers typically wrap the client in a
//! [`monitor::NodeMonitor`] to track daemon availability, and put hot read
//! paths behind a [`cache::Memo`].

pub mod base_url;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod fetcher;
pub mod monitor;
pub mod types;

/// Version of the arbora library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_semver_shaped() {
        assert_eq!(VERSION.split('.').count(), 3);
    }
}
