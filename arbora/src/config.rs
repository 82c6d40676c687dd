//! Client-side configuration defaults.
//!
//! These are pure data types consumed by composition roots. The library
//! never reads configuration files itself; callers load JSON from wherever
//! they keep it and deserialize into [`Config`], with missing fields
//! falling back to the stock values.

use serde::{Deserialize, Serialize};

use crate::base_url::{BaseUrl, Scheme, DEFAULT_HTTPD_PORT};

/// Command-line integration preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Whether UIs should show copyable CLI command hints.
    pub hints: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig { hints: true }
    }
}

/// Where to look for a node daemon when the caller does not say.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeDefaults {
    pub scheme: Scheme,
    pub hostname: String,
    pub port: u16,
}

impl NodeDefaults {
    /// The default daemon address as a connectable endpoint.
    pub fn base_url(&self) -> BaseUrl {
        BaseUrl::new(self.scheme, self.hostname.clone(), self.port)
    }
}

impl Default for NodeDefaults {
    fn default() -> Self {
        NodeDefaults {
            scheme: Scheme::Http,
            hostname: "127.0.0.1".to_string(),
            port: DEFAULT_HTTPD_PORT,
        }
    }
}

/// Deserializable client defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Public explorer URL template. `$host`, `$rid` and `$path` are
    /// substituted by [`Config::explorer_url`].
    pub public_explorer: String,
    /// Seeds to fall back to when no local node answers.
    pub preferred_seeds: Vec<BaseUrl>,
    /// Command-line integration preferences.
    pub cli: CliConfig,
    /// Where to look for a local node daemon.
    pub node: NodeDefaults,
}

impl Config {
    /// Renders the public explorer link for a repository.
    ///
    /// `path` is appended verbatim, so it should start with `/` when
    /// non-empty.
    pub fn explorer_url(&self, host: &str, rid: &str, path: &str) -> String {
        self.public_explorer
            .replace("$host", host)
            .replace("$rid", rid)
            .replace("$path", path)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            public_explorer: "https://explorer.arbora.xyz/nodes/$host/$rid$path".to_string(),
            preferred_seeds: vec![BaseUrl::new(Scheme::Https, "seed.arbora.xyz", 443)],
            cli: CliConfig::default(),
            node: NodeDefaults::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_node_is_local_http() {
        let config = Config::default();
        assert_eq!(config.node.base_url(), BaseUrl::localhost(DEFAULT_HTTPD_PORT));
        assert!(config.cli.hints);
        assert_eq!(config.preferred_seeds.len(), 1);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"cli": {"hints": false}}"#).unwrap();
        assert!(!config.cli.hints);
        assert_eq!(config.node, NodeDefaults::default());
        assert_eq!(config.public_explorer, Config::default().public_explorer);
    }

    #[test]
    fn test_deserialize_overrides() {
        let config: Config = serde_json::from_str(
            r#"{
                "publicExplorer": "https://code.example.com/$host/$rid$path",
                "preferredSeeds": [{"hostname": "seed.example.com", "port": 443, "scheme": "https"}],
                "node": {"scheme": "https", "hostname": "node.example.com", "port": 8443}
            }"#,
        )
        .unwrap();
        assert_eq!(
            config.node.base_url(),
            BaseUrl::new(Scheme::Https, "node.example.com", 8443)
        );
        assert_eq!(
            config.preferred_seeds,
            vec![BaseUrl::new(Scheme::Https, "seed.example.com", 443)]
        );
    }

    #[test]
    fn test_explorer_url_substitution() {
        let config = Config::default();
        let url = config.explorer_url(
            "seed.arbora.xyz",
            "arb:z3gqcJUoA1n9HaHKufZs5FCSGazv5",
            "/tree",
        );
        assert_eq!(
            url,
            "https://explorer.arbora.xyz/nodes/seed.arbora.xyz/arb:z3gqcJUoA1n9HaHKufZs5FCSGazv5/tree"
        );
    }
}
