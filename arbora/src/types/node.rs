//! The node itself: runtime state, configuration and API discovery.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::types::shared::{Policy, Scope};

/// Peer discovery mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeerConfig {
    Static,
    Dynamic { target: u64 },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPeerConfig {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    target: Option<u64>,
}

impl<'de> Deserialize<'de> for PeerConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawPeerConfig::deserialize(deserializer)?;
        match (raw.kind.as_str(), raw.target) {
            ("static", None) => Ok(PeerConfig::Static),
            ("static", Some(_)) => Err(de::Error::unknown_field("target", &["type"])),
            ("dynamic", Some(target)) => Ok(PeerConfig::Dynamic { target }),
            ("dynamic", None) => Err(de::Error::missing_field("target")),
            (other, _) => Err(de::Error::unknown_variant(other, &["static", "dynamic"])),
        }
    }
}

/// Which network the node gossips on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Main,
    Test,
}

/// Whether the node relays traffic for others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelayMode {
    Always,
    Never,
    Auto,
}

/// Token-bucket parameters for one direction.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimit {
    pub fill_rate: f64,
    pub capacity: u64,
}

/// Rate limits for both directions.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RateLimits {
    pub inbound: RateLimit,
    pub outbound: RateLimit,
}

/// Connection count limits for both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ConnectionLimits {
    pub inbound: u64,
    pub outbound: u64,
}

/// Resource limits the node runs under.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeLimits {
    pub routing_max_size: u64,
    pub routing_max_age: u64,
    pub fetch_concurrency: u64,
    pub gossip_max_age: u64,
    pub max_open_files: u64,
    pub rate: RateLimits,
    #[serde(default)]
    pub connection: Option<ConnectionLimits>,
}

/// Tor integration mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnionConfig {
    Proxy { address: String },
    Forward,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawOnionConfig {
    mode: String,
    #[serde(default)]
    address: Option<String>,
}

impl<'de> Deserialize<'de> for OnionConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawOnionConfig::deserialize(deserializer)?;
        match (raw.mode.as_str(), raw.address) {
            ("proxy", Some(address)) => Ok(OnionConfig::Proxy { address }),
            ("proxy", None) => Err(de::Error::missing_field("address")),
            ("forward", None) => Ok(OnionConfig::Forward),
            ("forward", Some(_)) => Err(de::Error::unknown_field("address", &["mode"])),
            (other, _) => Err(de::Error::unknown_variant(other, &["proxy", "forward"])),
        }
    }
}

/// Log verbosity as the daemon reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Node configuration as reported by the daemon.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    pub alias: String,
    pub peers: PeerConfig,
    #[serde(default)]
    pub listen: Vec<String>,
    #[serde(default)]
    pub connect: Vec<String>,
    #[serde(default)]
    pub external_addresses: Vec<String>,
    pub network: Network,
    pub relay: RelayMode,
    pub limits: NodeLimits,
    pub policy: Policy,
    pub scope: Scope,
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default)]
    pub onion: Option<OnionConfig>,
    #[serde(default)]
    pub log: Option<LogLevel>,
    #[serde(default)]
    pub workers: Option<u64>,
}

/// Whether the peer-to-peer node process is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeState {
    Running,
    Stopped,
}

/// Node identity and state. `config` is null while the node is stopped;
/// `agent` is the daemon's version string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Node {
    pub id: String,
    pub agent: String,
    pub config: Option<NodeConfig>,
    pub state: NodeState,
}

/// Stored information about a peer.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeIdentity {
    pub alias: Option<String>,
}

/// One hypermedia link from the API root.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiLink {
    pub href: String,
    pub rel: String,
    #[serde(rename = "type")]
    pub method: String,
}

/// API root payload: service identification plus discovery links.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub message: String,
    pub service: String,
    pub version: String,
    pub api_version: String,
    pub nid: String,
    pub path: String,
    pub links: Vec<ApiLink>,
}

/// Repo counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RepoCount {
    pub total: u64,
}

/// Node-wide statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct NodeStats {
    pub repos: RepoCount,
}

/// CLI preferences stored in the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct CliHints {
    pub hints: bool,
}

/// The `config` half of a profile payload.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileConfig {
    pub public_explorer: String,
    pub preferred_seeds: Vec<String>,
    pub cli: CliHints,
    pub node: NodeConfig,
}

/// Local profile: runtime configuration plus the home directory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Profile {
    pub config: ProfileConfig,
    pub home: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_peer_config_variants() {
        let fixed: PeerConfig = serde_json::from_value(json!({"type": "static"})).unwrap();
        assert_eq!(fixed, PeerConfig::Static);

        let dynamic: PeerConfig =
            serde_json::from_value(json!({"type": "dynamic", "target": 8})).unwrap();
        assert_eq!(dynamic, PeerConfig::Dynamic { target: 8 });

        assert!(
            serde_json::from_value::<PeerConfig>(json!({"type": "static", "target": 8})).is_err()
        );
    }

    #[test]
    fn test_onion_config_variants() {
        let proxy: OnionConfig =
            serde_json::from_value(json!({"mode": "proxy", "address": "127.0.0.1:9050"})).unwrap();
        assert_eq!(
            proxy,
            OnionConfig::Proxy {
                address: "127.0.0.1:9050".into()
            }
        );

        assert!(serde_json::from_value::<OnionConfig>(json!({"mode": "proxy"})).is_err());
    }

    #[test]
    fn test_stopped_node_has_no_config() {
        let node: Node = serde_json::from_value(json!({
            "id": "z6MkltRpzcq2ybm13yQpyre58JUeMvZY6toxoZVpLZ8YabNf",
            "agent": "/arbora:0.9.0/",
            "config": null,
            "state": "stopped"
        }))
        .unwrap();
        assert_eq!(node.state, NodeState::Stopped);
        assert!(node.config.is_none());
    }

    #[test]
    fn test_node_config_decodes() {
        let config: NodeConfig = serde_json::from_value(json!({
            "alias": "seed.arbora.xyz",
            "peers": {"type": "dynamic", "target": 8},
            "listen": ["0.0.0.0:8776"],
            "connect": [],
            "externalAddresses": ["seed.arbora.xyz:8776"],
            "network": "main",
            "relay": "auto",
            "limits": {
                "routingMaxSize": 1000,
                "routingMaxAge": 604800,
                "fetchConcurrency": 1,
                "gossipMaxAge": 1209600,
                "maxOpenFiles": 4096,
                "rate": {
                    "inbound": {"fillRate": 5.0, "capacity": 1024},
                    "outbound": {"fillRate": 10.0, "capacity": 2048}
                },
                "connection": {"inbound": 128, "outbound": 16}
            },
            "policy": "block",
            "scope": "all",
            "log": "INFO"
        }))
        .unwrap();
        assert_eq!(config.relay, RelayMode::Auto);
        assert_eq!(config.limits.rate.outbound.capacity, 2048);
        assert_eq!(config.log, Some(LogLevel::Info));
        assert!(config.onion.is_none());
    }
}
