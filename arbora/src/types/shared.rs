//! Value types shared across resource families.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch.
///
/// The daemon reports every timestamp (issue and patch activity, session
/// expiry) in whole seconds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        Timestamp(secs)
    }

    pub fn as_secs(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An identity on the network: a DID plus an optional human alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

/// Acknowledge-only reply to a mutation. The wire value is always the
/// literal `true`; anything else fails decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuccessResponse {
    #[serde(deserialize_with = "expect_true")]
    pub success: bool,
}

fn expect_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    if bool::deserialize(deserializer)? {
        Ok(true)
    } else {
        Err(de::Error::invalid_value(
            de::Unexpected::Bool(false),
            &"the literal true",
        ))
    }
}

/// Which remotes of a seeded repo the node follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Followed,
    All,
}

/// Default tracking decision for newly discovered repos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Allow,
    Block,
}

/// Seeding decision for one repo: allow with a scope, or block.
///
/// Discriminates on the literal `policy` field; `scope` is only legal on
/// the allow arm and decoding rejects any other combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedingPolicy {
    Block,
    Allow { scope: Scope },
}

impl SeedingPolicy {
    pub fn scope(&self) -> Option<Scope> {
        match self {
            SeedingPolicy::Block => None,
            SeedingPolicy::Allow { scope } => Some(*scope),
        }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSeedingPolicy {
    policy: String,
    #[serde(default)]
    scope: Option<Scope>,
}

impl<'de> Deserialize<'de> for SeedingPolicy {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawSeedingPolicy::deserialize(deserializer)?;
        match (raw.policy.as_str(), raw.scope) {
            ("block", None) => Ok(SeedingPolicy::Block),
            ("block", Some(_)) => Err(de::Error::unknown_field("scope", &["policy"])),
            ("allow", Some(scope)) => Ok(SeedingPolicy::Allow { scope }),
            ("allow", None) => Err(de::Error::missing_field("scope")),
            (other, _) => Err(de::Error::unknown_variant(other, &["allow", "block"])),
        }
    }
}

/// Half-open start/end pair within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

/// Selection within a file: whole lines, or characters within one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Range {
    Lines { range: Span },
    Chars { line: u64, range: Span },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawRange {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    line: Option<u64>,
    #[serde(default)]
    range: Option<Span>,
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawRange::deserialize(deserializer)?;
        match (raw.kind.as_str(), raw.line, raw.range) {
            ("lines", None, Some(range)) => Ok(Range::Lines { range }),
            ("lines", Some(_), _) => Err(de::Error::unknown_field("line", &["type", "range"])),
            ("chars", Some(line), Some(range)) => Ok(Range::Chars { line, range }),
            ("chars", None, _) => Err(de::Error::missing_field("line")),
            (_, _, None) => Err(de::Error::missing_field("range")),
            (other, _, _) => Err(de::Error::unknown_variant(other, &["lines", "chars"])),
        }
    }
}

impl Serialize for Range {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Range::Lines { range } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", "lines")?;
                map.serialize_entry("range", range)?;
                map.end()
            }
            Range::Chars { line, range } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("type", "chars")?;
                map.serialize_entry("line", line)?;
                map.serialize_entry("range", range)?;
                map.end()
            }
        }
    }
}

/// Code span a review comment is anchored to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeLocation {
    pub commit: String,
    pub path: String,
    #[serde(rename = "old", default, skip_serializing_if = "Option::is_none")]
    pub old_range: Option<Range>,
    #[serde(rename = "new", default, skip_serializing_if = "Option::is_none")]
    pub new_range: Option<Range>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_timestamp_decodes_transparently() {
        let ts: Timestamp = serde_json::from_value(json!(1699900000)).unwrap();
        assert_eq!(ts, Timestamp(1699900000));
        assert_eq!(ts.as_secs(), 1699900000);
    }

    #[test]
    fn test_author_alias_is_optional() {
        let author: Author =
            serde_json::from_value(json!({"id": "did:key:z6MkltRpzcq2ybm13yQpyre58JUeMvZY6toxoZVpLZ8YabNf"}))
                .unwrap();
        assert!(author.alias.is_none());
    }

    #[test]
    fn test_success_response_requires_literal_true() {
        let ok: SuccessResponse = serde_json::from_value(json!({"success": true})).unwrap();
        assert!(ok.success);

        assert!(serde_json::from_value::<SuccessResponse>(json!({"success": false})).is_err());
        let err = serde_json::from_value::<SuccessResponse>(json!({"success": true, "id": "x"}))
            .unwrap_err();
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_seeding_policy_variants() {
        let block: SeedingPolicy = serde_json::from_value(json!({"policy": "block"})).unwrap();
        assert_eq!(block, SeedingPolicy::Block);
        assert_eq!(block.scope(), None);

        let allow: SeedingPolicy =
            serde_json::from_value(json!({"policy": "allow", "scope": "all"})).unwrap();
        assert_eq!(allow.scope(), Some(Scope::All));
    }

    #[test]
    fn test_seeding_policy_rejects_mixed_variants() {
        let err = serde_json::from_value::<SeedingPolicy>(
            json!({"policy": "block", "scope": "followed"}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("scope"));

        let err = serde_json::from_value::<SeedingPolicy>(json!({"policy": "allow"})).unwrap_err();
        assert!(err.to_string().contains("scope"));

        assert!(serde_json::from_value::<SeedingPolicy>(json!({"policy": "maybe"})).is_err());
    }

    #[test]
    fn test_range_round_trip() {
        let lines: Range =
            serde_json::from_value(json!({"type": "lines", "range": {"start": 3, "end": 7}}))
                .unwrap();
        assert_eq!(
            lines,
            Range::Lines {
                range: Span { start: 3, end: 7 }
            }
        );
        assert_eq!(
            serde_json::to_value(lines).unwrap(),
            json!({"type": "lines", "range": {"start": 3, "end": 7}})
        );
    }

    #[test]
    fn test_range_rejects_mixed_variants() {
        let err = serde_json::from_value::<Range>(
            json!({"type": "lines", "line": 4, "range": {"start": 0, "end": 1}}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("line"));

        let err = serde_json::from_value::<Range>(
            json!({"type": "chars", "range": {"start": 0, "end": 1}}),
        )
        .unwrap_err();
        assert!(err.to_string().contains("line"));
    }
}
