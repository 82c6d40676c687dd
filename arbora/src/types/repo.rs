//! Repositories and their source browsing payloads.

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::types::commit::CommitHeader;
use crate::types::shared::{Author, SeedingPolicy, Timestamp};

/// Who may fetch a repo.
///
/// Private visibility carries an allow list; decoding rejects an allow list
/// on the public arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private { allow: Vec<String> },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawVisibility {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    allow: Option<Vec<String>>,
}

impl<'de> Deserialize<'de> for Visibility {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawVisibility::deserialize(deserializer)?;
        match (raw.kind.as_str(), raw.allow) {
            ("public", None) => Ok(Visibility::Public),
            ("public", Some(_)) => Err(de::Error::unknown_field("allow", &["type"])),
            ("private", allow) => Ok(Visibility::Private {
                allow: allow.unwrap_or_default(),
            }),
            (other, _) => Err(de::Error::unknown_variant(other, &["public", "private"])),
        }
    }
}

/// Issue counts by state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IssueCounts {
    pub open: u64,
    pub closed: u64,
}

/// Patch counts by state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PatchCounts {
    pub open: u64,
    pub draft: u64,
    pub archived: u64,
    pub merged: u64,
}

/// A repository as listed by the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Repo {
    pub rid: String,
    pub name: String,
    pub description: String,
    pub default_branch: String,
    pub head: String,
    pub delegates: Vec<Author>,
    pub visibility: Visibility,
    pub issues: IssueCounts,
    pub patches: PatchCounts,
    pub seeding: u64,
    pub threshold: u64,
}

/// File content from a tree, base64 or plain depending on `binary`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub binary: bool,
    #[serde(default)]
    pub content: Option<String>,
    pub name: String,
    pub path: String,
    pub last_commit: CommitHeader,
}

/// Kind of a tree entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Submodule,
}

/// One entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub name: String,
    pub oid: String,
    #[serde(rename = "kind")]
    pub kind: EntryKind,
}

/// A directory listing at some commit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
    pub last_commit: CommitHeader,
    pub name: String,
    pub path: String,
}

/// A remote tracked for a repo, with the refs it is known to have.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Remote {
    pub id: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub heads: BTreeMap<String, String>,
    #[serde(default)]
    pub delegate: bool,
}

/// Commit activity, one timestamp per commit, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Activity {
    pub activity: Vec<Timestamp>,
}

/// A repo id paired with the node's seeding decision for it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RepoPolicy {
    pub rid: String,
    pub policy: SeedingPolicy,
}
