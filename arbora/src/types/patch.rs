//! Patches: revisions, reviews, merges and the actions that mutate them.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::types::comment::{Comment, Edit, Embed, Reaction};
use crate::types::shared::{Author, CodeLocation, Timestamp};

/// Review outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Accept,
    Reject,
}

/// Patch lifecycle state.
///
/// Discriminates on the literal `status` field. The merged arm requires the
/// merged revision and commit; the open arm may carry merge conflicts.
/// Decoding rejects fields that belong to a different arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchState {
    Draft,
    Open {
        conflicts: Option<Vec<(String, String)>>,
    },
    Archived,
    Merged {
        revision: String,
        commit: String,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPatchState {
    status: String,
    #[serde(default)]
    conflicts: Option<Vec<(String, String)>>,
    #[serde(default)]
    revision: Option<String>,
    #[serde(default)]
    commit: Option<String>,
}

impl<'de> Deserialize<'de> for PatchState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawPatchState::deserialize(deserializer)?;
        if raw.status != "merged" {
            if raw.revision.is_some() {
                return Err(de::Error::unknown_field("revision", &["status"]));
            }
            if raw.commit.is_some() {
                return Err(de::Error::unknown_field("commit", &["status"]));
            }
        }
        if raw.status != "open" && raw.conflicts.is_some() {
            return Err(de::Error::unknown_field("conflicts", &["status"]));
        }
        match raw.status.as_str() {
            "draft" => Ok(PatchState::Draft),
            "open" => Ok(PatchState::Open {
                conflicts: raw.conflicts,
            }),
            "archived" => Ok(PatchState::Archived),
            "merged" => {
                let revision = raw
                    .revision
                    .ok_or_else(|| de::Error::missing_field("revision"))?;
                let commit = raw
                    .commit
                    .ok_or_else(|| de::Error::missing_field("commit"))?;
                Ok(PatchState::Merged { revision, commit })
            }
            other => Err(de::Error::unknown_variant(
                other,
                &["draft", "open", "archived", "merged"],
            )),
        }
    }
}

/// Target state of a lifecycle action. Merging is its own action, so this
/// set excludes the merged state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LifecycleState {
    Draft,
    Open,
    Archived,
}

/// Record of a revision being merged into the target branch.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Merge {
    pub author: Author,
    pub revision: String,
    pub commit: String,
    pub timestamp: Timestamp,
}

/// A review of one revision.
///
/// `summary` is always present on the wire, possibly null. `verdict` may be
/// absent entirely for a comment-only review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Review {
    pub id: String,
    pub author: Author,
    #[serde(default)]
    pub verdict: Option<Verdict>,
    pub summary: Option<String>,
    pub comments: Vec<Comment>,
    pub timestamp: Timestamp,
}

/// One iteration of a patch: a head commit against a base.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Revision {
    pub id: String,
    pub author: Author,
    pub description: String,
    #[serde(default)]
    pub edits: Vec<Edit>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    pub base: String,
    pub oid: String,
    #[serde(default)]
    pub refs: Vec<String>,
    #[serde(default)]
    pub discussions: Vec<Comment>,
    #[serde(default)]
    pub reviews: Vec<Review>,
    pub timestamp: Timestamp,
}

/// A proposed change with its revision history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Patch {
    pub id: String,
    pub author: Author,
    pub title: String,
    pub state: PatchState,
    pub target: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub merges: Vec<Merge>,
    #[serde(default)]
    pub assignees: Vec<Author>,
    pub revisions: Vec<Revision>,
}

impl Patch {
    /// The revision currently under review, if any exist.
    pub fn latest_revision(&self) -> Option<&Revision> {
        self.revisions.last()
    }
}

/// Payload for opening a new patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPatch {
    pub title: String,
    pub description: String,
    pub target: String,
    pub oid: String,
    pub labels: Vec<String>,
}

/// Acknowledgement of a created patch, carrying its new id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PatchCreated {
    pub success: bool,
    pub id: String,
}

/// One mutation applied to an existing patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PatchAction {
    Edit {
        title: String,
        target: String,
    },
    Label {
        labels: Vec<String>,
    },
    Assign {
        assignees: Vec<String>,
    },
    Merge {
        revision: String,
        commit: String,
    },
    Lifecycle {
        state: LifecycleState,
    },
    Review {
        revision: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
        verdict: Option<Verdict>,
    },
    #[serde(rename = "review.edit")]
    ReviewEdit {
        review: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
    #[serde(rename = "review.redact")]
    ReviewRedact { review: String },
    #[serde(rename = "review.comment")]
    ReviewComment {
        review: String,
        body: String,
        location: CodeLocation,
    },
    #[serde(rename = "review.comment.edit")]
    ReviewCommentEdit {
        review: String,
        comment: String,
        body: String,
    },
    #[serde(rename = "review.comment.redact")]
    ReviewCommentRedact { review: String, comment: String },
    #[serde(rename = "review.comment.react")]
    ReviewCommentReact {
        review: String,
        comment: String,
        reaction: String,
        active: bool,
    },
    Revision {
        description: String,
        base: String,
        oid: String,
    },
    #[serde(rename = "revision.edit")]
    RevisionEdit {
        revision: String,
        description: String,
    },
    #[serde(rename = "revision.redact")]
    RevisionRedact { revision: String },
    #[serde(rename = "revision.comment")]
    RevisionComment {
        revision: String,
        body: String,
        #[serde(rename = "replyTo", skip_serializing_if = "Option::is_none")]
        reply_to: Option<String>,
    },
    #[serde(rename = "revision.comment.edit")]
    RevisionCommentEdit {
        revision: String,
        comment: String,
        body: String,
    },
    #[serde(rename = "revision.comment.redact")]
    RevisionCommentRedact { revision: String, comment: String },
    #[serde(rename = "revision.comment.react")]
    RevisionCommentReact {
        revision: String,
        comment: String,
        reaction: String,
        active: bool,
    },
}
