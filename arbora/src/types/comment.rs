//! Discussion threads attached to issues, revisions and reviews.

use serde::{Deserialize, Serialize};

use crate::types::shared::{Author, CodeLocation, Timestamp};

/// Named attachment referenced from a comment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub name: String,
    pub content: String,
}

/// One reaction: the reacting identity and the emoji it chose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction(pub String, pub String);

impl Reaction {
    pub fn actor(&self) -> &str {
        &self.0
    }

    pub fn emoji(&self) -> &str {
        &self.1
    }
}

/// A historical version of a comment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub author: Author,
    pub body: String,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    pub timestamp: Timestamp,
}

/// A single comment in a discussion thread.
///
/// `reply_to` is `None` for top-level comments. `location` is only present
/// on review comments anchored to a code span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub author: Author,
    pub body: String,
    #[serde(default)]
    pub edits: Vec<Edit>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default)]
    pub reactions: Vec<Reaction>,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub resolved: bool,
    #[serde(default)]
    pub location: Option<CodeLocation>,
    pub reply_to: Option<String>,
}
