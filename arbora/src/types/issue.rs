//! Issues and the actions that mutate them.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

use crate::types::comment::{Comment, Embed};
use crate::types::shared::Author;

/// Why a closed issue was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CloseReason {
    Other,
    Solved,
}

/// Issue lifecycle state.
///
/// Discriminates on the literal `status` field. A close reason is required
/// on the closed arm and rejected on the open arm; decoding fails on any
/// mixed payload rather than dropping the extra field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueState {
    Open,
    Closed { reason: CloseReason },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIssueState {
    status: String,
    #[serde(default)]
    reason: Option<CloseReason>,
}

impl<'de> Deserialize<'de> for IssueState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawIssueState::deserialize(deserializer)?;
        match (raw.status.as_str(), raw.reason) {
            ("open", None) => Ok(IssueState::Open),
            ("open", Some(_)) => Err(de::Error::unknown_field("reason", &["status"])),
            ("closed", Some(reason)) => Ok(IssueState::Closed { reason }),
            ("closed", None) => Err(de::Error::missing_field("reason")),
            (other, _) => Err(de::Error::unknown_variant(other, &["open", "closed"])),
        }
    }
}

impl Serialize for IssueState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            IssueState::Open => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("status", "open")?;
                map.end()
            }
            IssueState::Closed { reason } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("status", "closed")?;
                map.serialize_entry("reason", reason)?;
                map.end()
            }
        }
    }
}

/// An issue with its full discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Issue {
    pub id: String,
    pub author: Author,
    pub title: String,
    pub state: IssueState,
    pub discussion: Vec<Comment>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<Author>,
}

/// Payload for opening a new issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
    pub assignees: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

/// Acknowledgement of a created issue, carrying its new id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IssueCreated {
    pub success: bool,
    pub id: String,
}

/// One mutation applied to an existing issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum IssueAction {
    Edit {
        title: String,
    },
    Label {
        labels: Vec<String>,
    },
    Assign {
        assignees: Vec<String>,
    },
    Lifecycle {
        state: IssueState,
    },
    Comment {
        body: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        embeds: Vec<Embed>,
        #[serde(rename = "replyTo", skip_serializing_if = "Option::is_none")]
        reply_to: Option<String>,
    },
    #[serde(rename = "comment.edit")]
    CommentEdit {
        id: String,
        body: String,
        embeds: Vec<Embed>,
    },
    #[serde(rename = "comment.redact")]
    CommentRedact { id: String },
    #[serde(rename = "comment.react")]
    CommentReact {
        id: String,
        reaction: String,
        active: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issue_state_accepts_both_arms() {
        let open: IssueState = serde_json::from_value(json!({"status": "open"})).unwrap();
        assert_eq!(open, IssueState::Open);

        let closed: IssueState =
            serde_json::from_value(json!({"status": "closed", "reason": "solved"})).unwrap();
        assert_eq!(
            closed,
            IssueState::Closed {
                reason: CloseReason::Solved
            }
        );
    }

    #[test]
    fn test_issue_state_rejects_closed_without_reason() {
        let err = serde_json::from_value::<IssueState>(json!({"status": "closed"})).unwrap_err();
        assert!(err.to_string().contains("reason"));
    }

    #[test]
    fn test_issue_state_rejects_open_with_reason() {
        let err = serde_json::from_value::<IssueState>(json!({"status": "open", "reason": "other"}))
            .unwrap_err();
        assert!(err.to_string().contains("reason"));
    }

    #[test]
    fn test_issue_state_rejects_unknown_status() {
        assert!(serde_json::from_value::<IssueState>(json!({"status": "paused"})).is_err());
    }

    #[test]
    fn test_issue_state_serializes_with_status_tag() {
        assert_eq!(
            serde_json::to_value(IssueState::Open).unwrap(),
            json!({"status": "open"})
        );
        assert_eq!(
            serde_json::to_value(IssueState::Closed {
                reason: CloseReason::Other
            })
            .unwrap(),
            json!({"status": "closed", "reason": "other"})
        );
    }

    #[test]
    fn test_issue_action_comment_omits_absent_fields() {
        let action = IssueAction::Comment {
            body: "Reproduced on 1.4.2".into(),
            embeds: Vec::new(),
            reply_to: None,
        };
        assert_eq!(
            serde_json::to_value(action).unwrap(),
            json!({"type": "comment", "body": "Reproduced on 1.4.2"})
        );
    }

    #[test]
    fn test_issue_action_dotted_tags() {
        let action = IssueAction::CommentReact {
            id: "f2a94d1cdc0e1e5bdbd0c1d0b63f33f9f4b1e82a".into(),
            reaction: "🚀".into(),
            active: true,
        };
        let value = serde_json::to_value(action).unwrap();
        assert_eq!(value["type"], "comment.react");
        assert_eq!(value["active"], true);
    }
}
