//! Commits, diffs and tree statistics.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Author or committer identity as recorded in git.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitPerson {
    pub name: String,
    pub email: String,
}

/// Git identity plus the commit or author time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committer {
    pub name: String,
    pub email: String,
    pub time: u64,
}

/// Commit metadata without its diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitHeader {
    pub id: String,
    pub author: GitPerson,
    pub summary: String,
    pub description: String,
    pub parents: Vec<String>,
    pub committer: Committer,
}

/// One line of a hunk.
///
/// Additions and deletions carry a single line number; context lines carry
/// both sides. Decoding rejects line-number fields from the wrong variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Addition {
        line: String,
        line_no: u64,
    },
    Deletion {
        line: String,
        line_no: u64,
    },
    Context {
        line: String,
        line_no_new: u64,
        line_no_old: u64,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawHunkLine {
    #[serde(rename = "type")]
    kind: String,
    line: String,
    #[serde(default)]
    line_no: Option<u64>,
    #[serde(default)]
    line_no_new: Option<u64>,
    #[serde(default)]
    line_no_old: Option<u64>,
}

impl<'de> Deserialize<'de> for HunkLine {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawHunkLine::deserialize(deserializer)?;
        match raw.kind.as_str() {
            "addition" | "deletion" => {
                if raw.line_no_new.is_some() || raw.line_no_old.is_some() {
                    return Err(de::Error::unknown_field(
                        "lineNoNew",
                        &["type", "line", "lineNo"],
                    ));
                }
                let line_no = raw
                    .line_no
                    .ok_or_else(|| de::Error::missing_field("lineNo"))?;
                if raw.kind == "addition" {
                    Ok(HunkLine::Addition {
                        line: raw.line,
                        line_no,
                    })
                } else {
                    Ok(HunkLine::Deletion {
                        line: raw.line,
                        line_no,
                    })
                }
            }
            "context" => {
                if raw.line_no.is_some() {
                    return Err(de::Error::unknown_field(
                        "lineNo",
                        &["type", "line", "lineNoNew", "lineNoOld"],
                    ));
                }
                let line_no_new = raw
                    .line_no_new
                    .ok_or_else(|| de::Error::missing_field("lineNoNew"))?;
                let line_no_old = raw
                    .line_no_old
                    .ok_or_else(|| de::Error::missing_field("lineNoOld"))?;
                Ok(HunkLine::Context {
                    line: raw.line,
                    line_no_new,
                    line_no_old,
                })
            }
            other => Err(de::Error::unknown_variant(
                other,
                &["addition", "deletion", "context"],
            )),
        }
    }
}

/// A contiguous run of changed lines with its `@@` header.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Hunk {
    pub header: String,
    pub lines: Vec<HunkLine>,
}

/// How a changed file's content is represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangesetKind {
    Plain,
    Binary,
    Empty,
}

/// Trailing-newline state on either side of a file diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EofState {
    NoneMissing,
    OldMissing,
    NewMissing,
    BothMissing,
}

/// Diff content for a single file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FileDiff {
    #[serde(rename = "type")]
    pub kind: ChangesetKind,
    #[serde(default)]
    pub hunks: Vec<Hunk>,
    pub eof: EofState,
}

/// A file path paired with its diff.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Changeset {
    pub path: String,
    pub diff: FileDiff,
}

/// A rename or copy, keyed by both sides of the move.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathChange {
    pub old_path: String,
    pub new_path: String,
}

/// Aggregate counters for a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffStats {
    pub files_changed: u64,
    pub insertions: u64,
    pub deletions: u64,
}

/// Full diff grouped by the kind of change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Diff {
    pub added: Vec<Changeset>,
    pub deleted: Vec<Changeset>,
    pub moved: Vec<PathChange>,
    pub copied: Vec<PathChange>,
    pub modified: Vec<Changeset>,
    pub stats: DiffStats,
}

/// One commit in a history listing, with its diff and branch membership.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub commit: CommitHeader,
    pub diff: Diff,
    pub branches: Vec<String>,
}

/// Counters for a whole tree of history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TreeStats {
    pub commits: u64,
    pub branches: u64,
    pub contributors: u64,
}

/// Response shape of a commit history listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commits {
    pub commits: Vec<Commit>,
    pub stats: TreeStats,
}

/// Response shape of a diff between two commits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DiffResponse {
    pub commits: Vec<CommitHeader>,
    pub diff: Diff,
}
