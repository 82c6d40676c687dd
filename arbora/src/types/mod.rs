//! Wire types for the daemon's HTTP API.
//!
//! Every payload is validated at the boundary: unions that discriminate on a
//! literal field reject payloads mixing fields from different variants, and
//! acknowledge-only replies reject anything but the literal `true`. Plain
//! record types tolerate unknown fields so additive server changes do not
//! break decoding.

pub mod comment;
pub mod commit;
pub mod issue;
pub mod node;
pub mod patch;
pub mod repo;
pub mod session;
pub mod shared;

pub use comment::{Comment, Edit, Embed, Reaction};
pub use commit::{
    Changeset, ChangesetKind, Commit, CommitHeader, Commits, Committer, Diff, DiffResponse,
    DiffStats, EofState, FileDiff, GitPerson, Hunk, HunkLine, PathChange, TreeStats,
};
pub use issue::{CloseReason, Issue, IssueAction, IssueCreated, IssueState, NewIssue};
pub use node::{
    ApiLink, CliHints, ConnectionLimits, LogLevel, Network, Node, NodeConfig, NodeIdentity,
    NodeInfo, NodeLimits, NodeState, NodeStats, OnionConfig, PeerConfig, Profile, ProfileConfig,
    RateLimit, RateLimits, RelayMode, RepoCount,
};
pub use patch::{
    LifecycleState, Merge, NewPatch, Patch, PatchAction, PatchCreated, PatchState, Review,
    Revision, Verdict,
};
pub use repo::{
    Activity, Blob, EntryKind, IssueCounts, PatchCounts, Remote, Repo, RepoPolicy, Tree, TreeEntry,
    Visibility,
};
pub use session::{Session, SessionAuth, SessionStatus};
pub use shared::{
    Author, CodeLocation, Policy, Range, Scope, SeedingPolicy, Span, SuccessResponse, Timestamp,
};
