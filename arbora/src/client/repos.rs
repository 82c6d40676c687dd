//! Repository browsing, issues and patches.

use std::fmt;

use tracing::debug;

use crate::error::Error;
use crate::fetcher::{Fetcher, Method, QueryParams, RequestOptions, RequestSpec};
use crate::types::{
    Activity, Blob, Commit, Commits, DiffResponse, Issue, IssueAction, IssueCreated, NewIssue,
    NewPatch, Patch, PatchAction, PatchCreated, Remote, Repo, SuccessResponse, Timestamp, Tree,
    TreeStats,
};

/// Which repos a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoShow {
    Pinned,
    All,
}

impl fmt::Display for RepoShow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoShow::Pinned => write!(f, "pinned"),
            RepoShow::All => write!(f, "all"),
        }
    }
}

/// Pagination and filtering for repo listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub show: Option<RepoShow>,
}

impl RepoListQuery {
    fn to_query(self) -> QueryParams {
        let mut query = QueryParams::new();
        query.push_opt("page", self.page);
        query.push_opt("perPage", self.per_page);
        query.push_opt("show", self.show);
        query
    }
}

/// Issue state filter for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueStatusFilter {
    Open,
    Closed,
}

impl fmt::Display for IssueStatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueStatusFilter::Open => write!(f, "open"),
            IssueStatusFilter::Closed => write!(f, "closed"),
        }
    }
}

/// Pagination and filtering for issue listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IssueListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<IssueStatusFilter>,
}

impl IssueListQuery {
    fn to_query(self) -> QueryParams {
        let mut query = QueryParams::new();
        query.push_opt("page", self.page);
        query.push_opt("perPage", self.per_page);
        query.push_opt("status", self.status);
        query
    }
}

/// Patch state filter for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatusFilter {
    Draft,
    Open,
    Archived,
    Merged,
}

impl fmt::Display for PatchStatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchStatusFilter::Draft => write!(f, "draft"),
            PatchStatusFilter::Open => write!(f, "open"),
            PatchStatusFilter::Archived => write!(f, "archived"),
            PatchStatusFilter::Merged => write!(f, "merged"),
        }
    }
}

/// Pagination and filtering for patch listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub status: Option<PatchStatusFilter>,
}

impl PatchListQuery {
    fn to_query(self) -> QueryParams {
        let mut query = QueryParams::new();
        query.push_opt("page", self.page);
        query.push_opt("perPage", self.per_page);
        query.push_opt("status", self.status);
        query
    }
}

/// Window selection for commit history listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitsQuery {
    /// Only commits reachable from this commit.
    pub parent: Option<String>,
    pub since: Option<Timestamp>,
    pub until: Option<Timestamp>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl CommitsQuery {
    fn to_query(&self) -> QueryParams {
        let mut query = QueryParams::new();
        query.push_opt("parent", self.parent.as_deref());
        query.push_opt("since", self.since);
        query.push_opt("until", self.until);
        query.push_opt("page", self.page);
        query.push_opt("perPage", self.per_page);
        query
    }
}

/// Client for the `repos` resource family.
#[derive(Debug, Clone)]
pub struct RepoClient {
    fetcher: Fetcher,
}

impl RepoClient {
    pub(crate) fn new(fetcher: Fetcher) -> Self {
        RepoClient { fetcher }
    }

    async fn get<T>(&self, path: String, options: RequestOptions) -> Result<T, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        self.fetcher
            .fetch_ok(RequestSpec::new(Method::GET, path).with_options(options))
            .await
    }

    /// Lists repos seeded by this node.
    pub async fn get_all(
        &self,
        query: RepoListQuery,
        options: RequestOptions,
    ) -> Result<Vec<Repo>, Error> {
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::GET, "repos")
                    .with_query(query.to_query())
                    .with_options(options),
            )
            .await
    }

    /// Lists repos with the given delegate.
    pub async fn get_by_delegate(
        &self,
        did: &str,
        query: RepoListQuery,
        options: RequestOptions,
    ) -> Result<Vec<Repo>, Error> {
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::GET, format!("delegates/{did}/repos"))
                    .with_query(query.to_query())
                    .with_options(options),
            )
            .await
    }

    /// Fetches one repo by its id.
    pub async fn get_by_rid(&self, rid: &str, options: RequestOptions) -> Result<Repo, Error> {
        self.get(format!("repos/{rid}"), options).await
    }

    /// Fetches commit activity samples for a repo.
    pub async fn get_activity(
        &self,
        rid: &str,
        options: RequestOptions,
    ) -> Result<Activity, Error> {
        self.get(format!("repos/{rid}/activity"), options).await
    }

    /// Fetches the repo's README at the given commit, trying the usual
    /// file name variants.
    pub async fn get_readme(
        &self,
        rid: &str,
        sha: &str,
        options: RequestOptions,
    ) -> Result<Blob, Error> {
        self.get(format!("repos/{rid}/readme/{sha}"), options).await
    }

    /// Fetches one file's content at the given commit.
    pub async fn get_blob(
        &self,
        rid: &str,
        sha: &str,
        path: &str,
        options: RequestOptions,
    ) -> Result<Blob, Error> {
        self.get(format!("repos/{rid}/blob/{sha}/{path}"), options)
            .await
    }

    /// Lists a directory at the given commit. `path` `None` lists the
    /// repository root.
    pub async fn get_tree(
        &self,
        rid: &str,
        sha: &str,
        path: Option<&str>,
        options: RequestOptions,
    ) -> Result<Tree, Error> {
        let path = path.unwrap_or_default();
        self.get(format!("repos/{rid}/tree/{sha}/{path}"), options)
            .await
    }

    /// Fetches commit/branch/contributor counts at the given commit.
    pub async fn get_tree_stats_by_sha(
        &self,
        rid: &str,
        sha: &str,
        options: RequestOptions,
    ) -> Result<TreeStats, Error> {
        self.get(format!("repos/{rid}/stats/tree/{sha}"), options)
            .await
    }

    /// Lists the remotes tracked for a repo.
    pub async fn get_all_remotes(
        &self,
        rid: &str,
        options: RequestOptions,
    ) -> Result<Vec<Remote>, Error> {
        self.get(format!("repos/{rid}/remotes"), options).await
    }

    /// Fetches one remote by peer id.
    pub async fn get_remote_by_peer(
        &self,
        rid: &str,
        peer: &str,
        options: RequestOptions,
    ) -> Result<Remote, Error> {
        self.get(format!("repos/{rid}/remotes/{peer}"), options)
            .await
    }

    /// Lists commit history with optional window and pagination.
    pub async fn get_all_commits(
        &self,
        rid: &str,
        query: &CommitsQuery,
        options: RequestOptions,
    ) -> Result<Commits, Error> {
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::GET, format!("repos/{rid}/commits"))
                    .with_query(query.to_query())
                    .with_options(options),
            )
            .await
    }

    /// Fetches one commit with its full diff.
    pub async fn get_commit_by_sha(
        &self,
        rid: &str,
        sha: &str,
        options: RequestOptions,
    ) -> Result<Commit, Error> {
        self.get(format!("repos/{rid}/commits/{sha}"), options)
            .await
    }

    /// Fetches the diff between two commits.
    pub async fn get_diff(
        &self,
        rid: &str,
        base: &str,
        oid: &str,
        options: RequestOptions,
    ) -> Result<DiffResponse, Error> {
        self.get(format!("repos/{rid}/diff/{base}/{oid}"), options)
            .await
    }

    /// Fetches one issue with its discussion.
    pub async fn get_issue_by_id(
        &self,
        rid: &str,
        issue_id: &str,
        options: RequestOptions,
    ) -> Result<Issue, Error> {
        self.get(format!("repos/{rid}/issues/{issue_id}"), options)
            .await
    }

    /// Lists issues with optional state filter and pagination.
    pub async fn get_all_issues(
        &self,
        rid: &str,
        query: IssueListQuery,
        options: RequestOptions,
    ) -> Result<Vec<Issue>, Error> {
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::GET, format!("repos/{rid}/issues"))
                    .with_query(query.to_query())
                    .with_options(options),
            )
            .await
    }

    /// Opens a new issue.
    pub async fn create_issue(
        &self,
        rid: &str,
        issue: &NewIssue,
        session_id: &str,
        options: RequestOptions,
    ) -> Result<IssueCreated, Error> {
        debug!(rid, title = issue.title.as_str(), "creating issue");
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::POST, format!("repos/{rid}/issues"))
                    .with_bearer(session_id)
                    .with_json(issue)?
                    .with_options(options),
            )
            .await
    }

    /// Applies one mutation to an issue.
    pub async fn update_issue(
        &self,
        rid: &str,
        issue_id: &str,
        action: &IssueAction,
        session_id: &str,
        options: RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        debug!(rid, issue = issue_id, "updating issue");
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::PATCH, format!("repos/{rid}/issues/{issue_id}"))
                    .with_bearer(session_id)
                    .with_json(action)?
                    .with_options(options),
            )
            .await
    }

    /// Fetches one patch with its revisions and reviews.
    pub async fn get_patch_by_id(
        &self,
        rid: &str,
        patch_id: &str,
        options: RequestOptions,
    ) -> Result<Patch, Error> {
        self.get(format!("repos/{rid}/patches/{patch_id}"), options)
            .await
    }

    /// Lists patches with optional state filter and pagination.
    pub async fn get_all_patches(
        &self,
        rid: &str,
        query: PatchListQuery,
        options: RequestOptions,
    ) -> Result<Vec<Patch>, Error> {
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::GET, format!("repos/{rid}/patches"))
                    .with_query(query.to_query())
                    .with_options(options),
            )
            .await
    }

    /// Opens a new patch.
    pub async fn create_patch(
        &self,
        rid: &str,
        patch: &NewPatch,
        session_id: &str,
        options: RequestOptions,
    ) -> Result<PatchCreated, Error> {
        debug!(rid, title = patch.title.as_str(), "creating patch");
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::POST, format!("repos/{rid}/patches"))
                    .with_bearer(session_id)
                    .with_json(patch)?
                    .with_options(options),
            )
            .await
    }

    /// Applies one mutation to a patch.
    pub async fn update_patch(
        &self,
        rid: &str,
        patch_id: &str,
        action: &PatchAction,
        session_id: &str,
        options: RequestOptions,
    ) -> Result<SuccessResponse, Error> {
        debug!(rid, patch = patch_id, "updating patch");
        self.fetcher
            .fetch_ok(
                RequestSpec::new(Method::PATCH, format!("repos/{rid}/patches/{patch_id}"))
                    .with_bearer(session_id)
                    .with_json(action)?
                    .with_options(options),
            )
            .await
    }
}
