// GitHub API response types.
// Defines structs for deserializing REST and GraphQL responses used by the stats pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GitHub user or organization, as embedded in repository and commit payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// Repository as returned by the REST listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub owner: Owner,
}

/// Repository node from the GraphQL `repositories` connection.
#[derive(Debug, Clone, Deserialize)]
pub struct RepositoryNode {
    pub name: String,
    pub owner: Owner,
    #[serde(default)]
    pub refs: Option<RefConnection>,
}

impl RepositoryNode {
    /// Sum of commit history lengths over every branch head.
    ///
    /// Commits shared between branches are counted once per branch.
    pub fn branch_commits(&self) -> Option<u64> {
        self.refs.as_ref().map(|refs| {
            refs.nodes
                .iter()
                .filter_map(|r| r.target.as_ref()?.history.as_ref())
                .fold(0u64, |sum, history| sum.saturating_add(history.total_count))
        })
    }
}

/// Branch heads of a repository.
#[derive(Debug, Clone, Deserialize)]
pub struct RefConnection {
    #[serde(default)]
    pub nodes: Vec<RefNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefNode {
    pub target: Option<RefTarget>,
}

/// Object a branch points at; `history` is only present for commits.
#[derive(Debug, Clone, Deserialize)]
pub struct RefTarget {
    pub history: Option<TotalCount>,
}

/// Owner/name pair identifying a repository to collect stats for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
    /// Commits across all branches, when the listing reported them.
    pub branch_commits: Option<u64>,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            branch_commits: None,
        }
    }

    pub fn with_branch_commits(mut self, commits: u64) -> Self {
        self.branch_commits = Some(commits);
        self
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl From<Repository> for RepoRef {
    fn from(repo: Repository) -> Self {
        Self::new(repo.owner.login, repo.name)
    }
}

impl From<RepositoryNode> for RepoRef {
    fn from(node: RepositoryNode) -> Self {
        let branch_commits = node.branch_commits();
        Self {
            owner: node.owner.login,
            name: node.name,
            branch_commits,
        }
    }
}

/// Entry of the `/repos/{owner}/{repo}/commits` listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
    /// API URL of the commit detail record.
    pub url: String,
    /// Linked GitHub account; absent when the author email is not tied to an account.
    pub author: Option<Owner>,
}

/// Per-commit detail record, carrying per-file diff stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub files: Vec<FileStat>,
}

/// Diff stats for one file of a commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStat {
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
}

/// GraphQL `pageInfo` block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

/// GraphQL connection: a page of nodes plus its continuation info.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<T>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: u64,
}

/// Raw account node returned by the snapshot query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AccountNode {
    pub created_at: DateTime<Utc>,
    pub followers: TotalCount,
    pub repositories: TotalCount,
    pub starred_repositories: TotalCount,
    pub merged_pull_requests: TotalCount,
    pub open_pull_requests: TotalCount,
    pub closed_issues: TotalCount,
    pub open_issues: TotalCount,
}

/// Live account-level counters, fetched fresh every run and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    pub created_at: DateTime<Utc>,
    pub followers: u64,
    pub public_repo_count: u64,
    pub starred_count: u64,
    pub merged_pr_count: u64,
    pub open_pr_count: u64,
    pub closed_issue_count: u64,
    pub open_issue_count: u64,
}

impl From<AccountNode> for AccountSnapshot {
    fn from(node: AccountNode) -> Self {
        Self {
            created_at: node.created_at,
            followers: node.followers.total_count,
            public_repo_count: node.repositories.total_count,
            starred_count: node.starred_repositories.total_count,
            merged_pr_count: node.merged_pull_requests.total_count,
            open_pr_count: node.open_pull_requests.total_count,
            closed_issue_count: node.closed_issues.total_count,
            open_issue_count: node.open_issues.total_count,
        }
    }
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}
