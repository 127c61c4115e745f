// Commit statistics collector.
// Walks one repository's commit history and sums per-commit diff stats.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::github::{
    CommitDetail, CommitSummary, Paginator, RepoRef, Transport, commits_endpoint,
};

/// Commit and line-change counts for one repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    pub total_commits: u64,
    /// Commits whose author is the tracked account. Never exceeds `total_commits`.
    pub attributed_commits: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

/// Produces statistics for a cache-miss repository. Never fails: unavailable
/// repositories yield zero-valued stats.
pub trait StatsSource: Send + Sync {
    fn collect(&self, repo: &RepoRef) -> impl Future<Output = CommitStats> + Send;
}

/// Collects stats from the commits API, one request per commit.
pub struct CommitStatsCollector<X> {
    transport: Arc<X>,
    config: Arc<Config>,
}

impl<X: Transport> CommitStatsCollector<X> {
    pub fn new(transport: Arc<X>, config: Arc<Config>) -> Self {
        Self { transport, config }
    }

    /// Collect stats, propagating a failed commit listing.
    ///
    /// A failed per-commit detail request only loses that commit's line counts.
    pub async fn try_collect(&self, repo: &RepoRef) -> Result<CommitStats> {
        let mut pages = Paginator::<_, CommitSummary>::new(
            self.transport.as_ref(),
            commits_endpoint(&self.config, repo),
        )
        .with_page_limit(self.config.max_commit_pages);

        let mut stats = CommitStats::default();
        while let Some(commits) = pages.next_page().await? {
            for commit in &commits {
                stats.total_commits += 1;
                if self.is_attributed(commit) {
                    stats.attributed_commits += 1;
                }
                match self.commit_lines(commit).await {
                    Ok((added, deleted)) => {
                        stats.lines_added += added;
                        stats.lines_deleted += deleted;
                    }
                    Err(e) => {
                        warn!(repo = %repo.full_name(), sha = %commit.sha, error = %e, "commit detail unavailable");
                    }
                }
            }
        }

        if pages.truncated() {
            warn!(
                repo = %repo.full_name(),
                pages = pages.pages_fetched(),
                "commit history truncated by page limit"
            );
        }
        Ok(stats)
    }

    fn is_attributed(&self, commit: &CommitSummary) -> bool {
        commit
            .author
            .as_ref()
            .is_some_and(|author| author.login.eq_ignore_ascii_case(&self.config.user))
    }

    async fn commit_lines(&self, commit: &CommitSummary) -> Result<(u64, u64)> {
        let detail: CommitDetail = self
            .transport
            .get(&commit.url)
            .await?
            .error_for_status()?
            .json()?;

        Ok(detail.files.iter().fold((0, 0), |(added, deleted), file| {
            (added + file.additions, deleted + file.deletions)
        }))
    }
}

impl<X: Transport> StatsSource for CommitStatsCollector<X> {
    async fn collect(&self, repo: &RepoRef) -> CommitStats {
        let started = Instant::now();
        match self.try_collect(repo).await {
            Ok(stats) => {
                info!(
                    repo = %repo.full_name(),
                    commits = stats.total_commits,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "collected commit stats"
                );
                stats
            }
            Err(e) => {
                match e.status() {
                    Some(404) => warn!(repo = %repo.full_name(), "repository not found"),
                    Some(409) => warn!(repo = %repo.full_name(), "repository is empty"),
                    _ => warn!(repo = %repo.full_name(), error = %e, "repository unavailable"),
                }
                debug!(repo = %repo.full_name(), "recording zero stats");
                CommitStats::default()
            }
        }
    }
}
