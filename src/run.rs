// End-to-end run.
// Snapshot, enumerate, merge into the cache, persist, aggregate, report.

use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::{self, MergeSummary};
use crate::config::Config;
use crate::error::Result;
use crate::github::{
    AccountSnapshot, GitHubClient, Retrying, Transport, fetch_account_snapshot, list_repositories,
};
use crate::report::render_report;
use crate::stats::{CommitStatsCollector, Totals, aggregate, branch_commit_total};

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub snapshot: AccountSnapshot,
    pub merge: MergeSummary,
    pub totals: Totals,
    /// Commits across all branches, when the repository listing reports them.
    pub branch_commits: Option<u64>,
    pub report: String,
}

/// Run against the real API, retrying per the configured policy.
pub async fn run(config: Arc<Config>, cancel: CancellationToken) -> Result<RunOutcome> {
    let client = GitHubClient::from_config(&config)?;
    let transport = Arc::new(Retrying::new(client, config.retry));

    let outcome = run_with(Arc::clone(&transport), config, cancel).await?;

    let rate_limit = transport.inner().rate_limit();
    info!(
        remaining = rate_limit.remaining,
        limit = rate_limit.limit,
        "rate limit after run"
    );
    Ok(outcome)
}

/// Run the pipeline over any transport.
///
/// The cache is saved even when the merge is cancelled, so finished collections survive.
/// Records evicted for refresh that were not re-collected are restored before saving.
pub async fn run_with<X>(
    transport: Arc<X>,
    config: Arc<Config>,
    cancel: CancellationToken,
) -> Result<RunOutcome>
where
    X: Transport + 'static,
{
    let snapshot = fetch_account_snapshot(transport.as_ref(), &config).await?;
    let repositories = list_repositories(transport.as_ref(), &config).await?;
    info!(user = %config.user, repositories = repositories.len(), "repositories enumerated");

    let mut cache = cache::load(&config.cache_file)?;
    let mut evicted = Vec::new();
    for name in &config.refresh {
        if let Some(record) = cache.evict(name) {
            info!(repo = %name, "evicted for refresh");
            evicted.push(record);
        } else {
            warn!(repo = %name, "refresh requested for repository not in cache");
        }
    }

    let collector = Arc::new(CommitStatsCollector::new(
        Arc::clone(&transport),
        Arc::clone(&config),
    ));
    let merged = cache
        .merge(&repositories, collector, config.concurrency, &cancel)
        .await;
    for record in evicted {
        let name = record.name().to_string();
        if cache.insert(record) {
            warn!(repo = %name, "refresh not collected, keeping previous record");
        }
    }
    cache::save(&cache, &config.cache_file)?;
    let merge = merged?;

    let totals = aggregate(&cache);
    info!(
        repos = totals.repo_count,
        contributed = totals.contributed_to_count,
        commits = totals.total_commits,
        fetched = merge.fetched,
        "aggregation complete"
    );

    let branch_commits = branch_commit_total(&repositories);
    let report = render_report(&snapshot, &totals, branch_commits, Utc::now());
    if let Some(path) = &config.output {
        cache::store::write_text(path, &report)?;
        info!(path = %path.display(), "report written");
    }

    Ok(RunOutcome {
        snapshot,
        merge,
        totals,
        branch_commits,
        report,
    })
}
