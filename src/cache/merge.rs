// Incremental merge of freshly collected stats into the cache.
// Only cache misses are collected, concurrently and bounded; the cache itself is only
// touched from the coordinating task.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Result, StatsError};
use crate::github::RepoRef;
use crate::stats::{CommitStats, StatsSource};

use super::record::RepositoryRecord;
use super::store::Cache;

/// What a merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Repositories already cached and kept verbatim.
    pub reused: usize,
    /// Repositories collected and inserted.
    pub fetched: usize,
    /// Repeated names in the repository list.
    pub duplicates: usize,
    /// Collections that did not finish (task panicked or run cancelled).
    pub incomplete: usize,
}

impl Cache {
    /// Collect stats for every repository not yet cached and append them.
    ///
    /// Existing records are never refreshed. New records are appended in
    /// `repositories` order regardless of completion order. On cancellation the
    /// finished collections are still inserted before `Cancelled` is returned.
    pub async fn merge<S>(
        &mut self,
        repositories: &[RepoRef],
        source: Arc<S>,
        concurrency: usize,
        cancel: &CancellationToken,
    ) -> Result<MergeSummary>
    where
        S: StatsSource + 'static,
    {
        let mut summary = MergeSummary::default();
        let mut pending = HashSet::new();
        let mut misses = Vec::new();
        for repo in repositories {
            if self.contains(&repo.name) {
                debug!(repo = %repo.name, "already cached, skipping");
                summary.reused += 1;
            } else if !pending.insert(repo.name.as_str()) {
                summary.duplicates += 1;
            } else {
                misses.push(repo.clone());
            }
        }
        info!(
            cached = summary.reused,
            to_fetch = misses.len(),
            "merging repositories into cache"
        );

        let mut results: Vec<Option<CommitStats>> = vec![None; misses.len()];
        let mut queue = misses.iter().cloned().enumerate();
        let mut tasks = JoinSet::new();
        let limit = concurrency.max(1);
        let mut cancelled = false;

        loop {
            while tasks.len() < limit {
                let Some((slot, repo)) = queue.next() else {
                    break;
                };
                let source = Arc::clone(&source);
                tasks.spawn(async move { (slot, source.collect(&repo).await) });
            }
            if tasks.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    // Keep collections that finished before the cancel was observed.
                    while let Some(joined) = tasks.try_join_next() {
                        if let Ok((slot, stats)) = joined {
                            results[slot] = Some(stats);
                        }
                    }
                    warn!(in_flight = tasks.len(), "merge cancelled, aborting collectors");
                    tasks.abort_all();
                    cancelled = true;
                    break;
                }
                joined = tasks.join_next() => match joined {
                    Some(Ok((slot, stats))) => results[slot] = Some(stats),
                    Some(Err(e)) => warn!(error = %e, "collector task failed"),
                    None => break,
                },
            }
        }

        for (repo, stats) in misses.iter().zip(results) {
            match stats {
                Some(stats) => {
                    self.insert(RepositoryRecord::new(repo.name.clone(), stats));
                    summary.fetched += 1;
                }
                None => summary.incomplete += 1,
            }
        }

        if cancelled {
            return Err(StatsError::Cancelled);
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Returns stats derived from the name length and records every call.
    #[derive(Default)]
    struct CountingSource {
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl CountingSource {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl StatsSource for CountingSource {
        async fn collect(&self, repo: &RepoRef) -> CommitStats {
            self.calls.lock().unwrap().push(repo.name.clone());
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            // Longer names finish first so completion order differs from list order.
            let wait = 30u64.saturating_sub(repo.name.len() as u64 * 5);
            tokio::time::sleep(Duration::from_millis(wait)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            let n = repo.name.len() as u64;
            CommitStats {
                total_commits: n,
                attributed_commits: n,
                lines_added: n * 10,
                lines_deleted: n,
            }
        }
    }

    /// Never completes.
    struct StalledSource;

    impl StatsSource for StalledSource {
        async fn collect(&self, _repo: &RepoRef) -> CommitStats {
            std::future::pending::<()>().await;
            CommitStats::default()
        }
    }

    /// Finishes "trigger" after cancelling the token; "slow" never finishes.
    struct CancellingSource {
        cancel: CancellationToken,
    }

    impl StatsSource for CancellingSource {
        async fn collect(&self, repo: &RepoRef) -> CommitStats {
            match repo.name.as_str() {
                "slow" => std::future::pending::<()>().await,
                "trigger" => self.cancel.cancel(),
                _ => {}
            }
            CommitStats {
                total_commits: 1,
                ..CommitStats::default()
            }
        }
    }

    fn repos(names: &[&str]) -> Vec<RepoRef> {
        names.iter().map(|n| RepoRef::new("octo", *n)).collect()
    }

    fn cached(names: &[&str]) -> Cache {
        let mut cache = Cache::new();
        for name in names {
            cache.insert(RepositoryRecord::new(*name, CommitStats::default()));
        }
        cache
    }

    #[tokio::test]
    async fn test_only_cache_misses_are_fetched() {
        let mut cache = cached(&["a", "ccc"]);
        let source = Arc::new(CountingSource::default());

        let summary = cache
            .merge(
                &repos(&["a", "bb", "ccc", "dddd"]),
                Arc::clone(&source),
                4,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let mut calls = source.calls();
        calls.sort();
        assert_eq!(calls, vec!["bb", "dddd"]);
        assert_eq!(summary.reused, 2);
        assert_eq!(summary.fetched, 2);
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get("a").unwrap().stats(), &CommitStats::default());
        assert_eq!(cache.get("dddd").unwrap().stats().lines_added, 40);
    }

    #[tokio::test]
    async fn test_second_merge_fetches_nothing() {
        let mut cache = Cache::new();
        let list = repos(&["a", "bb"]);
        let first = Arc::new(CountingSource::default());
        cache
            .merge(&list, first, 2, &CancellationToken::new())
            .await
            .unwrap();

        let second = Arc::new(CountingSource::default());
        let summary = cache
            .merge(&list, Arc::clone(&second), 2, &CancellationToken::new())
            .await
            .unwrap();
        assert!(second.calls().is_empty());
        assert_eq!(summary.reused, 2);
    }

    #[tokio::test]
    async fn test_insertion_follows_list_order() {
        let mut cache = cached(&["seed"]);
        let source = Arc::new(CountingSource::default());
        cache
            .merge(
                &repos(&["a", "bb", "ccc", "dddd", "eeeee"]),
                source,
                5,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        let names: Vec<&str> = cache.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["seed", "a", "bb", "ccc", "dddd", "eeeee"]);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut cache = Cache::new();
        let source = Arc::new(CountingSource::default());
        cache
            .merge(
                &repos(&["a", "b", "c", "d", "e", "f", "g"]),
                Arc::clone(&source),
                2,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(source.calls().len(), 7);
        assert!(source.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_duplicate_names_fetched_once() {
        let mut cache = Cache::new();
        let source = Arc::new(CountingSource::default());
        let summary = cache
            .merge(
                &repos(&["a", "a", "bb"]),
                Arc::clone(&source),
                4,
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(source.calls().len(), 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_cancellation_aborts_and_reports() {
        let mut cache = cached(&["kept"]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = cache
            .merge(&repos(&["x", "y"]), Arc::new(StalledSource), 2, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, StatsError::Cancelled));
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("kept"));
    }

    #[tokio::test]
    async fn test_cancel_mid_merge_keeps_finished_collections() {
        let mut cache = Cache::new();
        let cancel = CancellationToken::new();
        let source = Arc::new(CancellingSource {
            cancel: cancel.clone(),
        });

        let err = cache
            .merge(&repos(&["a", "trigger", "slow"]), source, 3, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, StatsError::Cancelled));
        let names: Vec<&str> = cache.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["a", "trigger"]);
        assert_eq!(cache.get("trigger").unwrap().stats().total_commits, 1);
        assert!(!cache.contains("slow"));
    }
}
