// Account-level aggregation over the cache.

use serde::Serialize;

use crate::cache::Cache;
use crate::github::RepoRef;

/// Totals reported for the account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub repo_count: usize,
    /// Repositories with at least one commit by the tracked account.
    pub contributed_to_count: usize,
    pub total_commits: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
}

impl Totals {
    pub fn net_lines(&self) -> i128 {
        i128::from(self.lines_added) - i128::from(self.lines_deleted)
    }
}

/// Reduce every cached record into account totals. Pure and order-independent.
pub fn aggregate(cache: &Cache) -> Totals {
    cache.iter().fold(Totals::default(), |mut totals, record| {
        let stats = record.stats();
        totals.repo_count += 1;
        if stats.attributed_commits > 0 {
            totals.contributed_to_count += 1;
        }
        totals.total_commits = totals.total_commits.saturating_add(stats.total_commits);
        totals.lines_added = totals.lines_added.saturating_add(stats.lines_added);
        totals.lines_deleted = totals.lines_deleted.saturating_add(stats.lines_deleted);
        totals
    })
}

/// Commits across all branches of the listed repositories, if the listing reported them.
pub fn branch_commit_total(repositories: &[RepoRef]) -> Option<u64> {
    repositories
        .iter()
        .filter_map(|repo| repo.branch_commits)
        .fold(None, |sum, commits| {
            Some(sum.unwrap_or(0u64).saturating_add(commits))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{self, RepositoryRecord};
    use crate::stats::CommitStats;

    fn stats(total: u64, attributed: u64, added: u64, deleted: u64) -> CommitStats {
        CommitStats {
            total_commits: total,
            attributed_commits: attributed,
            lines_added: added,
            lines_deleted: deleted,
        }
    }

    #[test]
    fn test_empty_cache() {
        assert_eq!(aggregate(&Cache::new()), Totals::default());
    }

    #[test]
    fn test_two_record_scenario() {
        let cache = cache::parse("alpha h1 10 10 100 20\nbeta h2 0 0 0 0\n");
        let totals = aggregate(&cache);
        assert_eq!(
            totals,
            Totals {
                repo_count: 2,
                contributed_to_count: 1,
                total_commits: 10,
                lines_added: 100,
                lines_deleted: 20,
            }
        );
        assert_eq!(totals.net_lines(), 80);
    }

    #[test]
    fn test_order_independent() {
        let records = vec![
            RepositoryRecord::new("a", stats(3, 1, 10, 4)),
            RepositoryRecord::new("b", stats(7, 0, 2, 9)),
            RepositoryRecord::new("c", stats(1, 1, 0, 0)),
        ];

        let mut forward = Cache::new();
        for record in records.iter().cloned() {
            forward.insert(record);
        }
        let mut backward = Cache::new();
        for record in records.into_iter().rev() {
            backward.insert(record);
        }

        assert_eq!(aggregate(&forward), aggregate(&backward));
    }

    #[test]
    fn test_contributed_never_exceeds_repo_count() {
        let mut cache = Cache::new();
        for (i, attributed) in [0, 2, 5, 0, 1].into_iter().enumerate() {
            cache.insert(RepositoryRecord::new(format!("r{i}"), stats(5, attributed, 1, 1)));
        }
        let totals = aggregate(&cache);
        assert_eq!(totals.contributed_to_count, 3);
        assert!(totals.contributed_to_count <= totals.repo_count);
        assert_eq!(totals.total_commits, 25);
    }

    #[test]
    fn test_sums_saturate_instead_of_overflowing() {
        let cache = cache::parse(
            "a h 5 1 18446744073709551615 7\nb h 18446744073709551615 0 1 18446744073709551615\n",
        );
        let totals = aggregate(&cache);
        assert_eq!(totals.repo_count, 2);
        assert_eq!(totals.lines_added, u64::MAX);
        assert_eq!(totals.lines_deleted, u64::MAX);
        assert_eq!(totals.total_commits, u64::MAX);
    }

    #[test]
    fn test_branch_commit_total() {
        assert_eq!(branch_commit_total(&[]), None);
        assert_eq!(
            branch_commit_total(&[RepoRef::new("octo", "rest-only")]),
            None
        );
        assert_eq!(
            branch_commit_total(&[
                RepoRef::new("octo", "a").with_branch_commits(12),
                RepoRef::new("octo", "b"),
                RepoRef::new("octo", "c").with_branch_commits(0),
                RepoRef::new("octo", "d").with_branch_commits(30),
            ]),
            Some(42)
        );
    }
}
