// Statistics module.
// Per-repository commit collection and account-level aggregation.

pub mod aggregate;
pub mod collector;

pub use aggregate::{Totals, aggregate, branch_commit_total};
pub use collector::{CommitStats, CommitStatsCollector, StatsSource};
