//! Incremental GitHub contribution statistics.
//!
//! Enumerates an account's repositories, collects per-repository commit and line-change
//! counts for repositories not yet in the local cache, persists the cache as plain text,
//! and aggregates it into account-level totals.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod github;
pub mod logging;
pub mod report;
pub mod run;
pub mod stats;

pub use config::Config;
pub use error::{Result, StatsError};
pub use run::{RunOutcome, run, run_with};
