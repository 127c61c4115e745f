// Command-line interface.
// Flags with environment fallbacks, turned into a `Config` once at startup.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::{Config, DEFAULT_API_BASE, RepoSource};
use crate::error::Result;
use crate::github::RetryPolicy;

#[derive(Parser, Debug)]
#[command(
    name = "ghstats",
    version,
    about = "Collect GitHub contribution statistics into an incremental cache and report totals"
)]
pub struct Cli {
    #[arg(long, env = "ACCESS_TOKEN", hide_env_values = true, value_name = "TOKEN", help = "GitHub access token")]
    pub token: String,

    #[arg(long, env = "USER_NAME", value_name = "LOGIN", help = "Account to collect statistics for")]
    pub user: String,

    #[arg(long, value_name = "PATH", help = "Cache file (defaults to the platform cache directory)")]
    pub cache_file: Option<PathBuf>,

    #[arg(long, default_value = DEFAULT_API_BASE, value_name = "URL", help = "GitHub API base URL")]
    pub api_base: String,

    #[arg(long, value_enum, default_value_t = RepoSource::Rest, help = "API used to enumerate repositories")]
    pub repo_source: RepoSource,

    #[arg(long, default_value_t = 4, value_name = "N", help = "Repositories collected concurrently")]
    pub concurrency: usize,

    #[arg(
        long,
        default_value_t = 100,
        value_parser = clap::value_parser!(u32).range(1..=100),
        value_name = "N",
        help = "Items requested per page"
    )]
    pub per_page: u32,

    #[arg(long, value_name = "N", help = "Commit pages read per repository (default: all)")]
    pub max_commit_pages: Option<usize>,

    #[arg(long, default_value_t = 30, value_name = "SECS", help = "Per-request timeout")]
    pub timeout_secs: u64,

    #[arg(long, default_value_t = 3, value_name = "N", help = "Retries for rate-limited or failed requests")]
    pub max_retries: u32,

    #[arg(long = "refresh", value_name = "NAME", help = "Re-collect a cached repository (repeatable)")]
    pub refresh: Vec<String>,

    #[arg(short, long, value_name = "PATH", help = "Write the report to PATH instead of stdout")]
    pub output: Option<PathBuf>,

    #[arg(short, long, help = "Verbose logging")]
    pub verbose: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<Config> {
        let mut config = Config::new(self.token, self.user)?;
        if let Some(cache_file) = self.cache_file {
            config.cache_file = cache_file;
        }
        config.api_base = self.api_base;
        config.repo_source = self.repo_source;
        config.concurrency = self.concurrency.max(1);
        config.per_page = self.per_page;
        config.max_commit_pages = self.max_commit_pages;
        config.request_timeout = Duration::from_secs(self.timeout_secs);
        config.retry = RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        };
        config.refresh = self.refresh;
        config.output = self.output;
        Ok(config)
    }
}
