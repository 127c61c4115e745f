// Run configuration.
// Built once at startup and passed by reference to every component.

use std::path::PathBuf;
use std::time::Duration;

use clap::ValueEnum;

use crate::cache;
use crate::error::{Result, StatsError};
use crate::github::RetryPolicy;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Which API surface enumerates the account's repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RepoSource {
    /// REST `/users/{login}/repos`, Link-header paging.
    #[default]
    Rest,
    /// GraphQL `user.repositories`, cursor paging, includes collaborator and org repos.
    Graphql,
}

/// Immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    /// Login of the tracked account.
    pub user: String,
    pub api_base: String,
    pub cache_file: PathBuf,
    pub repo_source: RepoSource,
    /// Upper bound on repositories collected at the same time.
    pub concurrency: usize,
    pub per_page: u32,
    /// Pages of commit history to read per repository; `None` reads all of them.
    pub max_commit_pages: Option<usize>,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Cached repositories to drop and collect again.
    pub refresh: Vec<String>,
    pub output: Option<PathBuf>,
}

impl Config {
    /// Create a configuration with defaults for everything but the credentials.
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> Result<Self> {
        let token = token.into();
        let user = user.into();
        if token.trim().is_empty() {
            return Err(StatsError::MissingToken);
        }
        if user.trim().is_empty() {
            return Err(StatsError::MissingUser);
        }

        Ok(Self {
            cache_file: cache::default_cache_file(&user),
            token,
            user,
            api_base: DEFAULT_API_BASE.to_string(),
            repo_source: RepoSource::default(),
            concurrency: 4,
            per_page: 100,
            max_commit_pages: None,
            request_timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            refresh: Vec::new(),
            output: None,
        })
    }

    /// Absolute URL for a REST path such as `/users/octo/repos`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), path)
    }

    pub fn graphql_url(&self) -> String {
        self.api_url("/graphql")
    }
}
