// GitHub API module.
// Provides the HTTP transport, pagination, retry policy and response types.

pub mod client;
pub mod endpoints;
pub mod pagination;
pub mod retry;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::GitHubClient;
pub use endpoints::{commits_endpoint, fetch_account_snapshot, list_repositories};
pub use pagination::{Endpoint, Paginator};
pub use retry::{RetryPolicy, Retrying};
pub use transport::{ApiResponse, Transport, parse_next_link};
pub use types::*;
