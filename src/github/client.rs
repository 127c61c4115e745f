// GitHub API HTTP client.
// Handles authentication, timeouts, rate limit tracking and response decoding.

use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use reqwest::{
    Client, Response,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, RETRY_AFTER, USER_AGENT},
};
use tracing::debug;

use crate::config::Config;
use crate::error::{Result, StatsError};

use super::transport::{ApiResponse, Transport, parse_next_link};
use super::types::RateLimit;

const GITHUB_API_VERSION: &str = "2022-11-28";

/// GitHub API client with authentication and rate limit tracking.
pub struct GitHubClient {
    client: Client,
    rate_limit: Mutex<RateLimit>,
}

impl GitHubClient {
    /// Create a new GitHub client with the given token and per-request timeout.
    pub fn new(token: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();

        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| StatsError::Other(e.to_string()))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("ghstats"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(StatsError::Api)?;

        Ok(Self {
            client,
            rate_limit: Mutex::new(RateLimit::default()),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.token, config.request_timeout)
    }

    /// Most recent rate limit information seen in a response.
    pub fn rate_limit(&self) -> RateLimit {
        self.rate_limit
            .lock()
            .map(|rl| rl.clone())
            .unwrap_or_default()
    }

    /// Update rate limit from response headers.
    fn update_rate_limit(&self, headers: &HeaderMap) {
        let Ok(mut rate_limit) = self.rate_limit.lock() else {
            return;
        };
        if let Some(limit) = header_u64(headers, "x-ratelimit-limit") {
            rate_limit.limit = limit;
        }
        if let Some(remaining) = header_u64(headers, "x-ratelimit-remaining") {
            rate_limit.remaining = remaining;
        }
        if let Some(reset) = header_u64(headers, "x-ratelimit-reset") {
            rate_limit.reset = reset;
        }
    }

    /// Read the whole response into an [`ApiResponse`].
    async fn read(&self, response: Response) -> Result<ApiResponse> {
        let headers = response.headers().clone();
        self.update_rate_limit(&headers);

        let status = response.status().as_u16();
        let next_link = headers
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_next_link);
        let retry_after = retry_hint(&headers, Utc::now().timestamp());
        let body = response.text().await?;

        debug!(status, has_next = next_link.is_some(), "response received");
        Ok(ApiResponse {
            status,
            next_link,
            retry_after,
            body,
        })
    }
}

impl Transport for GitHubClient {
    async fn get(&self, url: &str) -> Result<ApiResponse> {
        debug!(url, "GET");
        let response = self.client.get(url).send().await?;
        self.read(response).await
    }

    async fn post_json(&self, url: &str, body: &serde_json::Value) -> Result<ApiResponse> {
        debug!(url, "POST");
        let response = self.client.post(url).json(body).send().await?;
        self.read(response).await
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Wait hint derived from `retry-after`, or from an exhausted primary rate limit.
fn retry_hint(headers: &HeaderMap, now: i64) -> Option<Duration> {
    if let Some(secs) = header_u64(headers, RETRY_AFTER.as_str()) {
        return Some(Duration::from_secs(secs));
    }
    if header_u64(headers, "x-ratelimit-remaining") == Some(0) {
        let reset = header_u64(headers, "x-ratelimit-reset")?;
        let now = u64::try_from(now).unwrap_or(0);
        return Some(Duration::from_secs(reset.saturating_sub(now)));
    }
    None
}
