// Transport abstraction over the GitHub HTTP surface.
// Lets pagination, retries and collectors run against the real client or a scripted double.

use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;

use crate::error::{Result, StatsError};

/// A fully-read HTTP response, reduced to what the pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Target of the `rel="next"` relation in the `Link` header.
    pub next_link: Option<String>,
    /// How long the server asked us to wait before retrying, if it said so.
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            next_link: None,
            retry_after: None,
            body: body.into(),
        }
    }

    pub fn with_next_link(mut self, url: impl Into<String>) -> Self {
        self.next_link = Some(url.into());
        self
    }

    pub fn with_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Convert a non-2xx response into `RemoteRequestFailed`.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(StatsError::RemoteRequestFailed {
                status: self.status,
                body: self.body,
            })
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Issues requests against the remote API.
///
/// Implementations must not retry on their own; see [`super::retry::Retrying`].
pub trait Transport: Send + Sync {
    fn get(&self, url: &str) -> impl Future<Output = Result<ApiResponse>> + Send;

    fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> impl Future<Output = Result<ApiResponse>> + Send;
}

/// Extract the `rel="next"` URL from a `Link` header value.
pub fn parse_next_link(header: &str) -> Option<String> {
    header.split(',').find_map(|part| {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let is_next = segments.any(|param| {
            let param = param.trim();
            param == "rel=\"next\"" || param == "rel=next"
        });
        if !is_next {
            return None;
        }
        target
            .strip_prefix('<')
            .and_then(|t| t.strip_suffix('>'))
            .map(str::to_string)
    })
}
