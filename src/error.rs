// Error types for ghstats.
// Separates fatal remote failures from the conditions the pipeline recovers from locally.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Remote request failed with HTTP {status}: {body}")]
    RemoteRequestFailed { status: u16, body: String },

    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Query returned errors: {0}")]
    Query(String),

    #[error("Missing access token (set ACCESS_TOKEN or pass --token)")]
    MissingToken,

    #[error("Missing target account (set USER_NAME or pass --user)")]
    MissingUser,

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Run cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl StatsError {
    /// HTTP status carried by a remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            StatsError::RemoteRequestFailed { status, .. } => Some(*status),
            StatsError::Api(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
