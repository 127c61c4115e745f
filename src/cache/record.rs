// Cache record type.
// One line of the cache file: a repository and its collected commit statistics.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::stats::CommitStats;

/// Number of whitespace-separated fields in a record line.
pub const FIELD_COUNT: usize = 6;

/// One-way hash of a repository name, hex encoded.
pub fn fingerprint(name: &str) -> String {
    hex::encode(Sha256::digest(name.as_bytes()))
}

/// Why a cache line was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptLine {
    #[error("expected 6 fields, found {0}")]
    TooFewFields(usize),

    #[error("field `{field}` is not a non-negative integer: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("attributed commits ({attributed}) exceed total commits ({total})")]
    AttributionExceedsTotal { attributed: u64, total: u64 },
}

/// Cached statistics for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRecord {
    name: String,
    fingerprint: String,
    stats: CommitStats,
}

impl RepositoryRecord {
    /// Build a record, deriving the fingerprint from the name.
    pub fn new(name: impl Into<String>, stats: CommitStats) -> Self {
        let name = name.into();
        Self {
            fingerprint: fingerprint(&name),
            name,
            stats,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn stats(&self) -> &CommitStats {
        &self.stats
    }

    /// Whether the name survives the whitespace-separated line format.
    pub fn is_persistable(&self) -> bool {
        !self.name.is_empty() && !self.name.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for RepositoryRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.name,
            self.fingerprint,
            self.stats.total_commits,
            self.stats.attributed_commits,
            self.stats.lines_added,
            self.stats.lines_deleted
        )
    }
}

impl FromStr for RepositoryRecord {
    type Err = CorruptLine;

    /// Parse `name fingerprint total attributed added deleted`. Extra trailing fields are ignored.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < FIELD_COUNT {
            return Err(CorruptLine::TooFewFields(fields.len()));
        }

        let number = |field: &'static str, value: &str| {
            value.parse::<u64>().map_err(|_| CorruptLine::InvalidNumber {
                field,
                value: value.to_string(),
            })
        };
        let stats = CommitStats {
            total_commits: number("total_commits", fields[2])?,
            attributed_commits: number("attributed_commits", fields[3])?,
            lines_added: number("lines_added", fields[4])?,
            lines_deleted: number("lines_deleted", fields[5])?,
        };
        if stats.attributed_commits > stats.total_commits {
            return Err(CorruptLine::AttributionExceedsTotal {
                attributed: stats.attributed_commits,
                total: stats.total_commits,
            });
        }

        Ok(Self {
            name: fields[0].to_string(),
            fingerprint: fields[1].to_string(),
            stats,
        })
    }
}
