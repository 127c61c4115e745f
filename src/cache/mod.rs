// Cache module for the per-account statistics file.
// Loads, merges and saves per-repository records in a human-readable text format.

pub mod merge;
pub mod paths;
pub mod record;
pub mod store;

pub use merge::MergeSummary;
pub use paths::{cache_dir, default_cache_file};
pub use record::{CorruptLine, RepositoryRecord, fingerprint};
pub use store::{Cache, load, parse, render, save};
