// Cache path utilities.
// Locates the per-account cache file under the platform cache directory.

use std::path::PathBuf;

use directories::ProjectDirs;

use super::record::fingerprint;

/// Get the base cache directory (~/.cache/ghstats on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ghstats").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Cache file for an account, named by the fingerprint of its login.
///
/// Falls back to `./cache/` when the platform has no cache directory.
pub fn default_cache_file(login: &str) -> PathBuf {
    let file_name = format!("{}.txt", fingerprint(login));
    cache_dir()
        .unwrap_or_else(|| PathBuf::from("cache"))
        .join(file_name)
}
