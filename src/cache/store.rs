// Cache store for reading and writing the per-account statistics file.
// Handles the plain-text format, tolerant loading, and atomic filesystem writes.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::{debug, info, warn};

use crate::error::Result;

use super::record::RepositoryRecord;

/// Free-text first line of the cache file.
pub const DESCRIPTION: &str =
    "This is a cache of all of the repositories I own, have contributed to, or am a member of.";

/// Column header line.
pub const COLUMNS: &str =
    "repository  fingerprint  total commits  my commits  LOC added by me  LOC deleted by me";

/// Separator line; marks the end of the header block.
pub const SEPARATOR: &str =
    "__________|__________|__________|__________|__________|__________";

/// Per-repository statistics keyed by repository name, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cache {
    records: Vec<RepositoryRecord>,
    index: HashMap<String, usize>,
}

impl Cache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&RepositoryRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryRecord> {
        self.records.iter()
    }

    /// Append a record. An existing record with the same name is kept and `false` returned.
    pub fn insert(&mut self, record: RepositoryRecord) -> bool {
        if self.contains(record.name()) {
            return false;
        }
        self.index
            .insert(record.name().to_string(), self.records.len());
        self.records.push(record);
        true
    }

    /// Remove a record so the next merge collects it again.
    pub fn evict(&mut self, name: &str) -> Option<RepositoryRecord> {
        let position = self.index.remove(name)?;
        let record = self.records.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(record)
    }
}

impl<'a> IntoIterator for &'a Cache {
    type Item = &'a RepositoryRecord;
    type IntoIter = std::slice::Iter<'a, RepositoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// True for a line made only of `_` and `|`, as written by every known writer version.
fn is_separator(line: &str) -> bool {
    let line = line.trim();
    line.contains('_') && line.chars().all(|c| c == '_' || c == '|')
}

/// Parse cache file contents, dropping malformed lines.
///
/// Records start after the separator line. Without one, every line is tried and header
/// text falls out as malformed.
pub fn parse(contents: &str) -> Cache {
    let lines: Vec<&str> = contents.lines().collect();
    let start = lines
        .iter()
        .position(|line| is_separator(line))
        .map_or(0, |i| i + 1);

    let mut cache = Cache::new();
    for (offset, line) in lines[start..].iter().enumerate() {
        let line_number = start + offset + 1;
        if line.trim().is_empty() {
            continue;
        }
        match line.parse::<RepositoryRecord>() {
            Ok(record) => {
                let name = record.name().to_string();
                if !cache.insert(record) {
                    warn!(line = line_number, repo = %name, "duplicate cache entry, keeping first");
                }
            }
            Err(reason) => {
                warn!(line = line_number, %reason, "skipping malformed cache line");
            }
        }
    }
    cache
}

/// Render the full file: header block, then one line per record.
pub fn render(cache: &Cache) -> String {
    let mut out = String::new();
    out.push_str(DESCRIPTION);
    out.push_str("\n\n");
    out.push_str(COLUMNS);
    out.push('\n');
    out.push_str(SEPARATOR);
    out.push('\n');

    for record in cache {
        if !record.is_persistable() {
            warn!(repo = %record.name(), "repository name contains whitespace, not persisted");
            continue;
        }
        out.push_str(&record.to_string());
        out.push('\n');
    }
    out
}

/// Load the cache. A missing file is an empty cache.
pub fn load(path: &Path) -> Result<Cache> {
    let Some(contents) = read_text(path)? else {
        info!(path = %path.display(), "no cache file, starting empty");
        return Ok(Cache::new());
    };
    let cache = parse(&contents);
    debug!(path = %path.display(), records = cache.len(), "cache loaded");
    Ok(cache)
}

/// Persist the whole cache.
pub fn save(cache: &Cache, path: &Path) -> Result<()> {
    write_text(path, &render(cache))?;
    debug!(path = %path.display(), records = cache.len(), "cache saved");
    Ok(())
}

/// Write text atomically via a temp file, creating parent directories.
pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp_path = path.with_extension("tmp");
    let mut file = fs::File::create(&temp_path)?;
    file.write_all(text.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Read a text file, or `None` if it does not exist.
pub fn read_text(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::CommitStats;
    use tempfile::TempDir;

    fn record(name: &str, total: u64, attributed: u64, added: u64, deleted: u64) -> RepositoryRecord {
        RepositoryRecord::new(
            name,
            CommitStats {
                total_commits: total,
                attributed_commits: attributed,
                lines_added: added,
                lines_deleted: deleted,
            },
        )
    }

    fn sample() -> Cache {
        let mut cache = Cache::new();
        cache.insert(record("alpha", 10, 10, 100, 20));
        cache.insert(record("beta", 0, 0, 0, 0));
        cache.insert(record("gamma.rs", 5, 3, 7, 9));
        cache
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let cache = load(&temp_dir.path().join("absent.txt")).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("cache.txt");

        let cache = sample();
        save(&cache, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded, cache);
        let names: Vec<&str> = loaded.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["alpha", "beta", "gamma.rs"]);

        let first = fs::read_to_string(&path).unwrap();
        save(&loaded, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
    }

    #[test]
    fn test_header_layout() {
        let text = render(&Cache::new());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![DESCRIPTION, "", COLUMNS, SEPARATOR]);
    }

    #[test]
    fn test_short_line_dropped_without_affecting_neighbours() {
        let contents = format!(
            "{DESCRIPTION}\n\n{COLUMNS}\n{SEPARATOR}\n\
             alpha h1 10 10 100 20\n\
             broken h2 3 3\n\
             beta h3 0 0 0 0\n"
        );
        let cache = parse(&contents);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("alpha").unwrap().stats().lines_added, 100);
        assert!(cache.get("broken").is_none());
        assert_eq!(cache.get("beta").unwrap().fingerprint(), "h3");
    }

    #[test]
    fn test_three_line_header_detected_by_separator() {
        let contents = format!("{DESCRIPTION}\n{COLUMNS}\n{SEPARATOR}|__________|\nalpha h1 1 1 2 3\n");
        let cache = parse(&contents);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("alpha"));
    }

    #[test]
    fn test_headerless_file_still_parses() {
        let cache = parse("alpha h1 1 1 2 3\nnot a record at all here\nbeta h2 4 0 5 6\n");
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("beta"));
    }

    #[test]
    fn test_invalid_numbers_and_duplicates_skipped() {
        let contents = format!(
            "{SEPARATOR}\nalpha h1 x 1 2 3\nalpha h1 4 4 2 3\nalpha h9 9 9 9 9\n"
        );
        let cache = parse(&contents);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("alpha").unwrap().stats().total_commits, 4);
    }

    #[test]
    fn test_insert_keeps_existing_record() {
        let mut cache = sample();
        assert!(!cache.insert(record("alpha", 99, 99, 99, 99)));
        assert_eq!(cache.get("alpha").unwrap().stats().total_commits, 10);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_evict_keeps_index_consistent() {
        let mut cache = sample();
        let evicted = cache.evict("alpha").unwrap();
        assert_eq!(evicted.name(), "alpha");
        assert!(!cache.contains("alpha"));
        assert_eq!(cache.get("gamma.rs").unwrap().stats().lines_deleted, 9);
        assert!(cache.evict("alpha").is_none());

        assert!(cache.insert(record("alpha", 1, 1, 1, 1)));
        let names: Vec<&str> = cache.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["beta", "gamma.rs", "alpha"]);
    }

    #[test]
    fn test_whitespace_names_not_written() {
        let mut cache = Cache::new();
        cache.insert(record("two words", 1, 1, 1, 1));
        cache.insert(record("ok", 1, 1, 1, 1));
        let reparsed = parse(&render(&cache));
        assert_eq!(reparsed.len(), 1);
        assert!(reparsed.contains("ok"));
    }
}
