//! Pattern resolution: newline-delimited include/exclude text to a concrete file list.
//!
//! Each pattern line is either a literal path or a glob expression (`*`, `?`,
//! `[...]`, `**`). Directories reached either way are walked recursively and
//! only their non-directory entries are kept. Resolution never fails: patterns
//! that match nothing, invalid glob syntax and unreadable entries are logged
//! and skipped.
//!
//! Results are keyed by canonical path, so `a.txt`, `./a.txt` and the absolute
//! spelling of the same file collapse to one entry and exclude each other.
//! Iteration order is sorted by canonical path.

use glob::{glob_with, MatchOptions};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Splits pattern text into trimmed lines, dropping blanks and `#` comments.
///
/// `\r\n` and lone `\r` are treated as line breaks on every platform.
pub fn normalize_lines(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_owned)
        .collect()
}

/// A deduplicated set of existing non-directory paths with a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedFileList {
    // canonical path -> path as first discovered
    entries: BTreeMap<PathBuf, PathBuf>,
}

impl ResolvedFileList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `path` unless a path with the same canonical form is already present.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        let key = canonical_form(&path);
        if self.entries.contains_key(&key) {
            return false;
        }
        self.entries.insert(key, path);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths as they were discovered, in canonical-path order.
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.entries.values().map(PathBuf::as_path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(&canonical_form(path))
    }

    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.entries.values().cloned().collect()
    }
}

impl IntoIterator for ResolvedFileList {
    type Item = PathBuf;
    type IntoIter = std::collections::btree_map::IntoValues<PathBuf, PathBuf>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_values()
    }
}

/// Resolves already-normalized pattern lines against the filesystem.
pub fn resolve_patterns<S: AsRef<str>>(patterns: &[S]) -> ResolvedFileList {
    let mut files = ResolvedFileList::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        let before = files.len();
        resolve_one(pattern, &mut files);
        debug!(
            pattern,
            matched = files.len() - before,
            "Resolved pattern"
        );
    }
    files
}

/// Resolves include pattern text.
pub fn resolve_includes(text: &str) -> ResolvedFileList {
    let files = resolve_patterns(&normalize_lines(text));
    info!(count = files.len(), "Resolved include patterns");
    files
}

/// Resolves exclude pattern text. Empty text yields an empty set.
pub fn resolve_excludes(text: &str) -> ResolvedFileList {
    let files = resolve_patterns(&normalize_lines(text));
    info!(count = files.len(), "Resolved exclude patterns");
    files
}

/// Includes minus excludes, compared by canonical path.
pub fn compute_final_list(
    includes: &ResolvedFileList,
    excludes: &ResolvedFileList,
) -> ResolvedFileList {
    let entries = includes
        .entries
        .iter()
        .filter(|(key, path)| {
            let drop = excludes.entries.contains_key(*key);
            if drop {
                debug!(path = %path.display(), "Excluding file");
            }
            !drop
        })
        .map(|(key, path)| (key.clone(), path.clone()))
        .collect();
    ResolvedFileList { entries }
}

fn resolve_one(pattern: &str, files: &mut ResolvedFileList) {
    // A literal path wins over glob interpretation, so names containing `[` still resolve.
    let literal = Path::new(pattern);
    if literal.exists() {
        collect_path(literal, files);
        return;
    }

    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    let paths = match glob_with(pattern, options) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(pattern, error = %e, "Skipping invalid glob pattern");
            return;
        }
    };
    for entry in paths {
        match entry {
            Ok(path) => collect_path(&path, files),
            Err(e) => warn!(pattern, error = %e, "Skipping unreadable glob match"),
        }
    }
}

fn collect_path(path: &Path, files: &mut ResolvedFileList) {
    // Follows symlinks; a dangling link has no metadata and is skipped like in the walk below.
    match std::fs::metadata(path) {
        Ok(meta) if !meta.is_dir() => {
            files.insert(path.to_path_buf());
            return;
        }
        Ok(_) => {}
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping unreadable path");
            return;
        }
    }
    for entry in WalkDir::new(path).follow_links(true).sort_by_file_name() {
        match entry {
            Ok(entry) if !entry.file_type().is_dir() => {
                files.insert(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!(dir = %path.display(), error = %e, "Skipping unreadable entry"),
        }
    }
}

/// Resolved absolute form of `path`; falls back to joining onto the current
/// directory when the path cannot be canonicalized.
fn canonical_form(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    }
}
