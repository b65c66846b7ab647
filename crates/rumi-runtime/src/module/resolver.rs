//! Module path resolution.
//!
//! Turns a requested module name into the canonical path of an existing
//! regular file, applying extension inference and search-path traversal.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::ModuleError;

/// Ordered, deduplicated list of directories searched for bare module names.
///
/// Earlier entries shadow later ones; order is part of the contract. Seeded
/// with the current directory.
#[derive(Debug, Clone)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// A search path containing only `.`.
    pub fn new() -> Self {
        Self {
            dirs: vec![PathBuf::from(".")],
        }
    }

    /// An empty search path. Bare names then resolve like direct paths.
    pub fn empty() -> Self {
        Self { dirs: Vec::new() }
    }

    /// Append a directory with lowest priority.
    pub fn push(&mut self, dir: impl Into<PathBuf>) {
        self.dirs.push(dir.into());
        self.dedup();
    }

    /// Prepend directories from a colon-separated list, such as a
    /// configuration value like `"./lib:./vendor"`. The list's own order is
    /// kept, ahead of any existing entries. Empty segments are skipped.
    pub fn prepend_list(&mut self, list: &str) {
        let mut dirs: Vec<PathBuf> = list
            .split(':')
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect();
        dirs.append(&mut self.dirs);
        self.dirs = dirs;
        self.dedup();
    }

    /// Drop duplicate entries, keeping the first occurrence.
    fn dedup(&mut self) {
        let mut seen = HashSet::new();
        self.dirs.retain(|d| seen.insert(d.clone()));
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }
}

impl Default for SearchPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a requested module name against the recognized extensions,
/// returning the canonical path of the first matching regular file.
///
/// Names starting with `/` or `.` are checked directly. Anything else is a
/// bare name looked up across the search path, directory-major: a directory
/// earlier on the path shadows later directories even for a lower-priority
/// extension. An empty search path degrades the bare branch to the direct
/// check.
pub fn resolve(
    name: &str,
    exts: &[&str],
    search_path: &SearchPath,
) -> Result<PathBuf, ModuleError> {
    if name.is_empty() {
        return Err(ModuleError::InvalidName(name.to_string()));
    }

    let candidates = candidate_names(name, exts);
    let mut tried = Vec::new();

    let direct = name.starts_with('/') || name.starts_with('.');
    let hit = if direct || search_path.is_empty() {
        first_file(candidates.iter().map(PathBuf::from), &mut tried)
    } else {
        first_file(
            search_path
                .dirs()
                .iter()
                .flat_map(|dir| candidates.iter().map(move |c| dir.join(c))),
            &mut tried,
        )
    };

    match hit {
        Some(path) => {
            let canonical = path.canonicalize()?;
            tracing::debug!(name, path = %canonical.display(), "resolved module");
            Ok(canonical)
        }
        None => Err(ModuleError::NotFound {
            name: name.to_string(),
            tried,
        }),
    }
}

/// First path that is an existing regular file; misses accumulate in `tried`.
fn first_file(
    paths: impl Iterator<Item = PathBuf>,
    tried: &mut Vec<PathBuf>,
) -> Option<PathBuf> {
    for path in paths {
        if path.is_file() {
            return Some(path);
        }
        tried.push(path);
    }
    None
}

/// Candidate filenames for a request. A name whose own extension is already
/// recognized is used as-is; otherwise each extension is appended, in
/// preference order.
fn candidate_names(name: &str, exts: &[&str]) -> Vec<String> {
    if exts.contains(&extname(name)) {
        vec![name.to_string()]
    } else {
        exts.iter().map(|ext| format!("{name}{ext}")).collect()
    }
}

/// The trailing `.ext` of `name`'s final component, dot included, or `""`.
/// A leading dot alone (a hidden file) is not an extension.
fn extname(name: &str) -> &str {
    let file = Path::new(name)
        .file_name()
        .and_then(|f| f.to_str())
        .unwrap_or("");
    match file.rfind('.') {
        Some(i) if i > 0 => &file[i..],
        _ => "",
    }
}
