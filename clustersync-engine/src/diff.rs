//! Unified diffs for dry-run output.

use std::path::{Path, PathBuf};

use similar::TextDiff;

/// A single rendered file diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: PathBuf,
    pub unified_diff: String,
}

/// Unified diff of `current` → `desired`, with `a/…`/`b/…` headers relative
/// to the playbook root.
pub fn unified(root: &Path, path: &Path, current: &str, desired: &str) -> FileDiff {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let old_header = format!("a/{}", relative.display());
    let new_header = format!("b/{}", relative.display());
    let unified_diff = TextDiff::from_lines(current, desired)
        .unified_diff()
        .header(&old_header, &new_header)
        .context_radius(3)
        .to_string();
    FileDiff {
        path: path.to_path_buf(),
        unified_diff,
    }
}
