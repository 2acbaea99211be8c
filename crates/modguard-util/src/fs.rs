use std::path::{Path, PathBuf};

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::ModguardError;

/// Walk up from `start` looking for a file named `filename`.
/// Returns the path to the directory containing the file, or `None`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Compile a list of glob patterns into a single matcher.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet, ModguardError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| ModguardError::Config {
            message: format!("Invalid glob pattern '{pattern}': {e}"),
        })?;
        builder.add(glob);
    }
    builder.build().map_err(|e| ModguardError::Config {
        message: format!("Failed to compile glob patterns: {e}"),
    })
}

/// Recursively collect every file named `filename` below `root`.
///
/// Paths are matched relative to `root` using `/` separators. A file is kept
/// when its parent directory matches `include` (or `include` is empty) and the
/// file itself does not match `exclude`. Results are sorted.
pub fn find_files_named(
    root: &Path,
    filename: &str,
    include: &GlobSet,
    exclude: &GlobSet,
) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    walk(root, root, filename, include, exclude, &mut found)?;
    found.sort();
    Ok(found)
}

fn walk(
    root: &Path,
    dir: &Path,
    filename: &str,
    include: &GlobSet,
    exclude: &GlobSet,
    found: &mut Vec<PathBuf>,
) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            walk(root, &path, filename, include, exclude, found)?;
        } else if file_type.is_file() && entry.file_name() == filename {
            let rel = relative_slash_path(root, &path);
            if exclude.is_match(&rel) {
                tracing::debug!("Skipping excluded {rel}");
                continue;
            }
            let parent = rel.rsplit_once('/').map(|(dir, _)| dir).unwrap_or(".");
            if include.is_empty() || include.is_match(parent) {
                found.push(path);
            }
        }
    }
    Ok(())
}

/// Render `path` relative to `root` with forward slashes.
pub fn relative_slash_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
