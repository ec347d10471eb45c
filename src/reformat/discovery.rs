use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::Result;

/// Find every file under `root` whose extension is one of `extensions`.
///
/// The walk is recursive and includes hidden and ignored files. Extensions
/// are compared case-sensitively, with or without a leading dot. The result
/// is sorted.
pub fn discover(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    let extensions: Vec<&str> = extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.'))
        .collect();

    let mut files = Vec::new();
    for entry in WalkBuilder::new(root).standard_filters(false).build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if matches {
            files.push(entry.into_path());
        }
    }

    files.sort();
    log::debug!("Discovered {} files under {}", files.len(), root.display());
    Ok(files)
}
