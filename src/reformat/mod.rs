//! Reformatting of code regions embedded in text documents.
//!
//! Documents under a root directory are scanned for regions delimited by a
//! [`RegionSyntax`]. The code in each region is passed through a
//! [`Formatter`] and the document is rewritten in place. Documents are
//! processed in parallel; a failure in one document leaves it untouched and
//! does not affect the others.

mod discovery;
mod formatter;
mod region;

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{Error, Result};

pub use discovery::discover;
pub use formatter::{CommandFormatter, Formatter};
pub use region::{DEFAULT_BEGIN, DEFAULT_END, Region, RegionSyntax, Rewrite};

/// Options for [`format_tree`].
#[derive(Debug, Clone)]
pub struct FormatOptions {
    /// Directory searched recursively.
    pub root: PathBuf,
    /// Document extensions, with or without the dot.
    pub extensions: Vec<String>,
    pub syntax: RegionSyntax,
    /// Worker threads; `None` uses the available parallelism.
    pub jobs: Option<usize>,
    /// Report documents that would change without writing them.
    pub check: bool,
}

impl FormatOptions {
    pub fn new(root: impl Into<PathBuf>, syntax: RegionSyntax) -> Self {
        Self {
            root: root.into(),
            extensions: vec!["tex".to_string()],
            syntax,
            jobs: None,
            check: false,
        }
    }
}

/// What happened to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub path: PathBuf,
    /// Number of regions found.
    pub regions: usize,
    /// Whether the formatted document differs from the original.
    pub changed: bool,
}

/// Summary of a [`format_tree`] run, ordered by path.
#[derive(Debug, Default)]
pub struct FormatReport {
    pub outcomes: Vec<FileOutcome>,
    pub failures: Vec<(PathBuf, Error)>,
}

impl FormatReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Documents whose content changed (or would change, in check mode).
    pub fn changed(&self) -> impl Iterator<Item = &Path> {
        self.outcomes
            .iter()
            .filter(|o| o.changed)
            .map(|o| o.path.as_path())
    }

    pub fn regions(&self) -> usize {
        self.outcomes.iter().map(|o| o.regions).sum()
    }
}

/// Format the regions of a single document.
///
/// The document is written back only when its content changed and `check`
/// is false. On error the document is left as it was.
pub fn format_file(
    path: &Path,
    syntax: &RegionSyntax,
    formatter: &dyn Formatter,
    check: bool,
) -> Result<FileOutcome> {
    let original = fs::read_to_string(path)?;
    let rewrite = syntax.rewrite(&original, formatter)?;
    let changed = rewrite.text != original;

    if changed && !check {
        fs::write(path, &rewrite.text)?;
        log::info!("Formatted {}", path.display());
    } else if changed {
        log::info!("Would reformat {}", path.display());
    } else {
        log::debug!("Unchanged {} ({} regions)", path.display(), rewrite.regions);
    }

    Ok(FileOutcome {
        path: path.to_path_buf(),
        regions: rewrite.regions,
        changed,
    })
}

/// Format every matching document under `options.root`.
///
/// Discovery errors abort the run. Per-document errors are collected in the
/// report.
pub fn format_tree(options: &FormatOptions, formatter: &dyn Formatter) -> Result<FormatReport> {
    let files = discover(&options.root, &options.extensions)?;
    if files.is_empty() {
        log::warn!("No documents found under {}", options.root.display());
        return Ok(FormatReport::default());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.jobs.unwrap_or(0))
        .build()?;

    let results: Vec<(PathBuf, Result<FileOutcome>)> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let result = format_file(path, &options.syntax, formatter, options.check);
                (path.clone(), result)
            })
            .collect()
    });

    let mut report = FormatReport::default();
    for (path, result) in results {
        match result {
            Ok(outcome) => report.outcomes.push(outcome),
            Err(e) => {
                log::debug!("Failed to format {}: {e}", path.display());
                report.failures.push((path, e));
            }
        }
    }

    Ok(report)
}
