use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::split::{ItemKind, classify, entry_name};

/// Where a pushed item ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Started (or restarted) a part.
    Part,
    /// Recorded as a chapter of the current part.
    Chapter,
    /// A chapter seen before any part; discarded.
    Dropped,
}

/// Parts and their chapters, in the order they were first seen.
#[derive(Debug, Clone)]
pub struct Outline {
    part_token: String,
    current_part: Option<String>,
    parts: IndexMap<String, IndexMap<String, String>>,
}

impl Outline {
    pub fn new(part_token: impl Into<String>) -> Self {
        Self {
            part_token: part_token.into(),
            current_part: None,
            parts: IndexMap::new(),
        }
    }

    /// Add the next item of the archive.
    ///
    /// `body` is only evaluated when the item is kept as a chapter.
    pub fn push(&mut self, title: &str, body: impl FnOnce() -> String) -> Placement {
        match classify(title, &self.part_token) {
            ItemKind::PartMarker => {
                // A repeated part title starts over with no chapters.
                self.parts.insert(title.to_string(), IndexMap::new());
                self.current_part = Some(title.to_string());
                Placement::Part
            }
            ItemKind::Chapter => {
                let Some(chapters) = self
                    .current_part
                    .as_ref()
                    .and_then(|part| self.parts.get_mut(part))
                else {
                    return Placement::Dropped;
                };
                chapters.insert(title.to_string(), body());
                Placement::Chapter
            }
        }
    }

    pub fn current_part(&self) -> Option<&str> {
        self.current_part.as_deref()
    }

    pub fn parts(&self) -> &IndexMap<String, IndexMap<String, String>> {
        &self.parts
    }

    pub fn chapter_count(&self) -> usize {
        self.parts.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Part and chapter titles without bodies.
    pub fn summary(&self) -> IndexMap<&str, Vec<&str>> {
        self.parts
            .iter()
            .map(|(part, chapters)| {
                (
                    part.as_str(),
                    chapters.keys().map(String::as_str).collect(),
                )
            })
            .collect()
    }

    /// The [`summary`](Self::summary) as a pretty-printed JSON object,
    /// `{"part": ["chapter", ...]}`, in outline order.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.summary())?)
    }

    /// Materialize the outline as `dest/<part>/<chapter>.<extension>`.
    ///
    /// `dest` must not exist; its parents are created as needed. Every part
    /// gets a directory even when it has no chapters. Returns the number of
    /// chapter files written.
    pub fn write_to(&self, dest: &Path, extension: &str) -> Result<usize> {
        if fs::symlink_metadata(dest).is_ok() {
            return Err(Error::DestinationExists(dest.to_path_buf()));
        }
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir(dest).map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => Error::DestinationExists(dest.to_path_buf()),
            _ => Error::Io(e),
        })?;

        let mut written = 0;
        for (part, chapters) in &self.parts {
            let part_dir = dest.join(entry_name(part));
            fs::create_dir_all(&part_dir)?;

            for (chapter, body) in chapters {
                let path = part_dir.join(format!("{}.{extension}", entry_name(chapter)));
                fs::write(&path, body)?;
                log::debug!("Wrote {}", path.display());
                written += 1;
            }
        }

        Ok(written)
    }
}
