//! Splitting an EPUB into per-chapter Markdown files grouped by part.
//!
//! Content documents are taken in manifest order. A document whose title
//! contains the part token opens a new part; every other document becomes a
//! chapter of the most recent part. Chapters seen before the first part are
//! discarded.
//!
//! ```no_run
//! use folio::split::{SplitOptions, split_archive};
//!
//! let written = split_archive("elixir_otp.epub", "elixir_otp", &SplitOptions::default())?;
//! println!("{written} chapters");
//! # Ok::<(), folio::Error>(())
//! ```

mod outline;

use std::path::Path;

use crate::dom::{document_title, parse_html};
use crate::epub::{ContentDocument, EpubArchive};
use crate::error::{Error, Result};
use crate::markdown::render_document;

pub use outline::{Outline, Placement};

/// How a document title is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    PartMarker,
    Chapter,
}

/// Options for splitting an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// Case-sensitive substring marking a part title.
    pub part_token: String,
    /// Title given to documents without one.
    pub placeholder: String,
    /// Extension of chapter files, without the dot.
    pub extension: String,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            part_token: "Part".to_string(),
            placeholder: "Untitled".to_string(),
            extension: "md".to_string(),
        }
    }
}

pub fn classify(title: &str, part_token: &str) -> ItemKind {
    if title.contains(part_token) {
        ItemKind::PartMarker
    } else {
        ItemKind::Chapter
    }
}

/// Turn a title into a file or directory name.
///
/// Spaces and path separators become underscores. The special names `.`
/// and `..` are replaced as well.
pub fn entry_name(title: &str) -> String {
    let name: String = title
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect();
    match name.as_str() {
        "." | ".." => name.replace('.', "_"),
        _ => name,
    }
}

/// Build the outline of a sequence of content documents.
pub fn outline_documents<I>(documents: I, options: &SplitOptions) -> Outline
where
    I: IntoIterator<Item = ContentDocument>,
{
    let mut outline = Outline::new(&options.part_token);

    for doc in documents {
        let dom = parse_html(&doc.html);
        let title = document_title(&dom).unwrap_or_else(|| options.placeholder.clone());
        let placement = outline.push(&title, || render_document(&dom));

        match placement {
            Placement::Dropped => {
                log::debug!("Dropping '{title}' ({}): no part yet", doc.path);
            }
            placement => log::debug!("{placement:?}: '{title}' ({})", doc.path),
        }
    }

    outline
}

/// Read an archive and build its outline.
pub fn outline_archive<P: AsRef<Path>>(archive: P, options: &SplitOptions) -> Result<Outline> {
    let mut book = EpubArchive::open(archive.as_ref())?;
    if let Some(title) = book.title() {
        log::debug!("Reading '{title}'");
    }
    let documents = book.documents()?;
    Ok(outline_documents(documents, options))
}

/// Split `archive` into `dest/<part>/<chapter>.<extension>`.
///
/// Fails without reading the archive when `dest` already exists. Returns
/// the number of chapter files written.
pub fn split_archive<P, Q>(archive: P, dest: Q, options: &SplitOptions) -> Result<usize>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let dest = dest.as_ref();
    if std::fs::symlink_metadata(dest).is_ok() {
        return Err(Error::DestinationExists(dest.to_path_buf()));
    }

    let outline = outline_archive(archive, options)?;
    let written = outline.write_to(dest, &options.extension)?;
    log::info!(
        "Wrote {written} chapters in {} parts to {}",
        outline.parts().len(),
        dest.display()
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(html: &str) -> ContentDocument {
        ContentDocument {
            id: "item".to_string(),
            path: "text/item.xhtml".to_string(),
            html: html.to_string(),
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("Part I: Basics", "Part"), ItemKind::PartMarker);
        assert_eq!(classify("Counterparts", "Part"), ItemKind::Chapter);
        assert_eq!(classify("Departure", "part"), ItemKind::PartMarker);
        assert_eq!(classify("PART ONE", "Part"), ItemKind::Chapter);
    }

    #[test]
    fn test_entry_name() {
        assert_eq!(entry_name("Chapter One"), "Chapter_One");
        assert_eq!(entry_name("Part I: Basics"), "Part_I:_Basics");
        assert_eq!(entry_name("I/O and \\ paths"), "I_O_and___paths");
        assert_eq!(entry_name(".."), "__");
        assert_eq!(entry_name("v1.2"), "v1.2");
    }

    #[test]
    fn test_outline_documents_converts_chapters() {
        let documents = vec![
            doc("<html><head><title>Preface</title></head><body><p>skip</p></body></html>"),
            doc("<html><head><title>Part I</title></head><body><h1>Part I</h1></body></html>"),
            doc("<html><head><title>Processes</title></head><body><h1>Processes</h1><p>Spawn <em>many</em>.</p></body></html>"),
        ];

        let outline = outline_documents(documents, &SplitOptions::default());
        let chapters = &outline.parts()["Part I"];
        assert_eq!(chapters.len(), 1);
        assert_eq!(chapters["Processes"], "# Processes\n\nSpawn *many*.\n");
    }

    #[test]
    fn test_untitled_documents_use_placeholder() {
        let documents = vec![
            doc("<title>Part A</title>"),
            doc("<html><body><p>no title</p></body></html>"),
        ];

        let outline = outline_documents(documents, &SplitOptions::default());
        assert_eq!(outline.parts()["Part A"]["Untitled"], "no title\n");
    }

    #[test]
    fn test_placeholder_can_be_a_part() {
        let options = SplitOptions {
            placeholder: "Part ?".to_string(),
            ..SplitOptions::default()
        };
        let outline = outline_documents(vec![doc("<p>x</p>")], &options);
        assert!(outline.parts().contains_key("Part ?"));
    }
}
