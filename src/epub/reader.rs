use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use percent_encoding::percent_decode_str;
use zip::ZipArchive;

use crate::epub::parser::{ManifestItem, Package, parse_container_xml, parse_opf};
use crate::error::{Error, Result};
use crate::util::{decode_document, strip_bom};

const CONTAINER_PATH: &str = "META-INF/container.xml";

/// A content document loaded from the archive.
#[derive(Debug, Clone)]
pub struct ContentDocument {
    /// Manifest id.
    pub id: String,
    /// Path of the document inside the archive.
    pub path: String,
    /// Decoded (X)HTML source.
    pub html: String,
}

/// An opened EPUB archive.
///
/// Only the package document is parsed up front; content documents are read
/// on demand.
pub struct EpubArchive<R> {
    archive: ZipArchive<R>,
    opf_dir: String,
    package: Package,
}

impl EpubArchive<File> {
    /// Open an EPUB file from disk.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use folio::epub::EpubArchive;
    ///
    /// let mut book = EpubArchive::open("elixir_otp.epub")?;
    /// for doc in book.documents()? {
    ///     println!("{}", doc.path);
    /// }
    /// # Ok::<(), folio::Error>(())
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> EpubArchive<R> {
    /// Read an EPUB from any [`Read`] + [`Seek`] source.
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;

        // 1. Find the OPF file path from container.xml
        let container = match read_entry(&mut archive, CONTAINER_PATH) {
            Ok(bytes) => bytes,
            Err(Error::Zip(zip::result::ZipError::FileNotFound)) => {
                return Err(Error::MissingElement(CONTAINER_PATH.to_string()));
            }
            Err(e) => return Err(e),
        };
        let opf_path = parse_container_xml(&container)?;
        let opf_dir = Path::new(&opf_path)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();

        // 2. Parse the OPF file
        let opf_bytes = read_entry(&mut archive, &opf_path)?;
        let opf = String::from_utf8(strip_bom(&opf_bytes).to_vec())?;
        let package = parse_opf(&opf)?;

        Ok(Self {
            archive,
            opf_dir,
            package,
        })
    }

    /// Book title from the package metadata.
    pub fn title(&self) -> Option<&str> {
        self.package.title.as_deref()
    }

    /// Content document entries, in manifest order.
    pub fn document_items(&self) -> impl Iterator<Item = &ManifestItem> {
        self.package.manifest.iter().filter(|item| item.is_document())
    }

    /// Load every content document, in manifest order.
    ///
    /// Documents listed in the manifest but absent from the archive are
    /// skipped with a warning.
    pub fn documents(&mut self) -> Result<Vec<ContentDocument>> {
        let items: Vec<ManifestItem> = self.document_items().cloned().collect();
        let mut documents = Vec::with_capacity(items.len());

        for item in items {
            let path = resolve_path(&self.opf_dir, &item.href);
            let bytes = match read_entry_lenient(&mut self.archive, &path) {
                Ok(bytes) => bytes,
                Err(Error::Zip(zip::result::ZipError::FileNotFound)) => {
                    log::warn!("Manifest item '{}' not found in archive: {}", item.id, path);
                    continue;
                }
                Err(e) => return Err(e),
            };

            documents.push(ContentDocument {
                id: item.id,
                path,
                html: decode_document(&bytes).into_owned(),
            });
        }

        Ok(documents)
    }
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(path)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Read an entry, retrying with the percent-decoded path.
fn read_entry_lenient<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    match read_entry(archive, path) {
        Err(Error::Zip(zip::result::ZipError::FileNotFound)) => {
            let decoded = percent_decode_str(path).decode_utf8_lossy();
            if decoded == path {
                return Err(Error::Zip(zip::result::ZipError::FileNotFound));
            }
            read_entry(archive, &decoded)
        }
        other => other,
    }
}

/// Resolve a manifest href against the OPF directory.
///
/// Fragments are dropped and `.`/`..` segments are normalized.
fn resolve_path(base: &str, href: &str) -> String {
    let href = href.split('#').next().unwrap_or_default();
    let mut segments: Vec<&str> = base.split('/').filter(|s| !s.is_empty()).collect();

    for segment in href.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.join("/")
}
