//! EPUB parsing utilities (container.xml, OPF package document).

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};

use crate::error::{Error, Result};
use crate::util::strip_bom;

/// A manifest entry, in the order the package document lists it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    pub properties: Option<String>,
}

impl ManifestItem {
    /// Whether this item is an (X)HTML content document.
    ///
    /// The EPUB 3 navigation document is excluded: it is a table of contents,
    /// not book content.
    pub fn is_document(&self) -> bool {
        let html = matches!(
            self.media_type.as_str(),
            "application/xhtml+xml" | "text/html"
        );
        html && !self.has_property("nav")
    }

    pub fn has_property(&self, property: &str) -> bool {
        self.properties
            .as_deref()
            .is_some_and(|props| props.split_ascii_whitespace().any(|p| p == property))
    }
}

/// Parsed OPF package data.
#[derive(Debug, Clone, Default)]
pub struct Package {
    /// `dc:title`, if present.
    pub title: Option<String>,
    /// Manifest entries in document order.
    pub manifest: Vec<ManifestItem>,
}

/// Parse META-INF/container.xml to find the OPF path.
pub fn parse_container_xml(bytes: &[u8]) -> Result<String> {
    let content = String::from_utf8(strip_bom(bytes).to_vec())?;

    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Empty(e) | Event::Start(e) if local_name(e.name().as_ref()) == b"rootfile" => {
                if let Some(path) = attribute(&e, b"full-path")? {
                    return Ok(path);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Err(Error::InvalidEpub(
        "No rootfile found in container.xml".into(),
    ))
}

/// Parse the OPF package document.
pub fn parse_opf(content: &str) -> Result<Package> {
    // Untrimmed: text around entity references in the title is significant.
    let mut reader = Reader::from_str(content);

    let mut package = Package::default();
    let mut in_metadata = false;
    let mut in_title = false;
    let mut title = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match local_name(e.name().as_ref()) {
                b"metadata" => in_metadata = true,
                b"title" if in_metadata && package.title.is_none() => {
                    in_title = true;
                    title.clear();
                }
                b"item" => push_manifest_item(&e, &mut package)?,
                _ => {}
            },
            Event::Empty(e) if local_name(e.name().as_ref()) == b"item" => {
                push_manifest_item(&e, &mut package)?;
            }
            Event::Text(e) if in_title => {
                title.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::GeneralRef(e) if in_title => {
                if let Ok(Some(c)) = e.resolve_char_ref() {
                    title.push(c);
                } else if let Some(resolved) =
                    resolve_predefined_entity(&String::from_utf8_lossy(e.as_ref()))
                {
                    title.push_str(resolved);
                }
            }
            Event::End(e) => match local_name(e.name().as_ref()) {
                b"metadata" => in_metadata = false,
                b"title" if in_title => {
                    in_title = false;
                    let trimmed = title.trim();
                    if !trimmed.is_empty() {
                        package.title = Some(trimmed.to_string());
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(package)
}

fn push_manifest_item(e: &BytesStart<'_>, package: &mut Package) -> Result<()> {
    let Some(id) = attribute(e, b"id")? else {
        return Ok(());
    };
    package.manifest.push(ManifestItem {
        id,
        href: attribute(e, b"href")?.unwrap_or_default(),
        media_type: attribute(e, b"media-type")?.unwrap_or_default(),
        properties: attribute(e, b"properties")?,
    });
    Ok(())
}

// ----------------------------------------------------------------------------
// Helpers
// ----------------------------------------------------------------------------

/// Read an attribute by key, resolving entity references in its value.
///
/// A value with an unknown entity or a bare `&` is kept as written.
fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            let raw = String::from_utf8(attr.value.to_vec())?;
            let value = unescape(&raw).map(Cow::into_owned).unwrap_or_else(|_| raw.clone());
            return Ok(Some(value));
        }
    }
    Ok(None)
}

/// Extract local name from namespaced XML name (e.g., "dc:title" -> "title").
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
