//! Shared fixtures: small EPUB archives built in memory.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

struct Item {
    id: String,
    href: String,
    /// Archive path under `OEBPS/`, normally the same as `href`.
    entry: String,
    media_type: String,
    properties: Option<String>,
    content: Option<String>,
}

/// Builds an EPUB whose manifest lists items in insertion order.
///
/// The spine is written in reverse order so tests can tell manifest order
/// from reading order.
pub struct EpubBuilder {
    title: String,
    items: Vec<Item>,
}

impl EpubBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            items: Vec::new(),
        }
    }

    /// Add an XHTML document with the given `<title>` and body markup.
    pub fn document(self, title: Option<&str>, body: &str) -> Self {
        let n = self.items.len();
        let html = xhtml(title, body);
        self.item(&format!("doc{n}"), &format!("text/doc{n}.xhtml"), "application/xhtml+xml", None, Some(html))
    }

    /// Add a document whose manifest `href` differs from its archive path,
    /// e.g. a percent-encoded href for a file name with spaces.
    pub fn document_at(self, title: Option<&str>, body: &str, href: &str, entry: &str) -> Self {
        let n = self.items.len();
        let html = xhtml(title, body);
        let mut builder = self.item(&format!("doc{n}"), href, "application/xhtml+xml", None, Some(html));
        if let Some(item) = builder.items.last_mut() {
            item.entry = entry.to_string();
        }
        builder
    }

    /// Add a navigation document, which is not book content.
    pub fn nav(self, title: &str) -> Self {
        let html = format!("<html><head><title>{title}</title></head><body><nav/></body></html>");
        self.item("nav", "nav.xhtml", "application/xhtml+xml", Some("nav"), Some(html))
    }

    pub fn stylesheet(self) -> Self {
        self.item("css", "style.css", "text/css", None, Some("p { margin: 0 }".to_string()))
    }

    /// Add a manifest entry whose file is absent from the archive.
    pub fn missing_document(self) -> Self {
        self.item("ghost", "text/ghost.xhtml", "application/xhtml+xml", None, None)
    }

    fn item(
        mut self,
        id: &str,
        href: &str,
        media_type: &str,
        properties: Option<&str>,
        content: Option<String>,
    ) -> Self {
        self.items.push(Item {
            id: id.to_string(),
            href: href.to_string(),
            entry: href.to_string(),
            media_type: media_type.to_string(),
            properties: properties.map(String::from),
            content,
        });
        self
    }

    fn opf(&self) -> String {
        let mut manifest = String::new();
        for item in &self.items {
            let properties = item
                .properties
                .as_deref()
                .map(|p| format!(" properties=\"{p}\""))
                .unwrap_or_default();
            manifest.push_str(&format!(
                "    <item id=\"{}\" href=\"{}\" media-type=\"{}\"{properties}/>\n",
                item.id, item.href, item.media_type
            ));
        }

        let mut spine = String::new();
        for item in self.items.iter().rev() {
            if item.media_type == "application/xhtml+xml" {
                spine.push_str(&format!("    <itemref idref=\"{}\"/>\n", item.id));
            }
        }

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0" unique-identifier="uid">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:identifier id="uid">urn:uuid:folio-test</dc:identifier>
    <dc:title>{}</dc:title>
  </metadata>
  <manifest>
{manifest}  </manifest>
  <spine>
{spine}  </spine>
</package>"#,
            self.title
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        zip.start_file("mimetype", stored).unwrap();
        zip.write_all(b"application/epub+zip").unwrap();

        zip.start_file("META-INF/container.xml", deflated).unwrap();
        zip.write_all(CONTAINER_XML.as_bytes()).unwrap();

        zip.start_file("OEBPS/content.opf", deflated).unwrap();
        zip.write_all(self.opf().as_bytes()).unwrap();

        for item in &self.items {
            if let Some(content) = &item.content {
                zip.start_file(format!("OEBPS/{}", item.entry), deflated).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
        }

        zip.finish().unwrap().into_inner()
    }

    pub fn write(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).unwrap();
    }
}

fn xhtml(title: Option<&str>, body: &str) -> String {
    let head = title
        .map(|t| format!("<title>{t}</title>"))
        .unwrap_or_default();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<html xmlns=\"http://www.w3.org/1999/xhtml\"><head>{head}</head><body>{body}</body></html>"
    )
}
