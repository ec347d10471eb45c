//! EPUB archive reading.

mod parser;
mod reader;

pub use parser::{ManifestItem, Package, parse_container_xml, parse_opf};
pub use reader::{ContentDocument, EpubArchive};
