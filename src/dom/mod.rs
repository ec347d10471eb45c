//! HTML parsing into an arena DOM.

mod arena;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;

use crate::util::collapse_whitespace;
use tree_sink::ArenaSink;

/// Parse an HTML or XHTML document into an [`ArenaDom`].
///
/// Parsing is lenient: malformed markup is repaired the way a browser would.
pub fn parse_html(html: &str) -> ArenaDom {
    let sink = ArenaSink::new();
    parse_document(sink, ParseOpts::default())
        .from_utf8()
        .one(html.as_bytes())
        .into_dom()
}

/// Text of the document's first `<title>` element.
///
/// Whitespace is collapsed and trimmed. Returns `None` when there is no
/// title element or it holds no text.
pub fn document_title(dom: &ArenaDom) -> Option<String> {
    let title = dom.find_by_tag("title")?;
    let text = dom.text_of(title);
    let text = collapse_whitespace(&text).trim().to_string();
    if text.is_empty() { None } else { Some(text) }
}
