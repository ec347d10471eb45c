//! HTML → Markdown rendering.
//!
//! Walks the arena DOM produced by [`crate::dom::parse_html`] and emits
//! Markdown. Block content is rendered bottom-up into a list of blocks which
//! the caller joins with blank lines; inline content accumulates in an
//! [`InlineBuf`] that takes care of whitespace and hard breaks.

use crate::dom::{ArenaDom, ArenaNodeData, ArenaNodeId, parse_html};
use crate::util::collapse_whitespace;

use super::escape::{
    calculate_fence_length, calculate_inline_code_ticks, escape_block_start, escape_markdown,
};

/// Elements whose content never reaches the output.
const SKIPPED: &[&str] = &[
    "head", "title", "script", "style", "template", "meta", "link", "noscript",
];

/// Convert an HTML (or XHTML) document to Markdown.
///
/// Only the `<body>` is rendered. The result ends with a single newline, or
/// is empty when the body has no renderable content.
///
/// # Examples
///
/// ```
/// use folio::markdown::html_to_markdown;
///
/// let md = html_to_markdown("<h1>Processes</h1><p>Spawn <em>many</em>.</p>");
/// assert_eq!(md, "# Processes\n\nSpawn *many*.\n");
/// ```
pub fn html_to_markdown(html: &str) -> String {
    render_document(&parse_html(html))
}

/// Render an already parsed document to Markdown.
pub fn render_document(dom: &ArenaDom) -> String {
    let root = dom.find_by_tag("body").unwrap_or(dom.document());
    let blocks = RenderContext::new(dom).blocks(root);

    let mut output = blocks
        .into_iter()
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join("\n\n");
    if !output.is_empty() {
        output.push('\n');
    }
    output
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    List,
    Other,
}

/// A rendered block-level element.
#[derive(Debug, Clone)]
struct Block {
    text: String,
    kind: BlockKind,
}

impl Block {
    fn other(text: String) -> Self {
        Self {
            text,
            kind: BlockKind::Other,
        }
    }
}

/// Accumulates inline Markdown for one block.
///
/// Input fragments carry collapsed whitespace; the buffer drops a leading
/// space when the output already ends in whitespace. Hard breaks are deferred
/// until more content arrives so trailing `<br>`s vanish.
#[derive(Debug, Default)]
struct InlineBuf {
    out: String,
    pending_break: bool,
}

impl InlineBuf {
    fn push_text(&mut self, text: &str) {
        let mut text = text;
        if self.pending_break || self.out.ends_with(' ') || self.out.ends_with('\n') {
            text = text.trim_start_matches(' ');
        }
        if text.is_empty() {
            return;
        }
        if self.pending_break {
            if text.trim().is_empty() {
                return;
            }
            let trimmed_len = self.out.trim_end_matches(' ').len();
            self.out.truncate(trimmed_len);
            self.out.push_str("\\\n");
            self.pending_break = false;
        }
        self.out.push_str(text);
    }

    fn push_break(&mut self) {
        if !self.out.trim().is_empty() {
            self.pending_break = true;
        }
    }

    fn finish(self) -> String {
        self.out.trim().to_string()
    }
}

/// Pure rendering context over a parsed document.
struct RenderContext<'a> {
    dom: &'a ArenaDom,
}

impl<'a> RenderContext<'a> {
    fn new(dom: &'a ArenaDom) -> Self {
        Self { dom }
    }

    fn tag(&self, id: ArenaNodeId) -> Option<&'a str> {
        self.dom.element_name(id).map(|n| &**n)
    }

    /// Render the children of `parent` as a sequence of blocks.
    fn blocks(&self, parent: ArenaNodeId) -> Vec<Block> {
        let mut out = Vec::new();
        let mut inline = InlineBuf::default();

        for child in self.dom.children(parent) {
            let Some(node) = self.dom.get(child) else {
                continue;
            };
            match &node.data {
                ArenaNodeData::Text(text) => {
                    inline.push_text(&escape_markdown(&collapse_whitespace(text)));
                }
                ArenaNodeData::Element { .. } => {
                    let tag = self.tag(child).unwrap_or_default();
                    if SKIPPED.contains(&tag) {
                        continue;
                    }
                    if is_block(tag) {
                        flush(std::mem::take(&mut inline), &mut out);
                        self.block(child, tag, &mut out);
                    } else {
                        self.inline(child, &mut inline);
                    }
                }
                _ => {}
            }
        }

        flush(inline, &mut out);
        out
    }

    fn block(&self, id: ArenaNodeId, tag: &str, out: &mut Vec<Block>) {
        match tag {
            "p" | "dt" | "summary" | "figcaption" | "caption" => {
                let text = self.inline_text(id);
                if !text.is_empty() {
                    out.push(Block::other(escape_block_start(&text)));
                }
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                let text = self.inline_text(id).replace("\\\n", " ");
                if !text.is_empty() {
                    out.push(Block::other(format!("{} {}", "#".repeat(level), text)));
                }
            }
            "hr" => out.push(Block::other("---".to_string())),
            "pre" => self.code_block(id, out),
            "blockquote" => {
                let inner = join_blocks(self.blocks(id));
                if !inner.is_empty() {
                    let quoted = inner
                        .lines()
                        .map(|line| {
                            if line.is_empty() {
                                ">".to_string()
                            } else {
                                format!("> {line}")
                            }
                        })
                        .collect::<Vec<_>>()
                        .join("\n");
                    out.push(Block::other(quoted));
                }
            }
            "ul" => self.list(id, false, out),
            "ol" => self.list(id, true, out),
            "dd" => {
                let inner = join_blocks(self.blocks(id));
                if !inner.is_empty() {
                    out.push(Block::other(indent_item(":   ", &inner)));
                }
            }
            "table" => self.table(id, out),
            _ => out.extend(self.blocks(id)),
        }
    }

    /// Render the inline content of an element as a single trimmed string.
    fn inline_text(&self, id: ArenaNodeId) -> String {
        let mut buf = InlineBuf::default();
        self.inline_children(id, &mut buf);
        buf.finish()
    }

    fn inline_children(&self, id: ArenaNodeId, buf: &mut InlineBuf) {
        for child in self.dom.children(id) {
            self.inline(child, buf);
        }
    }

    fn inline(&self, id: ArenaNodeId, buf: &mut InlineBuf) {
        let Some(node) = self.dom.get(id) else {
            return;
        };
        match &node.data {
            ArenaNodeData::Text(text) => {
                buf.push_text(&escape_markdown(&collapse_whitespace(text)));
            }
            ArenaNodeData::Element { .. } => {
                let tag = self.tag(id).unwrap_or_default();
                match tag {
                    t if SKIPPED.contains(&t) => {}
                    "br" => buf.push_break(),
                    "em" | "i" | "cite" | "var" | "dfn" => self.wrapped(id, "*", "*", buf),
                    "strong" | "b" => self.wrapped(id, "**", "**", buf),
                    "del" | "s" | "strike" => self.wrapped(id, "~~", "~~", buf),
                    "code" | "kbd" | "samp" | "tt" => self.code_span(id, buf),
                    "img" => self.image(id, buf),
                    "a" => match self.dom.get_attr(id, "href").filter(|h| !h.is_empty()) {
                        Some(href) => {
                            let close = format!("]({})", link_destination(href));
                            self.wrapped(id, "[", &close, buf);
                        }
                        None => self.inline_children(id, buf),
                    },
                    _ => self.inline_children(id, buf),
                }
            }
            _ => {}
        }
    }

    /// Wrap rendered children in delimiters, keeping edge whitespace outside.
    fn wrapped(&self, id: ArenaNodeId, open: &str, close: &str, buf: &mut InlineBuf) {
        let mut inner = InlineBuf::default();
        self.inline_children(id, &mut inner);
        let raw = inner.out;

        let core = raw.trim();
        if core.is_empty() {
            if !raw.is_empty() {
                buf.push_text(" ");
            }
            return;
        }

        let lead = if raw.starts_with(char::is_whitespace) { " " } else { "" };
        let trail = if raw.ends_with(char::is_whitespace) { " " } else { "" };
        buf.push_text(&format!("{lead}{open}{core}{close}{trail}"));
    }

    fn code_span(&self, id: ArenaNodeId, buf: &mut InlineBuf) {
        let raw = self.dom.text_of(id);
        let raw = collapse_whitespace(&raw);
        let core = raw.trim();
        if core.is_empty() {
            if !raw.is_empty() {
                buf.push_text(" ");
            }
            return;
        }

        let ticks = "`".repeat(calculate_inline_code_ticks(core));
        let pad = if core.starts_with('`') || core.ends_with('`') {
            " "
        } else {
            ""
        };
        let lead = if raw.starts_with(' ') { " " } else { "" };
        let trail = if raw.ends_with(' ') { " " } else { "" };
        buf.push_text(&format!("{lead}{ticks}{pad}{core}{pad}{ticks}{trail}"));
    }

    fn image(&self, id: ArenaNodeId, buf: &mut InlineBuf) {
        let Some(src) = self.dom.get_attr(id, "src").filter(|s| !s.is_empty()) else {
            return;
        };
        let alt = self.dom.get_attr(id, "alt").unwrap_or_default();
        let alt = escape_markdown(collapse_whitespace(alt).trim());
        buf.push_text(&format!("![{alt}]({})", link_destination(src)));
    }

    fn code_block(&self, id: ArenaNodeId, out: &mut Vec<Block>) {
        let text = self.dom.text_of(id);
        let code = text.trim_start_matches(['\n', '\r']).trim_end();
        if code.is_empty() {
            return;
        }

        let fence = "`".repeat(calculate_fence_length(code, '`'));
        let language = self.code_language(id).unwrap_or_default();
        out.push(Block::other(format!("{fence}{language}\n{code}\n{fence}")));
    }

    /// Language from a `language-*` or `lang-*` class on `<pre>` or its `<code>`.
    fn code_language(&self, pre: ArenaNodeId) -> Option<String> {
        let code = self
            .dom
            .children(pre)
            .find(|&c| self.tag(c) == Some("code"));

        [Some(pre), code].into_iter().flatten().find_map(|id| {
            self.dom.get_attr(id, "class").and_then(|classes| {
                classes.split_whitespace().find_map(|class| {
                    class
                        .strip_prefix("language-")
                        .or_else(|| class.strip_prefix("lang-"))
                        .filter(|lang| !lang.is_empty())
                        .map(str::to_string)
                })
            })
        })
    }

    fn list(&self, id: ArenaNodeId, ordered: bool, out: &mut Vec<Block>) {
        let start = if ordered {
            self.dom
                .get_attr(id, "start")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(1)
        } else {
            1
        };

        let mut items: Vec<Vec<Block>> = Vec::new();
        for child in self.dom.children(id) {
            let Some(tag) = self.tag(child) else {
                continue;
            };
            if tag == "li" {
                items.push(self.blocks(child));
            } else if is_block(tag) {
                // Sloppy markup nests lists directly inside lists
                let mut nested = Vec::new();
                self.block(child, tag, &mut nested);
                match items.last_mut() {
                    Some(last) => last.extend(nested),
                    None => items.push(nested),
                }
            }
        }
        if items.is_empty() {
            return;
        }

        let tight = items.iter().all(|blocks| {
            blocks
                .iter()
                .filter(|b| b.kind != BlockKind::List)
                .count()
                <= 1
        });

        let rendered: Vec<String> = items
            .into_iter()
            .enumerate()
            .map(|(i, blocks)| {
                let marker = if ordered {
                    format!("{}. ", start.saturating_add(i as u64))
                } else {
                    "- ".to_string()
                };
                let separator = if tight { "\n" } else { "\n\n" };
                let body = blocks
                    .into_iter()
                    .map(|b| b.text)
                    .collect::<Vec<_>>()
                    .join(separator);
                indent_item(&marker, &body)
            })
            .collect();

        out.push(Block {
            text: rendered.join(if tight { "\n" } else { "\n\n" }),
            kind: BlockKind::List,
        });
    }

    fn table(&self, id: ArenaNodeId, out: &mut Vec<Block>) {
        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut caption = None;
        self.collect_rows(id, &mut rows, &mut caption);

        if let Some(caption) = caption.filter(|c: &String| !c.is_empty()) {
            out.push(Block::other(caption));
        }

        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return;
        }

        let mut lines = vec![table_row(&rows[0], columns)];
        lines.push(format!("|{}", " --- |".repeat(columns)));
        lines.extend(rows[1..].iter().map(|r| table_row(r, columns)));
        out.push(Block::other(lines.join("\n")));
    }

    fn collect_rows(
        &self,
        id: ArenaNodeId,
        rows: &mut Vec<Vec<String>>,
        caption: &mut Option<String>,
    ) {
        for child in self.dom.children(id) {
            match self.tag(child) {
                Some("tr") => {
                    let cells = self
                        .dom
                        .children(child)
                        .filter(|&c| matches!(self.tag(c), Some("td") | Some("th")))
                        .map(|c| self.inline_text(c).replace("\\\n", " "))
                        .collect::<Vec<_>>();
                    if !cells.is_empty() {
                        rows.push(cells);
                    }
                }
                Some("thead") | Some("tbody") | Some("tfoot") => {
                    self.collect_rows(child, rows, caption)
                }
                Some("caption") => *caption = Some(self.inline_text(child)),
                _ => {}
            }
        }
    }
}

fn table_row(cells: &[String], columns: usize) -> String {
    let mut line = String::from("|");
    for i in 0..columns {
        let cell = cells.get(i).map(String::as_str).unwrap_or("");
        line.push(' ');
        line.push_str(cell);
        line.push_str(" |");
    }
    line
}

fn flush(inline: InlineBuf, out: &mut Vec<Block>) {
    let text = inline.finish();
    if !text.is_empty() {
        out.push(Block::other(escape_block_start(&text)));
    }
}

fn join_blocks(blocks: Vec<Block>) -> String {
    blocks
        .into_iter()
        .map(|b| b.text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prefix the first line with `marker` and indent continuation lines to match.
fn indent_item(marker: &str, body: &str) -> String {
    if body.is_empty() {
        return marker.trim_end().to_string();
    }

    let pad = " ".repeat(marker.len());
    body.lines()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                format!("{marker}{line}")
            } else if line.is_empty() {
                String::new()
            } else {
                format!("{pad}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn link_destination(href: &str) -> String {
    if href.contains([' ', '(', ')']) {
        format!("<{href}>")
    } else {
        href.to_string()
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "address"
            | "article"
            | "aside"
            | "blockquote"
            | "body"
            | "caption"
            | "dd"
            | "details"
            | "div"
            | "dl"
            | "dt"
            | "fieldset"
            | "figcaption"
            | "figure"
            | "footer"
            | "form"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "header"
            | "hr"
            | "html"
            | "li"
            | "main"
            | "nav"
            | "ol"
            | "p"
            | "pre"
            | "section"
            | "summary"
            | "table"
            | "tbody"
            | "td"
            | "tfoot"
            | "th"
            | "thead"
            | "tr"
            | "ul"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn md(body: &str) -> String {
        html_to_markdown(&format!(
            "<html><head><title>T</title></head><body>{body}</body></html>"
        ))
    }

    #[test]
    fn test_headings_and_paragraphs() {
        assert_eq!(
            md("<h1>Title</h1><p>First  para.</p>\n<h3>Sub</h3><p>Second</p>"),
            "# Title\n\nFirst para.\n\n### Sub\n\nSecond\n"
        );
    }

    #[test]
    fn test_head_is_not_rendered() {
        let out = html_to_markdown(
            "<html><head><title>Hidden</title><style>p{}</style></head><body><p>Shown</p></body></html>",
        );
        assert_eq!(out, "Shown\n");
    }

    #[test]
    fn test_empty_body() {
        assert_eq!(md(""), "");
        assert_eq!(md("  \n  "), "");
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(
            md("<p>Use <strong>GenServer</strong> and <em>supervise</em> it.</p>"),
            "Use **GenServer** and *supervise* it.\n"
        );
    }

    #[test]
    fn test_emphasis_keeps_whitespace_outside() {
        assert_eq!(md("<p>a<em> b </em>c</p>"), "a *b* c\n");
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(md("<p>2 * 3 = 6_x</p>"), "2 \\* 3 = 6\\_x\n");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            md("<p>Call <code>spawn/1</code> or <code>a`b</code></p>"),
            "Call `spawn/1` or ``a`b``\n"
        );
    }

    #[test]
    fn test_code_block_with_language() {
        let out = md(
            "<pre><code class=\"language-elixir\">defmodule A do\n  def f, do: :ok\nend\n</code></pre>",
        );
        assert_eq!(out, "```elixir\ndefmodule A do\n  def f, do: :ok\nend\n```\n");
    }

    #[test]
    fn test_code_block_fence_grows() {
        let out = md("<pre>```\nnested\n```</pre>");
        assert_eq!(out, "````\n```\nnested\n```\n````\n");
    }

    #[test]
    fn test_links_and_images() {
        assert_eq!(
            md(r#"<p>See <a href="ch2.xhtml#otp">OTP</a> <img src="img/a b.png" alt="diagram"/></p>"#),
            "See [OTP](ch2.xhtml#otp) ![diagram](<img/a b.png>)\n"
        );
    }

    #[test]
    fn test_anchor_without_href_is_transparent() {
        assert_eq!(md(r#"<p><a id="x"></a>Text <a name="y">here</a></p>"#), "Text here\n");
    }

    #[test]
    fn test_hard_breaks() {
        assert_eq!(md("<p>one<br/>two<br/></p>"), "one\\\ntwo\n");
    }

    #[test]
    fn test_tight_unordered_list() {
        assert_eq!(
            md("<ul>\n<li>one</li>\n<li>two</li>\n</ul>"),
            "- one\n- two\n"
        );
    }

    #[test]
    fn test_ordered_list_with_start() {
        assert_eq!(
            md(r#"<ol start="3"><li>three</li><li>four</li></ol>"#),
            "3. three\n4. four\n"
        );
    }

    #[test]
    fn test_ordered_list_start_saturates() {
        assert_eq!(
            md(r#"<ol start="18446744073709551615"><li>a</li><li>b</li></ol>"#),
            "18446744073709551615. a\n18446744073709551615. b\n"
        );
        assert_eq!(
            md(r#"<ol start="99999999999999999999"><li>a</li></ol>"#),
            "1. a\n"
        );
    }

    #[test]
    fn test_paragraph_start_is_not_a_list() {
        assert_eq!(
            md("<p>- not a list</p><p>1984. A year</p>"),
            "\\- not a list\n\n1984\\. A year\n"
        );
        assert_eq!(md("<ul><li>+ plus</li></ul>"), "- \\+ plus\n");
    }

    #[test]
    fn test_nested_list_stays_tight() {
        assert_eq!(
            md("<ul><li>outer<ul><li>inner</li></ul></li><li>next</li></ul>"),
            "- outer\n  - inner\n- next\n"
        );
    }

    #[test]
    fn test_loose_list() {
        assert_eq!(
            md("<ol><li><p>a</p><p>b</p></li><li><p>c</p></li></ol>"),
            "1. a\n\n   b\n\n2. c\n"
        );
    }

    #[test]
    fn test_blockquote() {
        assert_eq!(
            md("<blockquote><p>one</p><p>two</p></blockquote>"),
            "> one\n>\n> two\n"
        );
    }

    #[test]
    fn test_horizontal_rule() {
        assert_eq!(md("<p>a</p><hr/><p>b</p>"), "a\n\n---\n\nb\n");
    }

    #[test]
    fn test_table() {
        let out = md(
            "<table><thead><tr><th>Name</th><th>Arity</th></tr></thead>\
             <tbody><tr><td>spawn</td><td>1</td></tr><tr><td>send</td></tr></tbody></table>",
        );
        assert_eq!(
            out,
            "| Name | Arity |\n| --- | --- |\n| spawn | 1 |\n| send |  |\n"
        );
    }

    #[test]
    fn test_definition_list() {
        assert_eq!(
            md("<dl><dt>PID</dt><dd>Process identifier</dd></dl>"),
            "PID\n\n:   Process identifier\n"
        );
    }

    #[test]
    fn test_mixed_inline_and_block_children() {
        assert_eq!(
            md("<div>Intro <b>text</b><p>para</p>tail</div>"),
            "Intro **text**\n\npara\n\ntail\n"
        );
    }

    #[test]
    fn test_scripts_are_dropped() {
        assert_eq!(md("<p>a</p><script>alert(1)</script>"), "a\n");
    }
}
