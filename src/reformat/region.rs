use std::ops::Range;

use regex::Regex;

use crate::error::{Error, Result};
use crate::reformat::formatter::Formatter;

/// Opening marker of the default region: a numbered Elixir `minted` listing.
pub const DEFAULT_BEGIN: &str = r"\begin{minted}[linenos]{elixir}";
/// Closing marker of the default region.
pub const DEFAULT_END: &str = r"\end{minted}";

/// Delimiters of an embedded code region.
///
/// A region starts at the begin marker immediately followed by a line break
/// and runs, across lines, to the first following end marker. Both markers
/// are matched literally.
#[derive(Debug, Clone)]
pub struct RegionSyntax {
    begin: String,
    end: String,
    pattern: Regex,
}

/// Location of one region in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Byte range of the whole region, markers included.
    pub span: Range<usize>,
    /// Byte range of the code between the markers.
    pub content: Range<usize>,
}

/// Result of rewriting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewrite {
    pub text: String,
    pub regions: usize,
}

impl RegionSyntax {
    pub fn new(begin: &str, end: &str) -> Result<Self> {
        if begin.is_empty() || end.is_empty() {
            return Err(Error::Config("region markers must not be empty".into()));
        }
        let source = format!(
            r"(?s){}\r?\n(.*?){}",
            regex::escape(begin),
            regex::escape(end)
        );
        let pattern = Regex::new(&source).map_err(|e| Error::Config(e.to_string()))?;
        Ok(Self {
            begin: begin.to_string(),
            end: end.to_string(),
            pattern,
        })
    }

    /// `minted` environment with line numbers for the given language.
    pub fn minted(language: &str) -> Result<Self> {
        Self::new(
            &format!(r"\begin{{minted}}[linenos]{{{language}}}"),
            DEFAULT_END,
        )
    }

    pub fn begin(&self) -> &str {
        &self.begin
    }

    pub fn end(&self) -> &str {
        &self.end
    }

    /// Find every region, left to right, without overlap.
    pub fn find(&self, text: &str) -> Vec<Region> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let span = caps.get(0)?.range();
                let content = caps.get(1)?.range();
                Some(Region { span, content })
            })
            .collect()
    }

    /// Wrap formatted code back into a region.
    pub fn wrap(&self, code: &str) -> String {
        let mut out = String::with_capacity(self.begin.len() + code.len() + self.end.len() + 2);
        out.push_str(&self.begin);
        out.push('\n');
        out.push_str(code);
        if !code.is_empty() && !code.ends_with('\n') {
            out.push('\n');
        }
        out.push_str(&self.end);
        out
    }

    /// Replace each region with its formatted counterpart.
    ///
    /// Region code is trimmed before it reaches the formatter. Text outside
    /// regions is copied unchanged. The first formatter error aborts the
    /// rewrite.
    pub fn rewrite(&self, text: &str, formatter: &dyn Formatter) -> Result<Rewrite> {
        let regions = self.find(text);
        if regions.is_empty() {
            return Ok(Rewrite {
                text: text.to_string(),
                regions: 0,
            });
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for region in &regions {
            out.push_str(&text[last..region.span.start]);
            let code = text[region.content.clone()].trim();
            let formatted = formatter.format(code)?;
            out.push_str(&self.wrap(&formatted));
            last = region.span.end;
        }
        out.push_str(&text[last..]);

        Ok(Rewrite {
            text: out,
            regions: regions.len(),
        })
    }
}
