//! Pure markdown escaping utilities.
//!
//! These functions handle escaping special Markdown characters and calculating
//! appropriate fence/tick lengths for code blocks and inline code.

/// Escape special Markdown characters in text.
///
/// Escapes characters that have special meaning in Markdown:
/// - Backslash: `\\`
/// - Emphasis: `*`, `_`
/// - Links: `[`, `]`
/// - Code: `` ` ``
/// - Headings: `#` (only at line start)
/// - Tables: `|`
/// - HTML: `<`, `>`
/// - Images: `!` (when followed by `[`)
///
/// # Examples
///
/// ```
/// use folio::markdown::escape_markdown;
///
/// assert_eq!(escape_markdown("*bold*"), "\\*bold\\*");
/// assert_eq!(escape_markdown("[link]"), "\\[link\\]");
/// ```
pub fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + text.len() / 10);
    let mut chars = text.chars().peekable();
    let mut at_line_start = true;

    while let Some(c) = chars.next() {
        let escape = match c {
            '\\' | '*' | '_' | '[' | ']' | '`' | '|' | '<' | '>' => true,
            '#' => at_line_start,
            '!' => chars.peek() == Some(&'['),
            _ => false,
        };
        if escape {
            result.push('\\');
        }
        result.push(c);
        at_line_start = c == '\n';
    }

    result
}

/// Escape markers that would turn the start of a line into a list item.
///
/// A leading `-` or `+` gets a backslash, as does the `.` or `)` after a
/// leading number when whitespace or the line end follows it. Apply this to
/// assembled paragraph text, after [`escape_markdown`].
///
/// # Examples
///
/// ```
/// use folio::markdown::escape_block_start;
///
/// assert_eq!(escape_block_start("- not a list"), "\\- not a list");
/// assert_eq!(escape_block_start("1984. A year"), "1984\\. A year");
/// assert_eq!(escape_block_start("3.14 is pi"), "3.14 is pi");
/// ```
pub fn escape_block_start(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 4);
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            result.push('\n');
        }
        let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
        let (lead, rest) = line.split_at(indent);
        result.push_str(lead);

        if rest.starts_with(['-', '+']) {
            result.push('\\');
            result.push_str(rest);
            continue;
        }

        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        let after = &rest[digits..];
        let is_marker = digits > 0
            && after.starts_with(['.', ')'])
            && after[1..].chars().next().is_none_or(|c| c == ' ' || c == '\t');
        if is_marker {
            result.push_str(&rest[..digits]);
            result.push('\\');
            result.push_str(after);
        } else {
            result.push_str(rest);
        }
    }
    result
}

/// Length of the longest run of `ch` in `content`.
fn longest_run(content: &str, ch: char) -> usize {
    let mut max_run = 0;
    let mut current_run = 0;

    for c in content.chars() {
        if c == ch {
            current_run += 1;
            max_run = max_run.max(current_run);
        } else {
            current_run = 0;
        }
    }

    max_run
}

/// Calculate the minimum fence length needed for a code block.
///
/// Returns the smallest number of fence characters (at least 3) that
/// doesn't appear as a run in the content.
///
/// # Examples
///
/// ```
/// use folio::markdown::calculate_fence_length;
///
/// assert_eq!(calculate_fence_length("IO.puts(1)", '`'), 3);
/// assert_eq!(calculate_fence_length("```elixir\ncode\n```", '`'), 4);
/// ```
pub fn calculate_fence_length(content: &str, fence_char: char) -> usize {
    longest_run(content, fence_char).max(2) + 1
}

/// Calculate the minimum backtick count needed for inline code.
///
/// Returns the smallest number of backticks (at least 1) that doesn't
/// appear as a run in the content.
pub fn calculate_inline_code_ticks(content: &str) -> usize {
    longest_run(content, '`') + 1
}
