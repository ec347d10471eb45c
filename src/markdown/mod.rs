//! HTML to Markdown conversion.
//!
//! - `escape`: Pure string transformation utilities for Markdown escaping
//! - `render`: Arena DOM → Markdown rendering
//!
//! ## Design Notes
//!
//! - **Text escaping**: Special Markdown characters (`*`, `_`, `[`, `` ` ``, etc.)
//!   are escaped to prevent unintended formatting
//! - **Block starts**: A paragraph line opening with `-`, `+` or `N.` is
//!   escaped so it does not read back as a list item
//! - **Tight/loose list detection**: Lists whose items hold a single block
//!   (nested lists aside) render without blank lines between items
//! - **Dynamic code fence length**: Code blocks use the minimum fence length
//!   that doesn't conflict with content

mod escape;
mod render;

pub use escape::{
    calculate_fence_length, calculate_inline_code_ticks, escape_block_start, escape_markdown,
};
pub use render::{html_to_markdown, render_document};
