//! # folio
//!
//! Two small tools for turning book sources into other shapes.
//!
//! ## Features
//!
//! - Reformat code listings embedded in LaTeX (or any text) documents with an
//!   external formatter such as `mix format`
//! - Split an EPUB into one Markdown file per chapter, grouped by part
//!
//! ## Reformatting
//!
//! ```no_run
//! use folio::reformat::{CommandFormatter, FormatOptions, RegionSyntax, format_tree};
//!
//! let options = FormatOptions::new("contents", RegionSyntax::minted("elixir")?);
//! let report = format_tree(&options, &CommandFormatter::mix_format())?;
//! for path in report.changed() {
//!     println!("Formatted {}", path.display());
//! }
//! # Ok::<(), folio::Error>(())
//! ```
//!
//! ## Splitting
//!
//! ```no_run
//! use folio::split::{SplitOptions, outline_archive};
//!
//! let outline = outline_archive("elixir_otp.epub", &SplitOptions::default())?;
//! for (part, chapters) in outline.summary() {
//!     println!("{part}: {} chapters", chapters.len());
//! }
//! # Ok::<(), folio::Error>(())
//! ```

pub mod config;
pub mod dom;
pub mod epub;
pub mod error;
pub mod markdown;
pub mod reformat;
pub mod split;
pub(crate) mod util;

pub use config::Config;
pub use error::{Error, Result};
