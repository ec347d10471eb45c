//! Configuration for both tools.
//!
//! Values come from built-in defaults, then an optional `folio.toml`, then
//! command-line flags (applied by the binary).
//!
//! ```toml
//! [fmt]
//! root = "contents"
//! extensions = ["tex"]
//! formatter = ["mix", "format"]
//! suffix = ".ex"
//!
//! [split]
//! archive = "elixir_otp.epub"
//! part-token = "Part"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::reformat::{CommandFormatter, DEFAULT_BEGIN, DEFAULT_END, FormatOptions, RegionSyntax};
use crate::split::SplitOptions;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "folio.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Config {
    pub fmt: FmtConfig,
    pub split: SplitConfig,
}

/// Settings for `folio fmt`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FmtConfig {
    /// Directory searched for documents.
    pub root: PathBuf,
    /// Document extensions, without the dot.
    pub extensions: Vec<String>,
    /// Literal line that opens a code region.
    pub begin: String,
    /// Literal text that closes a code region.
    pub end: String,
    /// Formatter program followed by its arguments; the scratch file path is
    /// appended.
    pub formatter: Vec<String>,
    /// Suffix of the scratch file handed to the formatter.
    pub suffix: String,
    /// Where scratch files are created (system temp dir when unset).
    pub scratch_dir: Option<PathBuf>,
    /// Worker threads (hardware parallelism when unset).
    pub jobs: Option<usize>,
}

impl Default for FmtConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("contents"),
            extensions: vec!["tex".to_string()],
            begin: DEFAULT_BEGIN.to_string(),
            end: DEFAULT_END.to_string(),
            formatter: vec!["mix".to_string(), "format".to_string()],
            suffix: ".ex".to_string(),
            scratch_dir: None,
            jobs: None,
        }
    }
}

impl FmtConfig {
    pub fn region_syntax(&self) -> Result<RegionSyntax> {
        RegionSyntax::new(&self.begin, &self.end)
    }

    pub fn command_formatter(&self) -> Result<CommandFormatter> {
        let (program, args) = self
            .formatter
            .split_first()
            .ok_or_else(|| Error::Config("formatter command is empty".into()))?;

        let mut formatter = CommandFormatter::new(program)
            .with_args(args.iter().cloned())
            .with_suffix(&self.suffix);
        if let Some(dir) = &self.scratch_dir {
            formatter = formatter.with_scratch_dir(dir);
        }
        Ok(formatter)
    }

    pub fn format_options(&self) -> Result<FormatOptions> {
        if self.jobs == Some(0) {
            return Err(Error::Config("jobs must be at least 1".into()));
        }
        Ok(FormatOptions {
            root: self.root.clone(),
            extensions: self.extensions.clone(),
            syntax: self.region_syntax()?,
            jobs: self.jobs,
            check: false,
        })
    }
}

/// Settings for `folio split`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SplitConfig {
    /// EPUB to split.
    pub archive: PathBuf,
    /// Output directory (archive path without extension when unset).
    pub destination: Option<PathBuf>,
    /// Substring that marks a title as a part.
    pub part_token: String,
    /// Title used for documents without one.
    pub placeholder: String,
    /// Extension of chapter files, without the dot.
    pub extension: String,
}

impl Default for SplitConfig {
    fn default() -> Self {
        let options = SplitOptions::default();
        Self {
            archive: PathBuf::from("elixir_otp.epub"),
            destination: None,
            part_token: options.part_token,
            placeholder: options.placeholder,
            extension: options.extension,
        }
    }
}

impl SplitConfig {
    /// The output directory, defaulting to the archive path minus extension.
    pub fn destination(&self) -> PathBuf {
        self.destination
            .clone()
            .unwrap_or_else(|| self.archive.with_extension(""))
    }

    pub fn split_options(&self) -> Result<SplitOptions> {
        if self.part_token.is_empty() {
            return Err(Error::Config("part-token must not be empty".into()));
        }
        Ok(SplitOptions {
            part_token: self.part_token.clone(),
            placeholder: self.placeholder.clone(),
            extension: self.extension.trim_start_matches('.').to_string(),
        })
    }
}

impl Config {
    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, `folio.toml` in the working
    /// directory is used when present, otherwise the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(CONFIG_FILE_NAME);
                if !default.is_file() {
                    return Ok(Self::default());
                }
                default
            }
        };

        log::debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}
