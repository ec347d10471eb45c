//! Code formatters applied to region contents.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Something that turns code into formatted code.
///
/// Implementations are shared across worker threads.
pub trait Formatter: Send + Sync {
    fn format(&self, code: &str) -> Result<String>;
}

impl<F> Formatter for F
where
    F: Fn(&str) -> Result<String> + Send + Sync,
{
    fn format(&self, code: &str) -> Result<String> {
        self(code)
    }
}

/// Runs an external program that formats a file in place.
///
/// The code is written to a uniquely named scratch file, the program is run
/// with the file path as its last argument, and the file is read back. The
/// scratch file is removed afterwards whatever the outcome.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
    suffix: String,
    scratch_dir: Option<PathBuf>,
}

impl CommandFormatter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            suffix: String::new(),
            scratch_dir: None,
        }
    }

    /// `mix format` on `.ex` scratch files.
    pub fn mix_format() -> Self {
        Self::new("mix").with_args(["format"]).with_suffix(".ex")
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// File name suffix of the scratch file, e.g. `.ex`.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.scratch_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, code: &str) -> Result<String> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("folio-").suffix(&self.suffix);
        let mut scratch = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        scratch.write_all(code.as_bytes())?;
        scratch.flush()?;

        log::trace!("Running {} on {}", self.program, scratch.path().display());
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(scratch.path())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::FormatterSpawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::Formatter {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // Read by path: the program may have replaced the file.
        let formatted = std::fs::read_to_string(scratch.path())?;
        Ok(formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_closure_formatter() {
        let formatter = |code: &str| -> Result<String> { Ok(code.trim().to_string()) };
        assert_eq!(Formatter::format(&formatter, "  x  ").unwrap(), "x");
    }

    #[test]
    fn test_mix_format_defaults() {
        let formatter = CommandFormatter::mix_format();
        assert_eq!(formatter.program(), "mix");
        assert_eq!(formatter.args(), ["format"]);
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let scratch = TempDir::new().unwrap();
        let formatter =
            CommandFormatter::new("folio-no-such-formatter").with_scratch_dir(scratch.path());

        let err = formatter.format("x = 1").unwrap_err();
        assert!(matches!(err, Error::FormatterSpawn { .. }));
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_formatter_rewrites_scratch_file() {
        let scratch = TempDir::new().unwrap();
        let formatter = CommandFormatter::new("sh")
            .with_args(["-c", r#"tr a-z A-Z < "$0" > "$0.out" && mv "$0.out" "$0""#])
            .with_suffix(".ex")
            .with_scratch_dir(scratch.path());

        assert_eq!(formatter.format("x = 1\n").unwrap(), "X = 1\n");
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_scratch_file_has_suffix() {
        let scratch = TempDir::new().unwrap();
        let formatter = CommandFormatter::new("sh")
            .with_args(["-c", r#"case "$0" in *.ex) exit 0;; *) exit 1;; esac"#])
            .with_suffix(".ex")
            .with_scratch_dir(scratch.path());

        assert_eq!(formatter.format("x").unwrap(), "x");
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_reports_stderr() {
        let scratch = TempDir::new().unwrap();
        let formatter = CommandFormatter::new("sh")
            .with_args(["-c", "echo 'syntax error' >&2; exit 3"])
            .with_scratch_dir(scratch.path());

        match formatter.format("x =").unwrap_err() {
            Error::Formatter { program, stderr, .. } => {
                assert_eq!(program, "sh");
                assert_eq!(stderr, "syntax error");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_dir(scratch.path()).unwrap().count(), 0);
    }
}
