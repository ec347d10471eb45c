//! folio - Reformat embedded code listings and split EPUB books

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;

use folio::config::{Config, FmtConfig, SplitConfig};
use folio::reformat::format_tree;
use folio::split::{outline_archive, split_archive};

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Reformat embedded code listings and split EPUB books", long_about = None)]
#[command(after_help = "EXAMPLES:
    folio fmt                       Reformat minted Elixir listings under contents/
    folio fmt --check book/         List documents that would change
    folio split book.epub out/      Write out/<Part>/<Chapter>.md
    folio split --dry-run --json    Print the outline of elixir_otp.epub")]
struct Cli {
    /// Configuration file (default: folio.toml if present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only report errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Reformat code regions of every document under a directory
    Fmt(FmtArgs),
    /// Split an EPUB into Markdown chapters grouped by part
    Split(SplitArgs),
}

#[derive(Args)]
struct FmtArgs {
    /// Directory to search (default: contents)
    #[arg(value_name = "ROOT")]
    root: Option<PathBuf>,

    /// Document extension to process (repeatable)
    #[arg(long = "ext", value_name = "EXT")]
    extensions: Vec<String>,

    /// Line opening a code region
    #[arg(long, value_name = "MARKER", allow_hyphen_values = true)]
    begin: Option<String>,

    /// Text closing a code region
    #[arg(long, value_name = "MARKER", allow_hyphen_values = true)]
    end: Option<String>,

    /// Formatter command; the scratch file path is appended
    #[arg(long, value_name = "CMD", allow_hyphen_values = true)]
    formatter: Option<String>,

    /// Suffix of the scratch file given to the formatter
    #[arg(long, value_name = "SUFFIX")]
    suffix: Option<String>,

    /// Directory for scratch files (default: system temp dir)
    #[arg(long, value_name = "DIR")]
    scratch_dir: Option<PathBuf>,

    /// Number of worker threads
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Report documents that would change without writing them
    #[arg(long)]
    check: bool,
}

#[derive(Args)]
struct SplitArgs {
    /// EPUB to split (default: elixir_otp.epub)
    #[arg(value_name = "ARCHIVE")]
    archive: Option<PathBuf>,

    /// Output directory, which must not exist (default: ARCHIVE without extension)
    #[arg(value_name = "DEST")]
    destination: Option<PathBuf>,

    /// Substring marking a part title
    #[arg(long, value_name = "TOKEN")]
    part_token: Option<String>,

    /// Title for documents without one
    #[arg(long, value_name = "TITLE")]
    placeholder: Option<String>,

    /// Print the outline instead of writing files
    #[arg(long)]
    dry_run: bool,

    /// Print the dry-run outline as JSON
    #[arg(long, requires = "dry_run")]
    json: bool,
}

impl FmtArgs {
    fn apply(&self, config: &mut FmtConfig) {
        if let Some(root) = &self.root {
            config.root = root.clone();
        }
        if !self.extensions.is_empty() {
            config.extensions = self.extensions.clone();
        }
        if let Some(begin) = &self.begin {
            config.begin = begin.clone();
        }
        if let Some(end) = &self.end {
            config.end = end.clone();
        }
        if let Some(command) = &self.formatter {
            config.formatter = command.split_whitespace().map(String::from).collect();
        }
        if let Some(suffix) = &self.suffix {
            config.suffix = suffix.clone();
        }
        if let Some(dir) = &self.scratch_dir {
            config.scratch_dir = Some(dir.clone());
        }
        if self.jobs.is_some() {
            config.jobs = self.jobs;
        }
    }
}

impl SplitArgs {
    fn apply(&self, config: &mut SplitConfig) {
        if let Some(archive) = &self.archive {
            config.archive = archive.clone();
        }
        if let Some(destination) = &self.destination {
            config.destination = Some(destination.clone());
        }
        if let Some(token) = &self.part_token {
            config.part_token = token.clone();
        }
        if let Some(placeholder) = &self.placeholder {
            config.placeholder = placeholder.clone();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);

    let result = Config::load(cli.config.as_deref()).and_then(|mut config| match &cli.command {
        Command::Fmt(args) => {
            args.apply(&mut config.fmt);
            run_fmt(&config.fmt, args.check)
        }
        Command::Split(args) => {
            args.apply(&mut config.split);
            run_split(&config.split, args)
        }
    });

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(quiet: bool, verbose: u8) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

/// Returns whether the run succeeded.
fn run_fmt(config: &FmtConfig, check: bool) -> folio::Result<bool> {
    let mut options = config.format_options()?;
    options.check = check;
    let formatter = config.command_formatter()?;

    let report = format_tree(&options, &formatter)?;
    for (path, e) in &report.failures {
        eprintln!("error: {}: {e}", path.display());
    }

    let changed = report.changed().count();
    if check {
        for path in report.changed() {
            println!("{}", path.display());
        }
        log::info!(
            "{changed} of {} documents would be reformatted",
            report.outcomes.len()
        );
    } else {
        log::info!(
            "Reformatted {changed} of {} documents ({} regions)",
            report.outcomes.len(),
            report.regions()
        );
    }

    Ok(report.is_success() && !(check && changed > 0))
}

fn run_split(config: &SplitConfig, args: &SplitArgs) -> folio::Result<bool> {
    let options = config.split_options()?;

    if args.dry_run {
        let outline = outline_archive(&config.archive, &options)?;
        if args.json {
            println!("{}", outline.to_json()?);
        } else {
            for (part, chapters) in outline.summary() {
                println!("{part}");
                for chapter in chapters {
                    println!("  {chapter}");
                }
            }
        }
        return Ok(true);
    }

    split_archive(&config.archive, config.destination(), &options)?;
    Ok(true)
}
