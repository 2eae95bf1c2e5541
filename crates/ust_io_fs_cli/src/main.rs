//! `ust` - command-line front end for the `ust_io_fs` engines.
//!
//! Subcommands: `cp`, `mv`, `rm`, `grep`, `cmp`. Every switch maps to one
//! mode flag. Exit codes: 0 success, 1 `cmp` found a difference, 2 error.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::info;
use ust_io_fs::{Mode, PathSpec};

#[derive(Debug, Parser)]
#[command(name = "ust", version, about = "Flag-driven copy, move, remove, grep and compare")]
pub struct Cli {
    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Warnings and errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Copy files or directories
    Cp(ArgsCopy),
    /// Move files or directories
    Mv(ArgsMove),
    /// Remove files or directories
    Rm(ArgsRemove),
    /// Search a file or a text with a regex
    Grep(ArgsGrep),
    /// Compare two files or two directories
    Cmp(ArgsCompare),
}

#[derive(Debug, Args)]
pub struct ArgsCopy {
    /// Source paths or one glob pattern
    #[arg(required = true, num_args = 1..)]
    sources: Vec<String>,
    /// Destination; a trailing separator makes it a directory
    dest: String,
    /// Replace an existing destination
    #[arg(short, long)]
    force: bool,
    /// Keep an existing destination
    #[arg(short, long)]
    ignore: bool,
    /// Replace only when the source is newer
    #[arg(short, long)]
    update: bool,
    /// Merge directories file by file; lets `**` span directories
    #[arg(short, long)]
    recursive: bool,
    /// Treat the destination as a directory collecting every source
    #[arg(short, long)]
    target_directory: bool,
}

#[derive(Debug, Args)]
pub struct ArgsMove {
    /// Source paths or one glob pattern
    #[arg(required = true, num_args = 1..)]
    sources: Vec<String>,
    /// Destination path
    dest: String,
    /// Fail when the destination exists
    #[arg(long)]
    no_force: bool,
    /// Replace a destination of another node type
    #[arg(short, long)]
    recursive: bool,
    /// Treat the destination as a directory collecting every source
    #[arg(short, long)]
    target_directory: bool,
}

#[derive(Debug, Args)]
pub struct ArgsRemove {
    /// Paths or one glob pattern
    #[arg(required = true, num_args = 1..)]
    paths: Vec<String>,
    /// Remove directories
    #[arg(long)]
    dir: bool,
    /// Remove files
    #[arg(long)]
    file: bool,
    /// Remove empty directories only
    #[arg(short = 'd', long)]
    empty: bool,
    /// Let `**` span directories
    #[arg(short, long)]
    recursive: bool,
}

#[derive(Debug, Args)]
pub struct ArgsGrep {
    /// Regular expression
    pattern: String,
    /// File path or literal text
    anchor: String,
    /// 0: whole match, n: group n, negative: every match
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    index: isize,
}

#[derive(Debug, Args)]
pub struct ArgsCompare {
    path1: String,
    path2: String,
    /// Trust equal size and mtime
    #[arg(short, long)]
    shallow: bool,
    /// Byte-wise compare
    #[arg(short, long)]
    binary: bool,
    /// Line-wise compare
    #[arg(short, long)]
    text: bool,
    /// Skip line pairs that are both blank
    #[arg(short = 'B', long)]
    ignore_blank_lines: bool,
    /// Compare lines case-insensitively
    #[arg(short, long)]
    ignore_case: bool,
}

fn collect_mode(l_flags: &[(bool, Mode)]) -> Mode {
    l_flags
        .iter()
        .filter(|(b_set, _)| *b_set)
        .fold(Mode::NOSET, |mode, (_, mode_flag)| mode | *mode_flag)
}

/// Absolute form of `value`, keeping a trailing separator and glob
/// characters untouched.
fn absolutize(value: &str) -> Result<String> {
    if Path::new(value).is_absolute() {
        return Ok(value.to_string());
    }
    let path_cwd = std::env::current_dir().context("cannot read the current directory")?;
    Ok(path_cwd.join(value).to_string_lossy().into_owned())
}

fn build_path_spec(l_values: &[String]) -> Result<PathSpec> {
    let l_values = l_values
        .iter()
        .map(|value| absolutize(value))
        .collect::<Result<Vec<_>>>()?;
    Ok(match l_values.as_slice() {
        [value] => PathSpec::parse(value),
        _ => PathSpec::Many(l_values.into_iter().map(PathBuf::from).collect()),
    })
}

impl ArgsCopy {
    fn mode(&self) -> Mode {
        collect_mode(&[
            (self.force, Mode::FORCE),
            (self.ignore, Mode::IGNORE),
            (self.update, Mode::UPDATE),
            (self.recursive, Mode::RECURSIVE),
            (self.target_directory, Mode::TARGET_DIRECTORY),
        ])
    }
}

impl ArgsMove {
    fn mode(&self) -> Mode {
        collect_mode(&[
            (!self.no_force, Mode::FORCE),
            (self.recursive, Mode::RECURSIVE),
            (self.target_directory, Mode::TARGET_DIRECTORY),
        ])
    }
}

impl ArgsRemove {
    fn mode(&self) -> Mode {
        collect_mode(&[
            (self.dir, Mode::RM_DIR),
            (self.file, Mode::RM_FILE),
            (self.empty, Mode::RM_EMPTY),
            (self.recursive, Mode::RECURSIVE),
        ])
    }
}

impl ArgsCompare {
    fn mode(&self) -> Mode {
        collect_mode(&[
            (self.shallow, Mode::SHALLOW),
            (self.binary, Mode::BINARY),
            (self.text, Mode::TEXT),
            (self.ignore_blank_lines, Mode::IGNORE_BLANK_LINES),
            (self.ignore_case, Mode::IGNORE_CASE),
        ])
    }
}

/// Run one parsed command. `Ok(false)` means `cmp` found a difference.
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Cp(args) => {
            let spec_src = build_path_spec(&args.sources)?;
            let report = ust_io_fs::copy(spec_src, absolutize(&args.dest)?, args.mode())?;
            info!("{}", report.format("[CP]"));
        }
        Commands::Mv(args) => {
            let spec_src = build_path_spec(&args.sources)?;
            let report = ust_io_fs::move_to(spec_src, absolutize(&args.dest)?, args.mode())?;
            info!("{}", report.format("[MV]"));
        }
        Commands::Rm(args) => {
            let spec_path = build_path_spec(&args.paths)?;
            let report = ust_io_fs::remove(spec_path, args.mode())?;
            info!("{}", report.format("[RM]"));
        }
        Commands::Grep(args) => {
            for c_found in ust_io_fs::grep(&args.anchor, args.pattern.as_str(), args.index)? {
                println!("{c_found}");
            }
        }
        Commands::Cmp(args) => {
            let path1 = PathBuf::from(absolutize(&args.path1)?);
            let path2 = PathBuf::from(absolutize(&args.path2)?);
            let b_equal = if path1.is_dir() && path2.is_dir() {
                ust_io_fs::compare_directories(&path1, &path2, args.mode())?
            } else {
                ust_io_fs::compare_files(&path1, &path2, args.mode())?
            };
            info!("[CMP] equal={b_equal}");
            return Ok(b_equal);
        }
    }
    Ok(true)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    ust_log::init(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("ust: {e:#}");
            ExitCode::from(2)
        }
    }
}
