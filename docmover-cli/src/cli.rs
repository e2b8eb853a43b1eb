//! Command-line interface definition for docmover.
//!
//! Every `move` option can also be supplied through a `DOCMOVER_*`
//! environment variable, so the tool can run from cron or a systemd unit
//! with its configuration in the environment.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use docmover::config::{
    DEFAULT_DUAL_SIDE_PREFIX, DEFAULT_LOCK_FILE, DEFAULT_MAX_AGE_MINUTES,
    DEFAULT_STABILITY_WAIT_SECS, normalize_file_types, parse_file_mode,
};
use docmover::{GroupOptions, MergeOptions, MoverConfig, Result};

/// Move finished scans out of a staging folder and merge duplex passes.
///
/// docmover waits until a scanner has finished writing each file, moves it
/// to an archive folder with normalized ownership and permissions, and
/// interleaves separately scanned front and back sides into one document.
#[derive(Parser, Debug)]
#[command(name = "docmover")]
#[command(version)]
#[command(about = "Move finished scans and merge dual-sided passes", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Show debug logging and per-file details
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print the report as JSON on stdout
    #[arg(long, global = true)]
    pub json: bool,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process the staging folder once
    ///
    /// Intended to run periodically. Files still being written are left
    /// for a later run.
    Move(MoveArgs),

    /// Interleave two PDFs page by page
    Merge(MergeArgs),

    /// Merge every pair of consecutively numbered PDFs in a folder
    Group(GroupArgs),
}

/// Options for `docmover move`.
#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Staging folder the scanner writes into
    #[arg(long, value_name = "DIR", env = "DOCMOVER_SOURCE_DIR")]
    pub source_dir: PathBuf,

    /// Destination for regular files
    #[arg(long, value_name = "DIR", env = "DOCMOVER_DEST_DIR")]
    pub dest_dir: PathBuf,

    /// Destination for merged dual-sided documents [default: --dest-dir]
    #[arg(long, value_name = "DIR", env = "DOCMOVER_DUAL_DEST_DIR")]
    pub dual_dest_dir: Option<PathBuf>,

    /// Folder for merges in progress [default: <source-dir>/.docmover-work]
    #[arg(long, value_name = "DIR", env = "DOCMOVER_WORK_DIR")]
    pub work_dir: Option<PathBuf>,

    /// File name prefix marking dual-sided scans
    #[arg(
        long,
        value_name = "PREFIX",
        env = "DOCMOVER_DUAL_SIDE_PREFIX",
        default_value = DEFAULT_DUAL_SIDE_PREFIX
    )]
    pub dual_side_prefix: String,

    /// Numeric owner applied to moved files
    #[arg(long, value_name = "UID", env = "DOCMOVER_USER_ID")]
    pub user_id: Option<u32>,

    /// Numeric group applied to moved files
    #[arg(long, value_name = "GID", env = "DOCMOVER_GROUP_ID")]
    pub group_id: Option<u32>,

    /// Octal permission bits applied to moved files
    #[arg(long, value_name = "MODE", env = "DOCMOVER_FILE_MODE", default_value = "660")]
    pub file_mode: String,

    /// Seconds a file must stay unchanged before it is moved
    #[arg(
        long,
        value_name = "SECS",
        env = "DOCMOVER_STABILITY_WAIT",
        default_value_t = DEFAULT_STABILITY_WAIT_SECS
    )]
    pub stability_wait: u64,

    /// Minutes after which an unpaired dual-sided scan is moved alone
    #[arg(
        long,
        value_name = "MINUTES",
        env = "DOCMOVER_MAX_AGE",
        default_value_t = DEFAULT_MAX_AGE_MINUTES
    )]
    pub max_age: u64,

    /// File extensions to pick up (comma-separated)
    #[arg(
        long,
        value_name = "EXT",
        env = "DOCMOVER_FILE_TYPES",
        value_delimiter = ',',
        default_value = "pdf,jpg,jpeg,png,tiff,tif"
    )]
    pub file_types: Vec<String>,

    /// Lock file preventing overlapping runs
    #[arg(
        long,
        value_name = "FILE",
        env = "DOCMOVER_LOCK_FILE",
        default_value = DEFAULT_LOCK_FILE
    )]
    pub lock_file: PathBuf,

    /// Keep blank pages in merged dual-sided documents
    #[arg(long)]
    pub keep_empty_pages: bool,

    /// The back side was scanned last page first
    #[arg(long, env = "DOCMOVER_REVERSE_BACK_SIDE")]
    pub reverse_back_side: bool,

    /// Report what would happen without touching any file
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

impl MoveArgs {
    /// Convert the arguments into a validated mover configuration.
    ///
    /// # Errors
    ///
    /// Returns [`docmover::DocMoverError::InvalidConfig`] if the file mode
    /// is not octal or the resulting configuration is invalid.
    pub fn to_config(&self) -> Result<MoverConfig> {
        let mut config = MoverConfig::new(&self.source_dir, &self.dest_dir);
        config.dual_dest_dir = self.dual_dest_dir.clone();
        config.work_dir = self.work_dir.clone();
        config.dual_side_prefix = self.dual_side_prefix.clone();
        config.user_id = self.user_id;
        config.group_id = self.group_id;
        config.file_mode = parse_file_mode(&self.file_mode)?;
        config.stability_wait = Duration::from_secs(self.stability_wait);
        config.max_age = Duration::from_secs(self.max_age.saturating_mul(60));
        config.file_types = normalize_file_types(&self.file_types);
        config.remove_empty_pages = !self.keep_empty_pages;
        config.reverse_back_side = self.reverse_back_side;
        config.dry_run = self.dry_run;

        config.validate()?;
        Ok(config)
    }
}

/// Options for `docmover merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Document supplying pages 1, 3, 5, ...
    #[arg(value_name = "PRIMARY")]
    pub primary: PathBuf,

    /// Document supplying pages 2, 4, 6, ...
    #[arg(value_name = "SECONDARY")]
    pub secondary: PathBuf,

    /// Output PDF path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Delete both inputs after the output is written
    #[arg(long)]
    pub delete_source: bool,

    /// Drop pages without visible content
    #[arg(long)]
    pub remove_empty_pages: bool,

    /// Take the secondary's pages last to first
    #[arg(long)]
    pub reverse_secondary: bool,
}

impl MergeArgs {
    /// Merge options selected on the command line.
    pub fn options(&self) -> MergeOptions {
        MergeOptions {
            delete_source: self.delete_source,
            remove_empty_pages: self.remove_empty_pages,
            reverse_secondary: self.reverse_secondary,
        }
    }
}

/// Options for `docmover group`.
#[derive(Args, Debug)]
pub struct GroupArgs {
    /// Folder to scan for numbered PDFs
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Where merged documents are written [default: FOLDER]
    #[arg(long, value_name = "DIR")]
    pub dest_folder: Option<PathBuf>,

    /// Delete each pair after its merge is written
    #[arg(long)]
    pub delete_source: bool,

    /// Drop pages without visible content
    #[arg(long)]
    pub remove_empty_pages: bool,

    /// List the pairs without merging
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

impl GroupArgs {
    /// Grouping options selected on the command line.
    pub fn options(&self) -> GroupOptions {
        let mut options =
            GroupOptions::new(self.dest_folder.clone().unwrap_or_else(|| self.folder.clone()));
        options.dry_run = self.dry_run;
        options.merge.delete_source = self.delete_source;
        options.merge.remove_empty_pages = self.remove_empty_pages;
        options
    }
}
