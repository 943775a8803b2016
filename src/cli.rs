//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI parser for `folder-links`.
#[derive(Debug, Parser)]
#[command(
    name = "folder-links",
    version,
    about = "Replace shortcuts to folders with folder shell links"
)]
pub struct Cli {
    /// Folder to scan recursively.
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Convert without asking for confirmation.
    #[arg(short, long)]
    pub yes: bool,

    /// Print the report and stop without converting.
    #[arg(long, conflicts_with = "json")]
    pub dry_run: bool,

    /// Print the report as JSON and stop without converting.
    #[arg(long)]
    pub json: bool,

    /// YAML configuration file.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Build folder links here before moving them into place.
    #[arg(long, value_name = "DIR")]
    pub staging_dir: Option<PathBuf>,

    /// Follow symbolic links and junctions while scanning.
    #[arg(long)]
    pub follow_links: bool,
}
