//! Core library entry for the `folder-links` CLI.
//!
//! Scans a folder tree for shortcuts that point at existing folders and
//! replaces each with a folder shell link: a read-only folder holding a
//! hidden `desktop.ini` and a copy of the shortcut, which the Windows shell
//! opens as if it were the target while other tools see a plain folder.

pub mod adapters;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod logging;
pub mod materialize;
pub mod ports;
pub mod report;
pub mod scan;
pub mod shell_link;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails, the root cannot be
/// scanned, or any conversion fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = match cli::Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            print!("{err}");
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };
    commands::dispatch(&cli)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_scans_empty_folder() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_string_lossy().into_owned();
        assert!(run(["folder-links", root.as_str(), "--dry-run"]).is_ok());
    }

    #[test]
    fn run_errors_on_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("missing").to_string_lossy().into_owned();
        let err = run(["folder-links", root.as_str(), "--dry-run"]).unwrap_err();
        assert!(err.contains("cannot read root folder"));
    }

    #[test]
    fn run_errors_on_unknown_flag() {
        assert!(run(["folder-links", "--frobnicate"]).is_err());
    }

    #[test]
    fn help_is_not_an_error() {
        assert!(run(["folder-links", "--help"]).is_ok());
    }
}
