//! Scan report: what will be converted and what could not be examined.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::scan::{ClassifiedShortcut, DiscoveryError, LongPathReport, ScanOutcome, UnlistedDir};

/// A directory the scanner did not descend into because of its length.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TooLongDir {
    /// The directory.
    pub path: PathBuf,
    /// Its length in UTF-16 code units.
    pub length: usize,
}

/// An enumeration error without a more specific category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OtherError {
    /// The path being enumerated.
    pub path: PathBuf,
    /// Why it failed.
    pub cause: String,
}

/// Everything found by one scan, grouped for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The scanned root.
    pub root: PathBuf,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
    /// The path-length limit in force.
    pub max_path_len: usize,
    /// Shortcuts to existing folders, in discovery order.
    pub accepted: Vec<ClassifiedShortcut>,
    /// Directories beyond the limit.
    pub too_long_directories: Vec<TooLongDir>,
    /// Over-long subfolders below those directories.
    pub over_long_subfolders: Vec<PathBuf>,
    /// Over-long files below those directories.
    pub over_long_files: Vec<PathBuf>,
    /// Items that were not found during enumeration.
    pub missing_targets: Vec<PathBuf>,
    /// Items on drives that are not available.
    pub missing_drives: Vec<PathBuf>,
    /// Any other enumeration failures.
    pub other_errors: Vec<OtherError>,
    /// Over-long directories the fallback could not list.
    pub unlisted: Vec<UnlistedDir>,
}

impl Report {
    /// Groups a scan outcome and its long-path follow-up.
    #[must_use]
    pub fn build(
        root: PathBuf,
        generated_at: DateTime<Utc>,
        max_path_len: usize,
        outcome: ScanOutcome,
        long_paths: LongPathReport,
    ) -> Self {
        let mut report = Self {
            root,
            generated_at,
            max_path_len,
            accepted: outcome.accepted,
            too_long_directories: Vec::new(),
            over_long_subfolders: long_paths.over_long_subfolders,
            over_long_files: long_paths.over_long_files,
            missing_targets: Vec::new(),
            missing_drives: Vec::new(),
            other_errors: Vec::new(),
            unlisted: long_paths.unlisted,
        };
        for error in outcome.errors {
            match error {
                // A folder within the limit was only flagged for the files in it.
                DiscoveryError::TooLongPath { path, length } if length > max_path_len => {
                    report.too_long_directories.push(TooLongDir { path, length });
                }
                DiscoveryError::TooLongPath { .. } => {}
                DiscoveryError::TargetNotFound { path } => report.missing_targets.push(path),
                DiscoveryError::TargetDriveUnavailable { path } => report.missing_drives.push(path),
                DiscoveryError::Other { path, cause } => {
                    report.other_errors.push(OtherError { path, cause });
                }
            }
        }
        report
    }

    /// Returns `true` if any enumeration problem was recorded.
    #[must_use]
    pub fn has_problems(&self) -> bool {
        !(self.too_long_directories.is_empty()
            && self.over_long_subfolders.is_empty()
            && self.over_long_files.is_empty()
            && self.missing_targets.is_empty()
            && self.missing_drives.is_empty()
            && self.other_errors.is_empty()
            && self.unlisted.is_empty())
    }

    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.accepted.is_empty() {
            writeln!(f, "No folder shortcuts found under {}.", self.root.display())?;
        } else {
            writeln!(f, "Folder shortcuts under {}:", self.root.display())?;
            for item in &self.accepted {
                writeln!(f, "  {} -> {}", item.shortcut.display(), item.target.display())?;
            }
        }

        let limit = self.max_path_len;
        section(
            f,
            &format!("Folders longer than {limit} characters (not scanned)"),
            &self.too_long_directories,
            |d| format!("[{}] {}", d.length, d.path.display()),
        )?;
        section(
            f,
            &format!("Subfolders longer than {limit} characters"),
            &self.over_long_subfolders,
            |p| p.display().to_string(),
        )?;
        section(
            f,
            &format!("Files longer than {limit} characters"),
            &self.over_long_files,
            |p| p.display().to_string(),
        )?;
        section(f, "Items not found", &self.missing_targets, |p| p.display().to_string())?;
        section(f, "Drives not available", &self.missing_drives, |p| p.display().to_string())?;
        section(f, "Other errors", &self.other_errors, |e| {
            format!("{}: {}", e.path.display(), e.cause)
        })?;
        section(f, "Folders that could not be listed", &self.unlisted, |u| {
            format!("{}: {}", u.path.display(), u.cause)
        })
    }
}

fn section<T>(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    items: &[T],
    line: impl Fn(&T) -> String,
) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, "{title}:")?;
    for item in items {
        writeln!(f, "  {}", line(item))?;
    }
    Ok(())
}
