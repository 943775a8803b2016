//! Tree scanner: finds shortcuts that point at existing folders.
//!
//! The scan is best-effort: errors raised while enumerating the tree are
//! collected as [`DiscoveryError`] values and traversal carries on. Only a
//! root that cannot be listed at all fails the whole scan.
//!
//! Per-candidate problems are never errors. A shortcut with no fixed target,
//! or one whose target is missing or is not a folder, is simply left out.

pub mod error;
pub mod long_path;

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use crate::context::ServiceContext;

pub use error::{path_len, DiscoveryError, ScanError};
pub use long_path::{rescan_too_long, LongPathReport, UnlistedDir};

/// File name of the shortcut copy embedded in a folder shell link.
pub const MARKER_SHORTCUT_NAME: &str = "target.lnk";

/// Extension of shortcut files.
pub const SHORTCUT_EXTENSION: &str = "lnk";

/// Longest path the standard path APIs accept.
pub const DEFAULT_MAX_PATH_LEN: usize = 259;

/// A shortcut together with its resolved target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedShortcut {
    /// Absolute path of the shortcut file.
    pub shortcut: PathBuf,
    /// The path recorded in the shortcut.
    pub target: PathBuf,
    /// Whether the target is a folder that currently exists.
    pub target_is_existing_folder: bool,
}

/// Result of a scan: accepted shortcuts plus recovered traversal errors.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    /// Shortcuts to existing folders, in discovery order.
    pub accepted: Vec<ClassifiedShortcut>,
    /// Errors raised while enumerating the tree.
    pub errors: Vec<DiscoveryError>,
}

impl ScanOutcome {
    /// Iterates over the `TooLongPath` errors.
    pub fn too_long(&self) -> impl Iterator<Item = &DiscoveryError> {
        self.errors.iter().filter(|e| matches!(e, DiscoveryError::TooLongPath { .. }))
    }
}

/// Traversal settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Follow symbolic links and junctions while walking.
    pub follow_links: bool,
    /// Directories with longer paths are reported and not descended into.
    /// Longer file paths get their folder reported instead.
    pub max_path_len: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self { follow_links: false, max_path_len: DEFAULT_MAX_PATH_LEN }
    }
}

/// Recursively discovers folder shortcuts under a root.
///
/// Target resolution and classification go through the context's
/// `resolver` and `classifier` ports.
pub struct TreeScanner<'a> {
    ctx: &'a ServiceContext,
    options: ScanOptions,
}

impl<'a> TreeScanner<'a> {
    /// Creates a scanner using the given context's ports.
    #[must_use]
    pub fn new(ctx: &'a ServiceContext, options: ScanOptions) -> Self {
        Self { ctx, options }
    }

    /// Scans `root` and partitions what it finds.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist, is not a folder, or cannot
    /// be listed. Failures deeper in the tree are returned in
    /// [`ScanOutcome::errors`] instead.
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome, ScanError> {
        let absolute = std::path::absolute(root)
            .map_err(|source| ScanError::RootUnavailable { path: root.to_path_buf(), source })?;
        let root = absolute.as_path();
        check_root(root)?;
        tracing::info!(root = %root.display(), "scanning for folder shortcuts");

        let mut outcome = ScanOutcome::default();
        let mut flagged: HashSet<PathBuf> = HashSet::new();
        let mut entries = WalkDir::new(root)
            .follow_links(self.options.follow_links)
            .sort_by_file_name()
            .into_iter();

        while let Some(next) = entries.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(err) => {
                    let error = DiscoveryError::from_walk(&err, root);
                    tracing::warn!(%error, "enumeration error");
                    outcome.errors.push(error);
                    continue;
                }
            };

            let length = path_len(entry.path());
            if entry.file_type().is_dir() {
                if length > self.options.max_path_len {
                    tracing::warn!(path = %entry.path().display(), length, "directory path too long");
                    outcome
                        .errors
                        .push(DiscoveryError::TooLongPath { path: entry.into_path(), length });
                    entries.skip_current_dir();
                }
                continue;
            }

            if length > self.options.max_path_len {
                tracing::warn!(path = %entry.path().display(), length, "file path too long");
                // The folder is reported once; the fallback lists what is inside.
                if let Some(parent) = entry.path().parent() {
                    if flagged.insert(parent.to_path_buf()) {
                        outcome.errors.push(DiscoveryError::TooLongPath {
                            path: parent.to_path_buf(),
                            length: path_len(parent),
                        });
                    }
                }
                continue;
            }

            if entry.file_type().is_file() && is_candidate(entry.file_name()) {
                if let Some(classified) = self.classify_candidate(entry.path()) {
                    outcome.accepted.push(classified);
                }
            }
        }

        tracing::info!(
            accepted = outcome.accepted.len(),
            errors = outcome.errors.len(),
            "scan finished"
        );
        Ok(outcome)
    }

    fn classify_candidate(&self, shortcut: &Path) -> Option<ClassifiedShortcut> {
        let Some(target) =
            self.ctx.resolver.resolve(shortcut).filter(|t| !t.as_os_str().is_empty())
        else {
            tracing::debug!(shortcut = %shortcut.display(), "no fixed target");
            return None;
        };

        let kind = self.ctx.classifier.classify(&target);
        if !kind.is_existing_folder() {
            tracing::debug!(
                shortcut = %shortcut.display(),
                target = %target.display(),
                exists = kind.exists,
                "target is not an existing folder"
            );
            return None;
        }

        tracing::debug!(shortcut = %shortcut.display(), target = %target.display(), "accepted");
        Some(ClassifiedShortcut {
            shortcut: shortcut.to_path_buf(),
            target,
            target_is_existing_folder: true,
        })
    }
}

/// Returns `true` for `*.lnk` names other than the embedded marker shortcut.
#[must_use]
pub fn is_candidate(file_name: &OsStr) -> bool {
    let name = file_name.to_string_lossy();
    let is_shortcut = Path::new(name.as_ref())
        .extension()
        .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(SHORTCUT_EXTENSION));
    is_shortcut && !name.eq_ignore_ascii_case(MARKER_SHORTCUT_NAME)
}

fn check_root(root: &Path) -> Result<(), ScanError> {
    let metadata = std::fs::metadata(root)
        .map_err(|source| ScanError::RootUnavailable { path: root.to_path_buf(), source })?;
    if !metadata.is_dir() {
        return Err(ScanError::NotADirectory { path: root.to_path_buf() });
    }
    std::fs::read_dir(root)
        .map_err(|source| ScanError::RootUnavailable { path: root.to_path_buf(), source })?;
    Ok(())
}
