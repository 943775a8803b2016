//! Long-path fallback scanner.
//!
//! Once a directory's own path is beyond the limit the walker does not
//! descend into it, so its contents are unknown. This re-lists the immediate
//! children of each such directory through the limit-tolerant
//! [`ChildLister`] port and keeps only those whose joined path is itself
//! over the limit. It looks exactly one level down.
//!
//! A directory within the limit can also be listed here, when the walker
//! found files in it whose paths are too long.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::error::{path_len, DiscoveryError};
use crate::ports::ChildLister;

/// A directory the fallback lister could not read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnlistedDir {
    /// The over-long directory.
    pub path: PathBuf,
    /// Why listing failed.
    pub cause: String,
}

/// Over-long children found below over-long directories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LongPathReport {
    /// Subfolders whose full path exceeds the limit.
    pub over_long_subfolders: Vec<PathBuf>,
    /// Files whose full path exceeds the limit.
    pub over_long_files: Vec<PathBuf>,
    /// Directories that could not be listed at all.
    pub unlisted: Vec<UnlistedDir>,
}

/// Re-lists the children of every `TooLongPath` directory in `errors`.
///
/// Other error variants are ignored. Subfolders that are `TooLongPath`
/// errors themselves are reported there and not repeated here.
#[must_use]
pub fn rescan_too_long(
    lister: &dyn ChildLister,
    errors: &[DiscoveryError],
    max_path_len: usize,
) -> LongPathReport {
    let mut report = LongPathReport::default();
    let reported: HashSet<&Path> = errors
        .iter()
        .filter(|e| matches!(e, DiscoveryError::TooLongPath { .. }))
        .map(DiscoveryError::path)
        .collect();

    for error in errors {
        let DiscoveryError::TooLongPath { path, .. } = error else {
            continue;
        };
        tracing::debug!(dir = %path.display(), "listing over-long directory");

        match lister.subfolders(path) {
            Ok(children) => report.over_long_subfolders.extend(
                children
                    .into_iter()
                    .filter(|c| path_len(c) > max_path_len && !reported.contains(c.as_path())),
            ),
            Err(e) => {
                tracing::warn!(dir = %path.display(), error = %e, "cannot list subfolders");
                report.unlisted.push(UnlistedDir { path: path.clone(), cause: e.to_string() });
                continue;
            }
        }

        match lister.files(path) {
            Ok(children) => report
                .over_long_files
                .extend(children.into_iter().filter(|c| path_len(c) > max_path_len)),
            Err(e) => {
                tracing::warn!(dir = %path.display(), error = %e, "cannot list files");
                report.unlisted.push(UnlistedDir { path: path.clone(), cause: e.to_string() });
            }
        }
    }

    report
}
