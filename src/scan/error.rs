//! Discovery and scan failures.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

#[cfg(windows)]
mod codes {
    pub const NAME_TOO_LONG: &[i32] = &[206];
    pub const DRIVE_UNAVAILABLE: &[i32] = &[15, 21, 53, 67];
}

#[cfg(target_os = "linux")]
mod codes {
    pub const NAME_TOO_LONG: &[i32] = &[36];
    pub const DRIVE_UNAVAILABLE: &[i32] = &[6, 19, 123];
}

#[cfg(all(unix, not(target_os = "linux")))]
mod codes {
    pub const NAME_TOO_LONG: &[i32] = &[63];
    pub const DRIVE_UNAVAILABLE: &[i32] = &[6, 19];
}

#[cfg(not(any(windows, unix)))]
mod codes {
    pub const NAME_TOO_LONG: &[i32] = &[];
    pub const DRIVE_UNAVAILABLE: &[i32] = &[];
}

/// A failure while enumerating the tree itself.
///
/// Every variant carries the offending path. These are recovered locally:
/// traversal continues past them.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiscoveryError {
    /// The directory is beyond the normal path-length limit and was not
    /// descended into, or holds files whose paths are.
    #[error("path too long ({length} characters): {}", .path.display())]
    TooLongPath {
        /// The directory to list with the long-path fallback.
        path: PathBuf,
        /// Its length in UTF-16 code units.
        length: usize,
    },
    /// The item vanished or never existed.
    #[error("item not found: {}", .path.display())]
    TargetNotFound {
        /// The missing path.
        path: PathBuf,
    },
    /// The drive or share holding the item is not available.
    #[error("drive unavailable: {}", .path.display())]
    TargetDriveUnavailable {
        /// The path on the unavailable drive.
        path: PathBuf,
    },
    /// Any other enumeration failure.
    #[error("{}: {cause}", .path.display())]
    Other {
        /// The path being enumerated.
        path: PathBuf,
        /// Human-readable cause.
        cause: String,
    },
}

impl DiscoveryError {
    /// Returns the path the error is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::TooLongPath { path, .. }
            | Self::TargetNotFound { path }
            | Self::TargetDriveUnavailable { path }
            | Self::Other { path, .. } => path,
        }
    }

    /// Classifies an I/O error raised while enumerating `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, err: &io::Error) -> Self {
        let code = err.raw_os_error();
        if code.is_some_and(|c| codes::NAME_TOO_LONG.contains(&c)) {
            let length = path_len(&path);
            return Self::TooLongPath { path, length };
        }
        if code.is_some_and(|c| codes::DRIVE_UNAVAILABLE.contains(&c)) {
            return Self::TargetDriveUnavailable { path };
        }
        if err.kind() == io::ErrorKind::NotFound {
            if drive_missing(&path) {
                return Self::TargetDriveUnavailable { path };
            }
            return Self::TargetNotFound { path };
        }
        Self::Other { path, cause: err.to_string() }
    }

    /// Classifies an error reported by the directory walker.
    pub(crate) fn from_walk(err: &walkdir::Error, root: &Path) -> Self {
        let path = err.path().unwrap_or(root).to_path_buf();
        if let Some(ancestor) = err.loop_ancestor() {
            return Self::Other {
                path,
                cause: format!("filesystem loop back to {}", ancestor.display()),
            };
        }
        match err.io_error() {
            Some(io_err) => Self::from_io(path, io_err),
            None => Self::Other { path, cause: err.to_string() },
        }
    }
}

/// A failure that stops the scan before any traversal happens.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The root folder does not exist or cannot be listed.
    #[error("cannot read root folder {}: {source}", .path.display())]
    RootUnavailable {
        /// The requested root.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The root exists but is not a folder.
    #[error("root is not a folder: {}", .path.display())]
    NotADirectory {
        /// The requested root.
        path: PathBuf,
    },
}

/// Length of `path` as the Windows path APIs count it, in UTF-16 code units.
#[must_use]
pub fn path_len(path: &Path) -> usize {
    #[cfg(windows)]
    {
        use std::os::windows::ffi::OsStrExt;
        path.as_os_str().encode_wide().count()
    }
    #[cfg(not(windows))]
    {
        path.as_os_str().to_string_lossy().encode_utf16().count()
    }
}

/// Returns `true` when the drive or share prefix of `path` is itself missing.
#[cfg(windows)]
fn drive_missing(path: &Path) -> bool {
    use std::path::Component;
    match path.components().next() {
        Some(Component::Prefix(prefix)) => {
            let mut root = PathBuf::from(prefix.as_os_str());
            root.push("\\");
            !root.exists()
        }
        _ => false,
    }
}

#[cfg(not(windows))]
fn drive_missing(_path: &Path) -> bool {
    false
}
