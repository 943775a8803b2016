//! Live child lister that tolerates over-long directory paths.

use std::path::{Path, PathBuf};

use crate::ports::lister::ChildLister;

/// Lists directory children through extended-length paths.
///
/// On Windows the directory is opened through the `\\?\` prefix, which
/// lifts the 260-character limit. Returned paths are joined onto the
/// directory as given, without the prefix. Links to folders count as
/// folders; broken links count as files.
pub struct LiveChildLister;

impl LiveChildLister {
    fn list(
        dir: &Path,
        want_folders: bool,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>> {
        let mut children = Vec::new();
        for entry in std::fs::read_dir(extended_length(dir))? {
            let entry = entry?;
            if entry.path().is_dir() == want_folders {
                children.push(dir.join(entry.file_name()));
            }
        }
        children.sort();
        Ok(children)
    }
}

impl ChildLister for LiveChildLister {
    fn subfolders(
        &self,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>> {
        Self::list(dir, true)
    }

    fn files(&self, dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>> {
        Self::list(dir, false)
    }
}

/// Rewrites `path` into its `\\?\` form.
#[cfg(windows)]
fn extended_length(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let raw = absolute.as_os_str().to_string_lossy();
    if raw.starts_with(r"\\?\") {
        absolute
    } else if let Some(share) = raw.strip_prefix(r"\\") {
        PathBuf::from(format!(r"\\?\UNC\{share}"))
    } else {
        PathBuf::from(format!(r"\\?\{raw}"))
    }
}

#[cfg(not(windows))]
fn extended_length(path: &Path) -> PathBuf {
    path.to_path_buf()
}
