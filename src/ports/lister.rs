//! Limit-tolerant child lister port.

use std::path::{Path, PathBuf};

/// Lists the immediate children of a directory, even when the directory's
/// own path is beyond the normal path-length limit.
///
/// Both operations are one level deep and return full joined paths.
pub trait ChildLister: Send + Sync {
    /// Lists the subfolders directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be read.
    fn subfolders(
        &self,
        dir: &Path,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>>;

    /// Lists the plain files directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be read.
    fn files(&self, dir: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error + Send + Sync>>;
}
