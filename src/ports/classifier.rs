//! Path classifier port.

use std::path::Path;

/// What a resolved target currently is on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TargetKind {
    /// The path exists.
    pub exists: bool,
    /// The path exists and is a folder.
    pub is_folder: bool,
}

impl TargetKind {
    /// An existing folder.
    pub const FOLDER: Self = Self { exists: true, is_folder: true };
    /// An existing non-folder item.
    pub const FILE: Self = Self { exists: true, is_folder: false };
    /// Nothing usable at that path.
    pub const MISSING: Self = Self { exists: false, is_folder: false };

    /// Returns `true` for an existing folder.
    #[must_use]
    pub fn is_existing_folder(self) -> bool {
        self.exists && self.is_folder
    }
}

/// Determines whether a path exists and whether it is a folder.
///
/// Implementations must not fail: syntax errors and transient access
/// errors are reported as [`TargetKind::MISSING`].
pub trait PathClassifier: Send + Sync {
    /// Classifies `path`.
    fn classify(&self, path: &Path) -> TargetKind;
}
