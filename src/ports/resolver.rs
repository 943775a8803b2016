//! Shortcut target resolver port.

use std::path::{Path, PathBuf};

/// Reads the recorded target of a shortcut file.
///
/// Some shortcuts have no fixed target (for example the shell's
/// "recent places" links). Those resolve to `None`, which is a normal
/// outcome and not an error.
pub trait ShortcutTargetResolver: Send + Sync {
    /// Returns the target path recorded in the shortcut at `shortcut`,
    /// or `None` when the shortcut carries no usable target.
    fn resolve(&self, shortcut: &Path) -> Option<PathBuf>;
}
