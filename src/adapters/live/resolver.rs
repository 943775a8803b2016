//! Live shortcut resolver reading `.lnk` files directly.

use std::path::{Path, PathBuf};

use crate::ports::ShortcutTargetResolver;
use crate::shell_link::ShellLink;

/// Resolves shortcut targets by decoding the shell link file.
///
/// Unreadable or malformed shortcuts resolve to no target.
pub struct LnkResolver;

impl ShortcutTargetResolver for LnkResolver {
    fn resolve(&self, shortcut: &Path) -> Option<PathBuf> {
        match ShellLink::open(shortcut) {
            Ok(link) => link.target(shortcut.parent()),
            Err(err) => {
                tracing::debug!(shortcut = %shortcut.display(), error = %err, "cannot read shortcut");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_resolves_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.lnk");
        std::fs::write(&path, b"definitely not a shell link").unwrap();

        assert_eq!(LnkResolver.resolve(&path), None);
        assert_eq!(LnkResolver.resolve(&dir.path().join("missing.lnk")), None);
    }
}
