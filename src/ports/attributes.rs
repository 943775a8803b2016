//! File attribute port (hidden, system, read-only).

use std::path::Path;

/// The subset of file attributes a folder shell link depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Attributes {
    /// Hidden from ordinary directory listings.
    pub hidden: bool,
    /// Marked as an operating-system file.
    pub system: bool,
    /// Read-only. On a folder this tells the shell to honour `desktop.ini`.
    pub read_only: bool,
}

impl Attributes {
    /// Hidden and system, as required for the marker file.
    pub const HIDDEN_SYSTEM: Self = Self { hidden: true, system: true, read_only: false };
    /// Read-only only, as required for the link folder.
    pub const READ_ONLY: Self = Self { hidden: false, system: false, read_only: true };

    /// Returns the union of `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            hidden: self.hidden || other.hidden,
            system: self.system || other.system,
            read_only: self.read_only || other.read_only,
        }
    }

    /// Returns `true` if every attribute set in `other` is also set in `self`.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.union(other) == self
    }
}

/// Reads and writes file attributes.
pub trait FileAttributes: Send + Sync {
    /// Returns the current attributes of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes cannot be read.
    fn get(&self, path: &Path) -> Result<Attributes, Box<dyn std::error::Error + Send + Sync>>;

    /// Sets the flags in `attrs` on `path`. Flags already set stay set.
    ///
    /// # Errors
    ///
    /// Returns an error if the attributes cannot be written.
    fn set(
        &self,
        path: &Path,
        attrs: Attributes,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}
