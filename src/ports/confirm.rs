//! Confirmation port gating destructive conversion.

use crate::scan::ClassifiedShortcut;

/// Decides whether the accepted shortcuts should be converted.
///
/// Nothing is mutated on disk unless this returns `true`.
pub trait Confirmation: Send + Sync {
    /// Returns `true` to proceed with converting `accepted`.
    fn confirm(&self, accepted: &[ClassifiedShortcut]) -> bool;
}
