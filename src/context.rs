//! Service context bundling all port trait objects.

use crate::adapters::live::{
    AlwaysConfirm, LiveChildLister, LiveClock, LiveFileAttributes, LiveIdGenerator,
    LivePathClassifier, LnkResolver, PromptConfirmation,
};
use crate::ports::{
    ChildLister, Clock, Confirmation, FileAttributes, IdGenerator, PathClassifier,
    ShortcutTargetResolver,
};

/// Bundles all port trait objects into a single context.
///
/// Each field provides access to one external boundary. Tests replace
/// individual fields with fakes.
pub struct ServiceContext {
    /// Reads shortcut targets.
    pub resolver: Box<dyn ShortcutTargetResolver>,
    /// Tells folders from files and missing paths.
    pub classifier: Box<dyn PathClassifier>,
    /// Lists children of over-long directories.
    pub lister: Box<dyn ChildLister>,
    /// Reads and writes hidden / system / read-only attributes.
    pub attributes: Box<dyn FileAttributes>,
    /// Names staging folders.
    pub id_gen: Box<dyn IdGenerator>,
    /// Stamps reports.
    pub clock: Box<dyn Clock>,
    /// Gates conversion.
    pub confirm: Box<dyn Confirmation>,
}

impl ServiceContext {
    /// Creates a live context backed by the real filesystem.
    ///
    /// With `assume_yes` the confirmation prompt is skipped.
    #[must_use]
    pub fn live(assume_yes: bool) -> Self {
        let confirm: Box<dyn Confirmation> =
            if assume_yes { Box::new(AlwaysConfirm) } else { Box::new(PromptConfirmation) };
        Self {
            resolver: Box::new(LnkResolver),
            classifier: Box::new(LivePathClassifier),
            lister: Box::new(LiveChildLister),
            attributes: Box::new(LiveFileAttributes),
            id_gen: Box::new(LiveIdGenerator),
            clock: Box::new(LiveClock),
            confirm,
        }
    }
}
