//! Live path classifier using `std::fs::metadata`.

use std::path::Path;

use crate::ports::classifier::{PathClassifier, TargetKind};

/// Classifies paths by querying the filesystem. Symlinks are followed.
pub struct LivePathClassifier;

impl PathClassifier for LivePathClassifier {
    fn classify(&self, path: &Path) -> TargetKind {
        match std::fs::metadata(path) {
            Ok(metadata) => TargetKind { exists: true, is_folder: metadata.is_dir() },
            Err(err) => {
                tracing::trace!(path = %path.display(), error = %err, "treating as missing");
                TargetKind::MISSING
            }
        }
    }
}
