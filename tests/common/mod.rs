//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use folder_links::ports::{Attributes, FileAttributes};

/// Builds a minimal shell link whose LinkInfo records `target` as its
/// local base path.
pub fn lnk_bytes(target: &Path) -> Vec<u8> {
    let base = target.to_string_lossy();
    let mut bytes = vec![0u8; 0x4C];
    bytes[0..4].copy_from_slice(&0x4Cu32.to_le_bytes());
    bytes[4..20].copy_from_slice(&[
        0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x46,
    ]);
    // HasLinkInfo
    bytes[20..24].copy_from_slice(&2u32.to_le_bytes());

    let header_size = 0x1Cu32;
    let base_offset = header_size;
    let suffix_offset = base_offset + u32::try_from(base.len()).unwrap() + 1;
    let total = suffix_offset + 1;
    for value in [total, header_size, 1, 0, base_offset, 0, suffix_offset] {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes.extend_from_slice(base.as_bytes());
    bytes.push(0);
    bytes.push(0);
    // Terminal extra data block.
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes
}

/// Writes a shortcut at `path` pointing at `target`, creating parents.
pub fn write_lnk(path: &Path, target: &Path) -> Vec<u8> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let bytes = lnk_bytes(target);
    std::fs::write(path, &bytes).unwrap();
    bytes
}

/// Attribute store kept in memory so that hidden/system can be checked
/// on every platform.
#[derive(Default, Clone)]
pub struct RecordedAttributes(pub Arc<Mutex<HashMap<PathBuf, Attributes>>>);

impl RecordedAttributes {
    pub fn snapshot(&self) -> HashMap<PathBuf, Attributes> {
        self.0.lock().unwrap().clone()
    }
}

impl FileAttributes for RecordedAttributes {
    fn get(&self, path: &Path) -> Result<Attributes, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.lock().unwrap().get(path).copied().unwrap_or_default())
    }

    fn set(
        &self,
        path: &Path,
        attrs: Attributes,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut map = self.0.lock().unwrap();
        let entry = map.entry(path.to_path_buf()).or_default();
        *entry = entry.union(attrs);
        Ok(())
    }
}

/// Clears read-only on `path` so the temp dir can be removed.
pub fn make_writable(path: &Path) {
    if let Ok(metadata) = std::fs::metadata(path) {
        let mut permissions = metadata.permissions();
        #[allow(clippy::permissions_set_readonly_false)]
        permissions.set_readonly(false);
        let _ = std::fs::set_permissions(path, permissions);
    }
}
