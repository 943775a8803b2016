//! Live file attribute adapter.
//!
//! Windows exposes hidden, system and read-only as file attribute bits.
//! Other platforms only have read-only, mapped onto permissions; requests
//! for hidden or system are accepted and ignored there.

use std::path::Path;

use crate::ports::attributes::{Attributes, FileAttributes};

/// Live attribute adapter backed by the host filesystem.
pub struct LiveFileAttributes;

#[cfg(windows)]
impl FileAttributes for LiveFileAttributes {
    fn get(&self, path: &Path) -> Result<Attributes, Box<dyn std::error::Error + Send + Sync>> {
        let raw = win::get(path)?;
        Ok(Attributes {
            hidden: raw & win::HIDDEN != 0,
            system: raw & win::SYSTEM != 0,
            read_only: raw & win::READ_ONLY != 0,
        })
    }

    fn set(
        &self,
        path: &Path,
        attrs: Attributes,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut raw = win::get(path)?;
        for (wanted, bit) in
            [(attrs.hidden, win::HIDDEN), (attrs.system, win::SYSTEM), (attrs.read_only, win::READ_ONLY)]
        {
            if wanted {
                raw |= bit;
            }
        }
        // NORMAL is only valid alone.
        raw &= !win::NORMAL;
        win::set(path, raw)?;
        Ok(())
    }
}

#[cfg(windows)]
mod win {
    use std::io;
    use std::os::windows::ffi::OsStrExt;
    use std::path::Path;

    use windows::core::PCWSTR;
    use windows::Win32::Storage::FileSystem::{
        GetFileAttributesW, SetFileAttributesW, FILE_ATTRIBUTE_HIDDEN, FILE_ATTRIBUTE_NORMAL,
        FILE_ATTRIBUTE_READONLY, FILE_ATTRIBUTE_SYSTEM, FILE_FLAGS_AND_ATTRIBUTES,
        INVALID_FILE_ATTRIBUTES,
    };

    pub const HIDDEN: u32 = FILE_ATTRIBUTE_HIDDEN.0;
    pub const SYSTEM: u32 = FILE_ATTRIBUTE_SYSTEM.0;
    pub const READ_ONLY: u32 = FILE_ATTRIBUTE_READONLY.0;
    pub const NORMAL: u32 = FILE_ATTRIBUTE_NORMAL.0;

    fn wide(path: &Path) -> Vec<u16> {
        path.as_os_str().encode_wide().chain(std::iter::once(0)).collect()
    }

    #[allow(unsafe_code)]
    pub fn get(path: &Path) -> io::Result<u32> {
        let wide_path = wide(path);
        // SAFETY: `wide_path` is NUL-terminated and outlives the call.
        let raw = unsafe { GetFileAttributesW(PCWSTR(wide_path.as_ptr())) };
        if raw == INVALID_FILE_ATTRIBUTES {
            return Err(io::Error::last_os_error());
        }
        Ok(raw)
    }

    #[allow(unsafe_code)]
    pub fn set(path: &Path, raw: u32) -> windows::core::Result<()> {
        let wide_path = wide(path);
        // SAFETY: `wide_path` is NUL-terminated and outlives the call.
        unsafe { SetFileAttributesW(PCWSTR(wide_path.as_ptr()), FILE_FLAGS_AND_ATTRIBUTES(raw)) }
    }
}

#[cfg(not(windows))]
impl FileAttributes for LiveFileAttributes {
    fn get(&self, path: &Path) -> Result<Attributes, Box<dyn std::error::Error + Send + Sync>> {
        let metadata = std::fs::metadata(path)?;
        Ok(Attributes { read_only: metadata.permissions().readonly(), ..Attributes::default() })
    }

    fn set(
        &self,
        path: &Path,
        attrs: Attributes,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let metadata = std::fs::metadata(path)?;
        if attrs.hidden || attrs.system {
            tracing::debug!(path = %path.display(), "hidden/system attributes not supported here");
        }
        if attrs.read_only {
            let mut permissions = metadata.permissions();
            permissions.set_readonly(true);
            std::fs::set_permissions(path, permissions)?;
        }
        Ok(())
    }
}
