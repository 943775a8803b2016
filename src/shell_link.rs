//! Reader for Windows shell link (`.lnk`) files.
//!
//! Only the structures needed to recover a target path are decoded: the
//! header, the `LinkInfo` block, the `StringData` section and the
//! environment-variable extra data block. The ID list is skipped by size;
//! a shortcut that only carries a shell-namespace ID list has no fixed
//! target path.

use std::path::{Path, PathBuf};

use encoding_rs::WINDOWS_1252;
use thiserror::Error;

const HEADER_SIZE: u32 = 0x4C;
const LINK_CLSID: [u8; 16] = [
    0x01, 0x14, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0xC0, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x46,
];

const HAS_LINK_TARGET_ID_LIST: u32 = 1 << 0;
const HAS_LINK_INFO: u32 = 1 << 1;
const HAS_NAME: u32 = 1 << 2;
const HAS_RELATIVE_PATH: u32 = 1 << 3;
const HAS_WORKING_DIR: u32 = 1 << 4;
const HAS_ARGUMENTS: u32 = 1 << 5;
const HAS_ICON_LOCATION: u32 = 1 << 6;
const IS_UNICODE: u32 = 1 << 7;
const FORCE_NO_LINK_INFO: u32 = 1 << 8;

const VOLUME_ID_AND_LOCAL_BASE_PATH: u32 = 1 << 0;
const COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX: u32 = 1 << 1;

const ENVIRONMENT_VARIABLE_BLOCK: u32 = 0xA000_0001;
const ENVIRONMENT_VARIABLE_BLOCK_SIZE: usize = 0x314;

/// Errors raised while decoding a shell link.
#[derive(Debug, Error)]
pub enum ShellLinkError {
    /// The header size or class identifier does not match a shell link.
    #[error("not a shell link: {0}")]
    BadHeader(&'static str),
    /// A structure points past the end of the data.
    #[error("shell link truncated at offset {offset:#x} while reading {what}")]
    Truncated {
        /// Offset where reading failed.
        offset: usize,
        /// The structure being read.
        what: &'static str,
    },
    /// The file could not be read.
    #[error("failed to read shell link {path}: {source}")]
    Io {
        /// Path of the shortcut.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// The decoded parts of a shell link relevant to its target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellLink {
    /// Local path of the target's volume-relative base.
    pub local_base_path: Option<String>,
    /// Share name, e.g. `\\server\share`, for network targets.
    pub network_share: Option<String>,
    /// Remainder appended to the base path or share.
    pub common_path_suffix: Option<String>,
    /// Description string.
    pub name: Option<String>,
    /// Target path relative to the shortcut file.
    pub relative_path: Option<String>,
    /// Working directory.
    pub working_dir: Option<String>,
    /// Command-line arguments.
    pub arguments: Option<String>,
    /// Icon location.
    pub icon_location: Option<String>,
    /// Target containing `%VAR%` references.
    pub environment_target: Option<String>,
}

impl ShellLink {
    /// Reads and decodes the shell link at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid shell link.
    pub fn open(path: &Path) -> Result<Self, ShellLinkError> {
        let data = std::fs::read(path)
            .map_err(|source| ShellLinkError::Io { path: path.to_path_buf(), source })?;
        Self::parse(&data)
    }

    /// Decodes a shell link from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the header is invalid or a structure is truncated.
    pub fn parse(data: &[u8]) -> Result<Self, ShellLinkError> {
        let mut reader = Reader::new(data);
        if reader.u32("header size")? != HEADER_SIZE {
            return Err(ShellLinkError::BadHeader("unexpected header size"));
        }
        if reader.take(16, "link CLSID")? != LINK_CLSID {
            return Err(ShellLinkError::BadHeader("unexpected class identifier"));
        }
        let flags = reader.u32("link flags")?;
        reader.seek(HEADER_SIZE as usize);

        let mut link = Self::default();

        if flags & HAS_LINK_TARGET_ID_LIST != 0 {
            let size = reader.u16("ID list size")?;
            reader.take(usize::from(size), "ID list")?;
        }

        if flags & HAS_LINK_INFO != 0 {
            let start = reader.pos;
            let size = reader.u32("link info size")? as usize;
            let block = slice(data, start, size, "link info")?;
            if flags & FORCE_NO_LINK_INFO == 0 {
                link.read_link_info(block)?;
            }
            reader.seek(start + size);
        }

        let unicode = flags & IS_UNICODE != 0;
        for (flag, slot) in [
            (HAS_NAME, &mut link.name),
            (HAS_RELATIVE_PATH, &mut link.relative_path),
            (HAS_WORKING_DIR, &mut link.working_dir),
            (HAS_ARGUMENTS, &mut link.arguments),
            (HAS_ICON_LOCATION, &mut link.icon_location),
        ] {
            if flags & flag != 0 {
                *slot = Some(reader.counted_string(unicode)?);
            }
        }

        link.environment_target = read_environment_block(&data[reader.pos.min(data.len())..]);
        Ok(link)
    }

    /// Returns the path the shortcut points at, if it records one.
    ///
    /// `link_dir` is the directory containing the shortcut and is used to
    /// anchor a relative-path target.
    #[must_use]
    pub fn target(&self, link_dir: Option<&Path>) -> Option<PathBuf> {
        let suffix = self.common_path_suffix.as_deref().unwrap_or("");
        if let Some(base) = non_empty(self.local_base_path.as_deref()) {
            return Some(PathBuf::from(format!("{base}{suffix}")));
        }
        if let Some(share) = non_empty(self.network_share.as_deref()) {
            let joined = if suffix.is_empty() {
                share.to_string()
            } else {
                format!("{}\\{suffix}", share.trim_end_matches('\\'))
            };
            return Some(PathBuf::from(joined));
        }
        if let Some(target) = non_empty(self.environment_target.as_deref()) {
            return Some(PathBuf::from(expand_env(target)));
        }
        match (non_empty(self.relative_path.as_deref()), link_dir) {
            (Some(relative), Some(dir)) => Some(dir.join(relative)),
            _ => None,
        }
    }

    fn read_link_info(&mut self, block: &[u8]) -> Result<(), ShellLinkError> {
        let mut header = Reader::new(block);
        header.seek(4);
        let header_size = header.u32("link info header size")? as usize;
        let info_flags = header.u32("link info flags")?;
        let _volume_id_offset = header.u32("volume ID offset")?;
        let local_base_path_offset = header.u32("local base path offset")? as usize;
        let network_offset = header.u32("network link offset")? as usize;
        let suffix_offset = header.u32("common path suffix offset")? as usize;
        let (local_unicode_offset, suffix_unicode_offset) = if header_size >= 0x24 {
            (
                header.u32("unicode local base path offset")? as usize,
                header.u32("unicode common path suffix offset")? as usize,
            )
        } else {
            (0, 0)
        };

        if info_flags & VOLUME_ID_AND_LOCAL_BASE_PATH != 0 {
            self.local_base_path = Some(if local_unicode_offset > 0 {
                utf16_z(block, local_unicode_offset)?
            } else {
                ansi_z(block, local_base_path_offset)?
            });
        }

        if info_flags & COMMON_NETWORK_RELATIVE_LINK_AND_PATH_SUFFIX != 0 && network_offset > 0 {
            let mut network = Reader::new(block);
            network.seek(network_offset);
            let _size = network.u32("network link size")?;
            let _flags = network.u32("network link flags")?;
            let net_name_offset = network.u32("net name offset")? as usize;
            let share = if net_name_offset > 0x14 {
                network.seek(network_offset + 0x14);
                let unicode_offset = network.u32("unicode net name offset")? as usize;
                utf16_z(block, network_offset + unicode_offset)?
            } else {
                ansi_z(block, network_offset + net_name_offset)?
            };
            self.network_share = Some(share);
        }

        self.common_path_suffix = Some(if suffix_unicode_offset > 0 {
            utf16_z(block, suffix_unicode_offset)?
        } else if suffix_offset > 0 {
            ansi_z(block, suffix_offset)?
        } else {
            String::new()
        });
        Ok(())
    }
}

/// Cursor over little-endian shell link data.
struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    fn take(&mut self, len: usize, what: &'static str) -> Result<&'a [u8], ShellLinkError> {
        let bytes = slice(self.data, self.pos, len, what)?;
        self.pos += len;
        Ok(bytes)
    }

    fn u16(&mut self, what: &'static str) -> Result<u16, ShellLinkError> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self, what: &'static str) -> Result<u32, ShellLinkError> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn counted_string(&mut self, unicode: bool) -> Result<String, ShellLinkError> {
        let count = usize::from(self.u16("string length")?);
        if unicode {
            Ok(decode_utf16(self.take(count * 2, "string data")?))
        } else {
            Ok(decode_ansi(self.take(count, "string data")?))
        }
    }
}

fn slice<'a>(
    data: &'a [u8],
    start: usize,
    len: usize,
    what: &'static str,
) -> Result<&'a [u8], ShellLinkError> {
    start
        .checked_add(len)
        .and_then(|end| data.get(start..end))
        .ok_or(ShellLinkError::Truncated { offset: start, what })
}

fn ansi_z(block: &[u8], offset: usize) -> Result<String, ShellLinkError> {
    let tail = block.get(offset..).ok_or(ShellLinkError::Truncated { offset, what: "string" })?;
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Ok(decode_ansi(&tail[..end]))
}

fn utf16_z(block: &[u8], offset: usize) -> Result<String, ShellLinkError> {
    let tail = block.get(offset..).ok_or(ShellLinkError::Truncated { offset, what: "string" })?;
    let end = tail
        .chunks_exact(2)
        .position(|pair| pair == [0, 0])
        .map_or(tail.len() - tail.len() % 2, |units| units * 2);
    Ok(decode_utf16(&tail[..end]))
}

fn decode_ansi(bytes: &[u8]) -> String {
    WINDOWS_1252.decode_without_bom_handling(bytes).0.into_owned()
}

fn decode_utf16(bytes: &[u8]) -> String {
    let units: Vec<u16> =
        bytes.chunks_exact(2).map(|pair| u16::from_le_bytes([pair[0], pair[1]])).collect();
    String::from_utf16_lossy(&units)
}

fn read_environment_block(mut extra: &[u8]) -> Option<String> {
    while extra.len() >= 8 {
        let size = u32::from_le_bytes([extra[0], extra[1], extra[2], extra[3]]) as usize;
        if size < 8 || size > extra.len() {
            break;
        }
        let signature = u32::from_le_bytes([extra[4], extra[5], extra[6], extra[7]]);
        if signature == ENVIRONMENT_VARIABLE_BLOCK && size >= ENVIRONMENT_VARIABLE_BLOCK_SIZE {
            let unicode = utf16_z(&extra[268..788], 0).ok().filter(|s| !s.is_empty());
            return unicode.or_else(|| ansi_z(&extra[8..268], 0).ok().filter(|s| !s.is_empty()));
        }
        extra = &extra[size..];
    }
    None
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// Expands `%NAME%` references from the process environment. Unknown
/// variables are left as written.
fn expand_env(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('%') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('%') {
            Some(end) => {
                let name = &after[..end];
                match std::env::var(name) {
                    Ok(value) if !name.is_empty() => out.push_str(&value),
                    _ => {
                        out.push('%');
                        out.push_str(name);
                        out.push('%');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
