//! Little-endian record primitives and file helpers shared by the binary formats.

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Result, StateError};

/// Cursor over a byte slice. Every read is bounds-checked.
pub(crate) struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take<const N: usize>(&mut self) -> std::result::Result<[u8; N], StateError> {
        let end = self.pos + N;
        let bytes = self
            .data
            .get(self.pos..end)
            .and_then(|s| <[u8; N]>::try_from(s).ok())
            .ok_or(StateError::Truncated {
                needed: end,
                available: self.data.len(),
            })?;
        self.pos = end;
        Ok(bytes)
    }

    pub(crate) fn u8(&mut self) -> std::result::Result<u8, StateError> {
        Ok(self.take::<1>()?[0])
    }

    pub(crate) fn i32(&mut self) -> std::result::Result<i32, StateError> {
        self.take().map(i32::from_le_bytes)
    }

    pub(crate) fn u32(&mut self) -> std::result::Result<u32, StateError> {
        self.take().map(u32::from_le_bytes)
    }

    pub(crate) fn f64(&mut self) -> std::result::Result<f64, StateError> {
        self.take().map(f64::from_le_bytes)
    }

    /// Bytes not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Fail unless the whole input was consumed.
    pub(crate) fn finish(&self) -> std::result::Result<(), StateError> {
        match self.remaining() {
            0 => Ok(()),
            extra => Err(StateError::invalid(
                "length",
                format!("{extra} trailing bytes"),
            )),
        }
    }

    /// Read and check `[magic:i32][version:i32]`, returning the version.
    pub(crate) fn header(
        &mut self,
        magic: i32,
        supported: i32,
    ) -> std::result::Result<i32, StateError> {
        let found = self.i32()?;
        if found != magic {
            return Err(StateError::BadMagic {
                expected: magic,
                found,
            });
        }
        let version = self.i32()?;
        if version > supported {
            return Err(StateError::UnsupportedVersion {
                found: version,
                supported,
            });
        }
        if version < 1 {
            return Err(StateError::invalid("version", format!("{version}")));
        }
        Ok(version)
    }
}

/// Append-only little-endian writer.
pub(crate) trait WriteLe {
    fn put_u8(&mut self, value: u8);
    fn put_i32(&mut self, value: i32);
    fn put_u32(&mut self, value: u32);
    fn put_f64(&mut self, value: f64);
}

impl WriteLe for Vec<u8> {
    fn put_u8(&mut self, value: u8) {
        self.push(value);
    }

    fn put_i32(&mut self, value: i32) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_u32(&mut self, value: u32) {
        self.extend_from_slice(&value.to_le_bytes());
    }

    fn put_f64(&mut self, value: f64) {
        self.extend_from_slice(&value.to_le_bytes());
    }
}

/// Four-character magic stored so the file starts with `tag`.
pub(crate) const fn magic(tag: &[u8; 4]) -> i32 {
    i32::from_le_bytes(*tag)
}

pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|e| ConfigError::read_file(path, e))
}

/// Write `bytes` next to `path` and rename into place, so a failed write
/// leaves the previous file intact. Parent directories are created.
pub(crate) fn write_file_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);
    fs::write(&tmp, bytes).map_err(|e| ConfigError::write_file(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| ConfigError::write_file(path, e))
}
