//! Persisted parameter state.
//!
//! Layout, little-endian:
//!
//! ```text
//! [magic "SQPS": i32][version: i32][count: u32][value: f64] × count
//! ```
//!
//! Values are normalized and stored in id order. Version 1 files carry ids
//! 0..=11; version 2 adds the pattern selector and step position.

use std::path::Path;

use squelch_core::{PARAM_COUNT, ParamDescriptor, V1_PARAM_COUNT};

use crate::codec::{self, Reader, WriteLe};
use crate::error::{Result, StateError};

/// Magic number of a parameter state record.
pub const STATE_MAGIC: i32 = codec::magic(b"SQPS");

/// Highest parameter state version this build reads and the one it writes.
pub const STATE_VERSION: i32 = 2;

/// A decoded parameter state, exactly as stored.
///
/// Nothing is clamped or filled in here, so [`encode`](Self::encode) of a
/// decoded state reproduces the input byte for byte. Use
/// [`migrate`](Self::migrate) to map it onto a parameter layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterState {
    /// Format version the values were written with.
    pub version: i32,
    /// Normalized values in id order.
    pub values: Vec<f64>,
}

impl ParameterState {
    /// A current-version state holding `values`.
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            version: STATE_VERSION,
            values: values.into(),
        }
    }

    /// Current-version state of every descriptor's default.
    pub fn defaults(layout: &[ParamDescriptor]) -> Self {
        Self::new(layout.iter().map(|d| d.default).collect::<Vec<_>>())
    }

    /// Number of values a state of `version` is expected to carry.
    pub fn expected_count(version: i32) -> usize {
        if version <= 1 {
            V1_PARAM_COUNT
        } else {
            PARAM_COUNT
        }
    }

    /// Serialize to the binary layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(12 + self.values.len() * 8);
        out.put_i32(STATE_MAGIC);
        out.put_i32(self.version);
        out.put_u32(self.values.len() as u32);
        for &v in &self.values {
            out.put_f64(v);
        }
        out
    }

    /// Parse the binary layout. Fails on any malformed or non-finite data.
    pub fn decode(bytes: &[u8]) -> std::result::Result<Self, StateError> {
        let mut r = Reader::new(bytes);
        let version = r.header(STATE_MAGIC, STATE_VERSION)?;
        let count = r.u32()? as usize;
        if count > r.remaining() / 8 {
            return Err(StateError::Truncated {
                needed: bytes.len() - r.remaining() + count.saturating_mul(8),
                available: bytes.len(),
            });
        }

        let mut values = Vec::with_capacity(count);
        for index in 0..count {
            let v = r.f64()?;
            if !v.is_finite() {
                return Err(StateError::NonFinite { index });
            }
            values.push(v);
        }
        r.finish()?;
        Ok(Self { version, values })
    }

    /// Map onto `layout`: extras are dropped, missing ids take their
    /// descriptor default and every value is clamped into `[0, 1]`.
    pub fn migrate(&self, layout: &[ParamDescriptor]) -> std::result::Result<Vec<f64>, StateError> {
        if let Some(index) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(StateError::NonFinite { index });
        }
        if self.values.len() != Self::expected_count(self.version) {
            tracing::debug!(
                version = self.version,
                count = self.values.len(),
                "parameter count differs from version layout"
            );
        }
        Ok(layout
            .iter()
            .enumerate()
            .map(|(i, desc)| {
                self.values
                    .get(i)
                    .copied()
                    .unwrap_or(desc.default)
                    .clamp(0.0, 1.0)
            })
            .collect())
    }

    /// Load a state file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let state = Self::decode(&codec::read_file(path)?)?;
        tracing::debug!(
            path = %path.display(),
            version = state.version,
            count = state.values.len(),
            "loaded parameter state"
        );
        Ok(state)
    }

    /// Save to a state file. The previous file survives a failed write.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        codec::write_file_atomic(path, &self.encode())?;
        tracing::info!(path = %path.display(), count = self.values.len(), "saved parameter state");
        Ok(())
    }
}
