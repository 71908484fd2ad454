//! Parameter descriptors: identity, conversion, and capability metadata.
//!
//! Every parameter of the voice is described by a [`ParamDescriptor`] living
//! in a `static` table (see [`crate::layout`]). The table is built at compile
//! time and read from any thread without synchronization.
//!
//! Values travel through the system in normalized form (`0.0..=1.0`). A
//! [`Conversion`] maps them to the physical units the synthesis engine expects:
//!
//! - **Linear**: `min + norm * (max - min)`
//! - **Exponential**: `min * exp(norm * ln(max / min))`
//! - **Stepped**: `round(norm * steps) + start`
//!
//! # Example
//!
//! ```rust
//! use squelch_core::{Conversion, ParamDescriptor, ParamId, ParamUnit};
//!
//! const CUTOFF: ParamDescriptor = ParamDescriptor::continuous(
//!     ParamId(2),
//!     "Cutoff",
//!     "Cutoff",
//!     "cutoff",
//!     ParamUnit::Hertz,
//!     1.0,
//!     Conversion::Exponential { min: 314.0, max: 2394.0 },
//! );
//!
//! assert!((CUTOFF.to_physical(0.0) - 314.0).abs() < 1e-9);
//! assert!((CUTOFF.to_physical(1.0) - 2394.0).abs() < 1e-6);
//! ```

use libm::{exp, log, round};

/// Stable parameter identifier.
///
/// The id doubles as the index into the descriptor table and as the position
/// of the value inside persisted parameter state. Once assigned it never
/// changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParamId(pub u32);

impl ParamId {
    /// Table index of this id.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Parameter capability flags.
///
/// # Example
///
/// ```rust
/// use squelch_core::ParamFlags;
///
/// let flags = ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!flags.contains(ParamFlags::READ_ONLY));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Host can automate this parameter.
    pub const AUTOMATABLE: Self = Self(1 << 0);
    /// Parameter has discrete steps (enum-like).
    pub const STEPPED: Self = Self(1 << 1);
    /// Parameter should be hidden from generic UIs.
    pub const HIDDEN: Self = Self(1 << 2);
    /// Parameter is read-only (metering, display only). Never sent to the engine.
    pub const READ_ONLY: Self = Self(1 << 3);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::AUTOMATABLE
    }
}

/// Pure mapping between normalized and physical values.
///
/// Conversions carry no hidden state. `to_normalized(to_physical(x))` returns
/// `x` for linear and exponential conversions (up to floating point), and the
/// centre of the step band for stepped ones.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    /// Straight-line mapping onto `min..=max`.
    Linear {
        /// Physical value at normalized 0.
        min: f64,
        /// Physical value at normalized 1.
        max: f64,
    },
    /// Exponential mapping onto `min..=max`. Requires `0 < min < max`.
    Exponential {
        /// Physical value at normalized 0.
        min: f64,
        /// Physical value at normalized 1.
        max: f64,
    },
    /// Enumerated values `start..=start + steps`.
    Stepped {
        /// Number of steps above `start` (an enum of `n` choices has `n - 1`).
        steps: u32,
        /// Physical value of the first choice.
        start: i32,
    },
}

impl Conversion {
    /// Map a normalized value to physical units. Input is clamped to `0.0..=1.0`.
    #[inline]
    pub fn to_physical(&self, normalized: f64) -> f64 {
        let norm = clamp_unit(normalized);
        match *self {
            Conversion::Linear { min, max } => min + norm * (max - min),
            Conversion::Exponential { min, max } => min * exp(norm * log(max / min)),
            Conversion::Stepped { steps, start } => {
                let step = round(norm * f64::from(steps)).min(f64::from(steps));
                step + f64::from(start)
            }
        }
    }

    /// Map a physical value back to normalized units, clamped to `0.0..=1.0`.
    #[inline]
    pub fn to_normalized(&self, physical: f64) -> f64 {
        let norm = match *self {
            Conversion::Linear { min, max } => {
                let range = max - min;
                if range == 0.0 {
                    return 0.0;
                }
                (physical - min) / range
            }
            Conversion::Exponential { min, max } => {
                if physical <= 0.0 || min <= 0.0 {
                    return 0.0;
                }
                log(physical / min) / log(max / min)
            }
            Conversion::Stepped { steps, start } => {
                if steps == 0 {
                    return 0.0;
                }
                (physical - f64::from(start)) / f64::from(steps)
            }
        };
        clamp_unit(norm)
    }

    /// Index of the step a normalized value selects, for stepped conversions.
    ///
    /// Continuous conversions always report step 0.
    #[inline]
    pub fn step_index(&self, normalized: f64) -> usize {
        match *self {
            Conversion::Stepped { steps, .. } => {
                round(clamp_unit(normalized) * f64::from(steps)).min(f64::from(steps)) as usize
            }
            _ => 0,
        }
    }

    /// Number of distinct values, or `None` for continuous conversions.
    pub const fn choices(&self) -> Option<u32> {
        match *self {
            Conversion::Stepped { steps, .. } => Some(steps + 1),
            _ => None,
        }
    }
}

#[inline]
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Unit type for parameter display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamUnit {
    /// Decibels (dB).
    Decibels,
    /// Hertz (Hz).
    Hertz,
    /// Milliseconds (ms).
    Milliseconds,
    /// Percentage (%).
    Percent,
    /// Semitones (st).
    Semitones,
    /// Dimensionless.
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// ```rust
    /// use squelch_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Percent => "%",
            ParamUnit::Semitones => " st",
            ParamUnit::None => "",
        }
    }
}

/// Static description of one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Stable id and table index.
    pub id: ParamId,
    /// Full name for display.
    pub name: &'static str,
    /// Short name for narrow displays, max 8 characters.
    pub short_name: &'static str,
    /// Stable lowercase identifier for files and the command line.
    pub string_id: &'static str,
    /// Display unit.
    pub unit: ParamUnit,
    /// Default normalized value.
    pub default: f64,
    /// One-pole smoothing weight in `(0, 1]`. `1.0` applies targets immediately.
    pub alpha: f64,
    /// Default normalized-to-physical mapping.
    pub conversion: Conversion,
    /// Display strings for stepped parameters, one per choice.
    pub labels: &'static [&'static str],
    /// Capability flags.
    pub flags: ParamFlags,
}

impl ParamDescriptor {
    /// Default smoothing weight for continuous parameters.
    pub const DEFAULT_ALPHA: f64 = 0.1;

    /// A continuous, automatable parameter smoothed with [`DEFAULT_ALPHA`](Self::DEFAULT_ALPHA).
    pub const fn continuous(
        id: ParamId,
        name: &'static str,
        short_name: &'static str,
        string_id: &'static str,
        unit: ParamUnit,
        default: f64,
        conversion: Conversion,
    ) -> Self {
        Self {
            id,
            name,
            short_name,
            string_id,
            unit,
            default,
            alpha: Self::DEFAULT_ALPHA,
            conversion,
            labels: &[],
            flags: ParamFlags::AUTOMATABLE,
        }
    }

    /// An enumerated parameter. Discrete values take effect on the next slice (`alpha = 1`).
    pub const fn stepped(
        id: ParamId,
        name: &'static str,
        short_name: &'static str,
        string_id: &'static str,
        default: f64,
        labels: &'static [&'static str],
    ) -> Self {
        Self {
            id,
            name,
            short_name,
            string_id,
            unit: ParamUnit::None,
            default,
            alpha: 1.0,
            conversion: Conversion::Stepped {
                steps: labels.len().saturating_sub(1) as u32,
                start: 0,
            },
            labels,
            flags: ParamFlags::AUTOMATABLE.union(ParamFlags::STEPPED),
        }
    }

    /// Mark the parameter read-only. Read-only values are never smoothed.
    pub const fn read_only(mut self) -> Self {
        self.flags = ParamFlags::READ_ONLY.union(ParamFlags::HIDDEN);
        self.alpha = 1.0;
        self
    }

    /// Whether the parameter is metering-only.
    #[inline]
    pub const fn is_read_only(&self) -> bool {
        self.flags.contains(ParamFlags::READ_ONLY)
    }

    /// Physical value for a normalized one, using the default conversion.
    #[inline]
    pub fn to_physical(&self, normalized: f64) -> f64 {
        self.conversion.to_physical(normalized)
    }

    /// Normalized value for a physical one, using the default conversion.
    #[inline]
    pub fn to_normalized(&self, physical: f64) -> f64 {
        self.conversion.to_normalized(physical)
    }

    /// Display label for a normalized value of a stepped parameter.
    pub fn label(&self, normalized: f64) -> Option<&'static str> {
        if self.labels.is_empty() {
            return None;
        }
        self.labels
            .get(self.conversion.step_index(normalized))
            .copied()
    }
}
