//! Persisted patterns and pattern banks.
//!
//! Pattern record, little-endian:
//!
//! ```text
//! [magic "SQPT": i32][version: i32][stepLength: f64][maxSteps: i32][numSteps: i32]
//! { [key: i32][octave: i32][accent: u8][slide: u8][gate: u8] } × maxSteps
//! ```
//!
//! Bank record:
//!
//! ```text
//! [magic "SQPB": i32][version: i32][active: i32][count: i32] pattern-record × count
//! ```
//!
//! All sixteen step slots are stored, including those past `numSteps`, so
//! shortening a pattern never loses data.

use std::path::Path;

use squelch_core::{
    MAX_OCTAVE, MAX_PATTERNS, MAX_STEPS, MIN_OCTAVE, MIN_STEP_LENGTH, Pattern, PatternBank, Step,
};

use crate::codec::{self, Reader, WriteLe};
use crate::error::{Result, StateError};

/// Magic number of a pattern record.
pub const PATTERN_MAGIC: i32 = codec::magic(b"SQPT");

/// Pattern record version.
pub const PATTERN_VERSION: i32 = 1;

/// Magic number of a bank record.
pub const BANK_MAGIC: i32 = codec::magic(b"SQPB");

/// Bank record version.
pub const BANK_VERSION: i32 = 1;

/// Encoded size of one pattern record.
pub const PATTERN_RECORD_LEN: usize = 4 + 4 + 8 + 4 + 4 + MAX_STEPS * (4 + 4 + 3);

/// Append one pattern record to `out`.
pub fn write_pattern(out: &mut Vec<u8>, pattern: &Pattern) {
    out.put_i32(PATTERN_MAGIC);
    out.put_i32(PATTERN_VERSION);
    out.put_f64(pattern.step_length());
    out.put_i32(MAX_STEPS as i32);
    out.put_i32(pattern.num_steps() as i32);
    for step in pattern.steps() {
        out.put_i32(i32::from(step.key));
        out.put_i32(i32::from(step.octave));
        out.put_u8(u8::from(step.accent));
        out.put_u8(u8::from(step.slide));
        out.put_u8(u8::from(step.gate));
    }
}

/// Encode a single pattern.
pub fn encode_pattern(pattern: &Pattern) -> Vec<u8> {
    let mut out = Vec::with_capacity(PATTERN_RECORD_LEN);
    write_pattern(&mut out, pattern);
    out
}

/// Decode a single pattern. The input must hold exactly one record.
pub fn decode_pattern(bytes: &[u8]) -> std::result::Result<Pattern, StateError> {
    let mut r = Reader::new(bytes);
    let pattern = read_pattern(&mut r)?;
    r.finish()?;
    Ok(pattern)
}

fn flag(r: &mut Reader<'_>, field: &'static str) -> std::result::Result<bool, StateError> {
    match r.u8()? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(StateError::invalid(field, format!("{other} is not 0 or 1"))),
    }
}

pub(crate) fn read_pattern(r: &mut Reader<'_>) -> std::result::Result<Pattern, StateError> {
    r.header(PATTERN_MAGIC, PATTERN_VERSION)?;

    let step_length = r.f64()?;
    if !step_length.is_finite() || step_length < MIN_STEP_LENGTH {
        return Err(StateError::invalid(
            "stepLength",
            format!("{step_length} is below {MIN_STEP_LENGTH} beats"),
        ));
    }
    let max_steps = r.i32()?;
    if max_steps != MAX_STEPS as i32 {
        return Err(StateError::StepCapacity { found: max_steps });
    }
    let num_steps = r.i32()?;
    if !(1..=MAX_STEPS as i32).contains(&num_steps) {
        return Err(StateError::invalid(
            "numSteps",
            format!("{num_steps} outside 1..={MAX_STEPS}"),
        ));
    }

    let mut pattern = Pattern::new();
    for index in 0..MAX_STEPS {
        let key = r.i32()?;
        if !(0..12).contains(&key) {
            return Err(StateError::invalid("key", format!("{key} outside 0..=11")));
        }
        let octave = r.i32()?;
        if !(i32::from(MIN_OCTAVE)..=i32::from(MAX_OCTAVE)).contains(&octave) {
            return Err(StateError::invalid(
                "octave",
                format!("{octave} outside {MIN_OCTAVE}..={MAX_OCTAVE}"),
            ));
        }
        let step = Step {
            key: key as u8,
            octave: octave as i8,
            accent: flag(r, "accent")?,
            slide: flag(r, "slide")?,
            gate: flag(r, "gate")?,
        };
        pattern.set_step(index, step);
    }
    pattern.set_num_steps(num_steps as usize);
    pattern.set_step_length(step_length);
    Ok(pattern)
}

/// Encode a whole bank.
pub fn encode_bank(bank: &PatternBank) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + MAX_PATTERNS * PATTERN_RECORD_LEN);
    out.put_i32(BANK_MAGIC);
    out.put_i32(BANK_VERSION);
    out.put_i32(bank.active_index() as i32);
    out.put_i32(MAX_PATTERNS as i32);
    for pattern in bank.patterns() {
        write_pattern(&mut out, pattern);
    }
    out
}

/// Decode a whole bank. Any bad pattern fails the bank.
pub fn decode_bank(bytes: &[u8]) -> std::result::Result<PatternBank, StateError> {
    let mut r = Reader::new(bytes);
    r.header(BANK_MAGIC, BANK_VERSION)?;
    let active = r.i32()?;
    if !(0..MAX_PATTERNS as i32).contains(&active) {
        return Err(StateError::invalid(
            "active",
            format!("{active} outside 0..{MAX_PATTERNS}"),
        ));
    }
    let count = r.i32()?;
    if count != MAX_PATTERNS as i32 {
        return Err(StateError::invalid(
            "count",
            format!("bank holds {MAX_PATTERNS} patterns, found {count}"),
        ));
    }

    let mut bank = PatternBank::new();
    for index in 0..MAX_PATTERNS {
        let pattern = read_pattern(&mut r)?;
        if let Some(slot) = bank.pattern_mut(index) {
            *slot = pattern;
        }
    }
    r.finish()?;
    bank.select(active as usize);
    Ok(bank)
}

/// Load a single pattern file.
pub fn load_pattern(path: impl AsRef<Path>) -> Result<Pattern> {
    let path = path.as_ref();
    let pattern = decode_pattern(&codec::read_file(path)?)?;
    tracing::debug!(path = %path.display(), steps = pattern.num_steps(), "loaded pattern");
    Ok(pattern)
}

/// Save a single pattern file.
pub fn save_pattern(path: impl AsRef<Path>, pattern: &Pattern) -> Result<()> {
    let path = path.as_ref();
    codec::write_file_atomic(path, &encode_pattern(pattern))?;
    tracing::info!(path = %path.display(), "saved pattern");
    Ok(())
}

/// Load a bank file.
pub fn load_bank(path: impl AsRef<Path>) -> Result<PatternBank> {
    let path = path.as_ref();
    let bank = decode_bank(&codec::read_file(path)?)?;
    tracing::debug!(path = %path.display(), pattern = bank.active_index(), "loaded pattern bank");
    Ok(bank)
}

/// Save a bank file.
pub fn save_bank(path: impl AsRef<Path>, bank: &PatternBank) -> Result<()> {
    let path = path.as_ref();
    codec::write_file_atomic(path, &encode_bank(bank))?;
    tracing::info!(path = %path.display(), pattern = bank.active_index(), "saved pattern bank");
    Ok(())
}
