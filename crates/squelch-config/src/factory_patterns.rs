//! Factory patterns bundled with the library.
//!
//! Written in the step notation of [`crate::notation`] and parsed on demand.

use squelch_core::{DEFAULT_STEP_LENGTH, Pattern, PatternBank};

use crate::notation::parse_pattern;

/// Array of factory pattern names, in bank order.
pub static FACTORY_PATTERN_NAMES: &[&str] = &["acid", "octaves", "walk", "stab"];

static FACTORY_PATTERNS: &[(&str, &str)] = &[
    (
        "acid",
        "Ca . C+1s G . D#s C . A#-1 . Ca Fs G . C+1a .",
    ),
    ("octaves", "C C+1s C C+1a C C+1s C C+1"),
    ("walk", "C D#s F F#s G . A#a G F D# C . C+1a . G-1s C"),
    ("stab", "Ca . . Ca . . Ca . G-1a . . . A#-1a . . ."),
];

/// Get a factory pattern by name.
pub fn get_factory_pattern(name: &str) -> Option<Pattern> {
    FACTORY_PATTERNS
        .iter()
        .find(|(n, _)| *n == name)
        .and_then(|(_, text)| parse_pattern(text, DEFAULT_STEP_LENGTH).ok())
}

/// A bank with the factory patterns in its first slots, the rest empty.
pub fn factory_bank() -> PatternBank {
    let mut bank = PatternBank::new();
    for (index, name) in FACTORY_PATTERN_NAMES.iter().enumerate() {
        if let (Some(slot), Some(pattern)) = (bank.pattern_mut(index), get_factory_pattern(name)) {
            *slot = pattern;
        }
    }
    bank
}
