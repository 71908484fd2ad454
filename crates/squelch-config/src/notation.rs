//! Compact text notation for steps and patterns.
//!
//! A step is `.` for a rest, or a note name with an optional octave offset
//! and flags: `C`, `D#+1`, `A#-2as`. Flags are `a` (accent) and `s`
//! (slide). A pattern is whitespace-separated steps.

use squelch_core::{MAX_OCTAVE, MAX_STEPS, MIN_OCTAVE, MIN_STEP_LENGTH, Pattern, Step};

use crate::error::StateError;

/// Note names in key order.
pub const KEY_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Parse one step.
pub fn parse_step(text: &str) -> Result<Step, StateError> {
    let text = text.trim();
    if text == "." || text == "-" {
        return Ok(Step::rest());
    }

    let mut chars = text.chars().peekable();
    let base = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(StateError::invalid("key", format!("'{text}' has no note name"))),
    };
    let sharp = chars.next_if_eq(&'#').is_some();
    if sharp && (base == 4 || base == 11) {
        return Err(StateError::invalid("key", format!("'{text}' is not a note")));
    }

    let mut octave = 0i8;
    if let Some(sign) = chars.next_if(|c| *c == '+' || *c == '-') {
        let digit = chars
            .next()
            .and_then(|c| c.to_digit(10))
            .ok_or_else(|| StateError::invalid("octave", format!("'{text}' has a bare sign")))?;
        octave = if sign == '-' {
            -(digit as i8)
        } else {
            digit as i8
        };
        if !(MIN_OCTAVE..=MAX_OCTAVE).contains(&octave) {
            return Err(StateError::invalid(
                "octave",
                format!("{octave} outside {MIN_OCTAVE}..={MAX_OCTAVE}"),
            ));
        }
    }

    let mut step = Step::note(base + u8::from(sharp), octave);
    for flag in chars {
        match flag {
            'a' => step.accent = true,
            's' => step.slide = true,
            other => {
                return Err(StateError::invalid(
                    "flag",
                    format!("unknown flag '{other}' in '{text}'"),
                ));
            }
        }
    }
    Ok(step)
}

/// Format one step in the notation [`parse_step`] reads.
pub fn format_step(step: &Step) -> String {
    if !step.gate {
        return ".".to_string();
    }
    let mut out = String::from(KEY_NAMES[usize::from(step.key % 12)]);
    if step.octave != 0 {
        out.push_str(&format!("{:+}", step.octave));
    }
    if step.accent {
        out.push('a');
    }
    if step.slide {
        out.push('s');
    }
    out
}

/// Parse a whitespace-separated pattern of 1 to 16 steps.
pub fn parse_pattern(text: &str, step_length: f64) -> Result<Pattern, StateError> {
    let steps = text
        .split_whitespace()
        .map(parse_step)
        .collect::<Result<Vec<_>, _>>()?;
    if steps.is_empty() || steps.len() > MAX_STEPS {
        return Err(StateError::invalid(
            "numSteps",
            format!("{} steps outside 1..={MAX_STEPS}", steps.len()),
        ));
    }
    if !(step_length.is_finite() && step_length >= MIN_STEP_LENGTH) {
        return Err(StateError::invalid(
            "stepLength",
            format!("{step_length} is below {MIN_STEP_LENGTH} beats"),
        ));
    }
    Ok(Pattern::from_steps(&steps, step_length))
}

/// Format the playing steps of a pattern.
pub fn format_pattern(pattern: &Pattern) -> String {
    pattern
        .active_steps()
        .iter()
        .map(format_step)
        .collect::<Vec<_>>()
        .join(" ")
}
