//! Step patterns, the pattern bank, and control-thread editing.
//!
//! A [`Pattern`] is a fixed array of [`MAX_STEPS`] steps of which the first
//! `num_steps` play. A [`PatternBank`] holds [`MAX_PATTERNS`] patterns and the
//! active index. Both are plain `Copy` data so a whole bank can be moved to
//! the audio thread through a snapshot and copied into place without
//! allocating.
//!
//! Editing happens on the control thread through a [`PatternEditor`], which
//! adds a clipboard on top of the bank.
//!
//! # Example
//!
//! ```rust
//! use squelch_core::{PatternEditor, Step};
//!
//! let mut editor = PatternEditor::default();
//! editor.active_mut().set_step(0, Step::note(0, 0).with_accent(true));
//! editor.copy();
//! editor.switch_active_pattern(1);
//! assert!(editor.paste());
//! assert!(editor.bank().active().step(0).gate);
//! ```

/// Step capacity of every pattern.
pub const MAX_STEPS: usize = 16;

/// Number of patterns in a bank.
pub const MAX_PATTERNS: usize = 16;

/// Default step length: sixteenth notes.
pub const DEFAULT_STEP_LENGTH: f64 = 0.25;

/// Shortest accepted step: 256th notes.
pub const MIN_STEP_LENGTH: f64 = 1.0 / 64.0;

/// Lowest octave offset.
pub const MIN_OCTAVE: i8 = -2;

/// Highest octave offset.
pub const MAX_OCTAVE: i8 = 2;

/// One sequencer step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Step {
    /// Pitch class, 0 (C) to 11 (B).
    pub key: u8,
    /// Octave offset, -2..=2.
    pub octave: i8,
    /// Accented note.
    pub accent: bool,
    /// Glide into the next step instead of releasing.
    pub slide: bool,
    /// Whether the step plays at all. A step without gate is a rest.
    pub gate: bool,
}

impl Step {
    /// A rest.
    pub const fn rest() -> Self {
        Self {
            key: 0,
            octave: 0,
            accent: false,
            slide: false,
            gate: false,
        }
    }

    /// A gated note. Out-of-range keys wrap, octaves clamp.
    pub fn note(key: u8, octave: i8) -> Self {
        Self {
            key: key % 12,
            octave: octave.clamp(MIN_OCTAVE, MAX_OCTAVE),
            accent: false,
            slide: false,
            gate: true,
        }
    }

    /// Builder: set the accent flag.
    pub const fn with_accent(mut self, accent: bool) -> Self {
        self.accent = accent;
        self
    }

    /// Builder: set the slide flag.
    pub const fn with_slide(mut self, slide: bool) -> Self {
        self.slide = slide;
        self
    }

    /// Whether key and octave lie in range.
    pub const fn is_valid(&self) -> bool {
        self.key < 12 && self.octave >= MIN_OCTAVE && self.octave <= MAX_OCTAVE
    }

    /// Semitone offset from the root note, before key-permissibility.
    pub const fn semitones(&self) -> i32 {
        self.octave as i32 * 12 + self.key as i32
    }
}

/// A sequence of up to [`MAX_STEPS`] steps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pattern {
    step_length: f64,
    num_steps: u8,
    steps: [Step; MAX_STEPS],
}

impl Pattern {
    /// Sixteen rests of a sixteenth each.
    pub const fn new() -> Self {
        Self {
            step_length: DEFAULT_STEP_LENGTH,
            num_steps: MAX_STEPS as u8,
            steps: [Step::rest(); MAX_STEPS],
        }
    }

    /// A pattern playing `steps` (at most [`MAX_STEPS`] are kept).
    pub fn from_steps(steps: &[Step], step_length: f64) -> Self {
        let mut pattern = Self::new();
        let count = steps.len().clamp(1, MAX_STEPS);
        for (slot, step) in pattern.steps.iter_mut().zip(steps) {
            *slot = *step;
        }
        pattern.num_steps = count as u8;
        pattern.set_step_length(step_length);
        pattern
    }

    /// Beats per step.
    #[inline]
    pub fn step_length(&self) -> f64 {
        self.step_length
    }

    /// Set beats per step. Rejects non-finite lengths and lengths below
    /// [`MIN_STEP_LENGTH`].
    pub fn set_step_length(&mut self, beats: f64) -> bool {
        if beats.is_finite() && beats >= MIN_STEP_LENGTH {
            self.step_length = beats;
            true
        } else {
            false
        }
    }

    /// Number of steps that play.
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.num_steps as usize
    }

    /// Set the number of playing steps, clamped to `1..=16`.
    pub fn set_num_steps(&mut self, count: usize) {
        self.num_steps = count.clamp(1, MAX_STEPS) as u8;
    }

    /// All sixteen slots, including the ones past `num_steps`.
    pub fn steps(&self) -> &[Step; MAX_STEPS] {
        &self.steps
    }

    /// The steps that play.
    pub fn active_steps(&self) -> &[Step] {
        &self.steps[..self.num_steps()]
    }

    /// Step at `index` modulo the slot count.
    #[inline]
    pub fn step(&self, index: usize) -> Step {
        self.steps[index % MAX_STEPS]
    }

    /// Mutable access to a slot.
    pub fn step_mut(&mut self, index: usize) -> Option<&mut Step> {
        self.steps.get_mut(index)
    }

    /// Replace a slot. Returns `false` for an out-of-range index or invalid step.
    pub fn set_step(&mut self, index: usize, step: Step) -> bool {
        match self.steps.get_mut(index) {
            Some(slot) if step.is_valid() => {
                *slot = step;
                true
            }
            _ => false,
        }
    }

    /// Turn every slot into a rest. Length and step length are kept.
    pub fn clear(&mut self) {
        self.steps = [Step::rest(); MAX_STEPS];
    }

    /// Rotate all sixteen slots one position towards the start.
    pub fn shift_left(&mut self) {
        self.steps.rotate_left(1);
    }

    /// Rotate all sixteen slots one position towards the end.
    pub fn shift_right(&mut self) {
        self.steps.rotate_right(1);
    }

    /// Whether no playing step has its gate set.
    pub fn is_silent(&self) -> bool {
        self.active_steps().iter().all(|s| !s.gate)
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::new()
    }
}

/// Sixteen patterns and the index of the one playing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternBank {
    patterns: [Pattern; MAX_PATTERNS],
    active: u8,
}

impl PatternBank {
    /// A bank of empty patterns with pattern 1 active.
    pub const fn new() -> Self {
        Self {
            patterns: [Pattern::new(); MAX_PATTERNS],
            active: 0,
        }
    }

    /// Index of the active pattern, `0..16`.
    #[inline]
    pub fn active_index(&self) -> usize {
        self.active as usize
    }

    /// The active pattern.
    #[inline]
    pub fn active(&self) -> &Pattern {
        &self.patterns[self.active_index()]
    }

    /// The active pattern, mutably.
    pub fn active_mut(&mut self) -> &mut Pattern {
        let index = self.active_index();
        &mut self.patterns[index]
    }

    /// Pattern at `index`.
    pub fn pattern(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    /// Pattern at `index`, mutably.
    pub fn pattern_mut(&mut self, index: usize) -> Option<&mut Pattern> {
        self.patterns.get_mut(index)
    }

    /// All patterns.
    pub fn patterns(&self) -> &[Pattern; MAX_PATTERNS] {
        &self.patterns
    }

    /// Make `index` active. Returns `false` when out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index < MAX_PATTERNS {
            self.active = index as u8;
            true
        } else {
            false
        }
    }

    /// Move the active index by `delta`, wrapping between the first and last pattern.
    pub fn switch_active_pattern(&mut self, delta: i32) -> usize {
        let next = (self.active as i32 + delta).rem_euclid(MAX_PATTERNS as i32);
        self.active = next as u8;
        self.active_index()
    }
}

impl Default for PatternBank {
    fn default() -> Self {
        Self::new()
    }
}

/// Control-thread editing surface: a bank plus a one-pattern clipboard.
#[derive(Debug, Clone, Default)]
pub struct PatternEditor {
    bank: PatternBank,
    clipboard: Option<Pattern>,
}

impl PatternEditor {
    /// Edit an existing bank.
    pub fn new(bank: PatternBank) -> Self {
        Self {
            bank,
            clipboard: None,
        }
    }

    /// The bank being edited.
    pub fn bank(&self) -> &PatternBank {
        &self.bank
    }

    /// The bank being edited, mutably.
    pub fn bank_mut(&mut self) -> &mut PatternBank {
        &mut self.bank
    }

    /// Replace the whole bank. The clipboard survives.
    pub fn replace_bank(&mut self, bank: PatternBank) {
        self.bank = bank;
    }

    /// The active pattern, mutably.
    pub fn active_mut(&mut self) -> &mut Pattern {
        self.bank.active_mut()
    }

    /// Clipboard contents.
    pub fn clipboard(&self) -> Option<&Pattern> {
        self.clipboard.as_ref()
    }

    /// Copy the active pattern to the clipboard.
    pub fn copy(&mut self) {
        self.clipboard = Some(*self.bank.active());
    }

    /// Overwrite the active pattern with the clipboard.
    ///
    /// Returns `false` when the clipboard is empty.
    pub fn paste(&mut self) -> bool {
        match self.clipboard {
            Some(pattern) => {
                *self.bank.active_mut() = pattern;
                true
            }
            None => false,
        }
    }

    /// Clear the active pattern.
    pub fn clear(&mut self) {
        self.bank.active_mut().clear();
    }

    /// Rotate the active pattern left.
    pub fn shift_left(&mut self) {
        self.bank.active_mut().shift_left();
    }

    /// Rotate the active pattern right.
    pub fn shift_right(&mut self) {
        self.bank.active_mut().shift_right();
    }

    /// Move the active index by `delta` with wraparound.
    pub fn switch_active_pattern(&mut self, delta: i32) -> usize {
        self.bank.switch_active_pattern(delta)
    }
}
