//! Step sequencer: turns the active pattern into note events on the engine.
//!
//! The sequencer is clocked from the [`Transport`]. Each call to
//! [`Sequencer::dispatch_due`] plays every step boundary and every scheduled
//! release at or before the current beat position, so its timing resolution
//! is whatever granularity the caller drives it at (one scheduler slice).
//!
//! Keys outside the permitted set are resolved through [`KeyState`] and a
//! [`KeyPolicy`]. Pattern changes are picked up at step boundaries according
//! to the [`SwitchPolicy`].

use crate::engine::SynthEngine;
use crate::event::KeyMask;
use crate::pattern::{Pattern, PatternBank, Step};
use crate::transport::Transport;

/// Velocity of accented steps.
pub const ACCENT_VELOCITY: u8 = 127;

/// Velocity of unaccented steps.
pub const NORMAL_VELOCITY: u8 = 100;

/// Default MIDI pitch of key 0, octave 0 (C2).
pub const DEFAULT_ROOT_NOTE: u8 = 36;

/// Default fraction of a step a non-sliding note sounds for.
pub const DEFAULT_GATE_LENGTH: f64 = 0.5;

/// Slack when comparing beat positions, absorbs float rounding at boundaries.
const BEAT_EPSILON: f64 = 1e-9;

/// Most step boundaries played by one [`Sequencer::dispatch_due`] call.
/// Steps further behind are skipped rather than replayed.
pub const MAX_BOUNDARIES_PER_CALL: usize = 64;

/// Which incoming mask constrains the sequencer's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyFollow {
    /// Every key plays as written.
    #[default]
    Off,
    /// Follow the latest scale mask.
    Scale,
    /// Follow the latest chord mask, rotated onto its root.
    Chord,
}

/// What happens to a step whose key is not permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    /// Treat the step as a rest.
    Mute,
    /// Move to the nearest permitted key, ties downward.
    #[default]
    Transpose,
    /// Replay the last pitch that played, or rest if none has.
    Hold,
}

/// When a newly selected pattern starts playing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwitchPolicy {
    /// At the next step boundary.
    #[default]
    NextStep,
    /// When the playing pattern wraps back to its first step.
    PatternEnd,
}

/// Outcome of checking a key against the current mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResolution {
    /// Play this pitch class.
    Play(u8),
    /// Play nothing.
    Mute,
    /// Replay the previous pitch.
    Hold,
}

/// Key-permissibility state fed by scale and chord mask events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    follow: KeyFollow,
    scale: KeyMask,
    chord: KeyMask,
    chord_root: u8,
}

impl KeyState {
    /// State following `follow`, with every key permitted until a mask arrives.
    pub fn new(follow: KeyFollow) -> Self {
        Self {
            follow,
            ..Self::default()
        }
    }

    /// Current follow mode.
    pub fn follow(&self) -> KeyFollow {
        self.follow
    }

    /// Change the follow mode. Stored masks are kept.
    pub fn set_follow(&mut self, follow: KeyFollow) {
        self.follow = follow;
    }

    /// Replace the scale mask.
    pub fn set_scale(&mut self, mask: KeyMask) {
        self.scale = mask;
    }

    /// Replace the chord mask and its root.
    pub fn set_chord(&mut self, root: u8, mask: KeyMask) {
        self.chord_root = root % 12;
        self.chord = mask;
    }

    /// Mask in force. An empty mask permits everything.
    pub fn mask(&self) -> KeyMask {
        let mask = match self.follow {
            KeyFollow::Off => KeyMask::ALL,
            KeyFollow::Scale => self.scale,
            KeyFollow::Chord => self.chord.rotate(self.chord_root),
        };
        if mask.is_empty() { KeyMask::ALL } else { mask }
    }

    /// Resolve `key` under `policy`.
    pub fn resolve(&self, key: u8, policy: KeyPolicy) -> KeyResolution {
        let mask = self.mask();
        if mask.contains(key) {
            return KeyResolution::Play(key % 12);
        }
        match policy {
            KeyPolicy::Mute => KeyResolution::Mute,
            KeyPolicy::Hold => KeyResolution::Hold,
            KeyPolicy::Transpose => mask
                .nearest(key)
                .map_or(KeyResolution::Mute, KeyResolution::Play),
        }
    }
}

/// Sequencer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequencerConfig {
    /// MIDI pitch of key 0 at octave 0.
    pub root_note: u8,
    /// Fraction of a step a non-sliding note sounds for, `(0, 1]`.
    pub gate_length: f64,
    /// How disallowed keys are handled.
    pub key_policy: KeyPolicy,
    /// When a pattern change takes effect.
    pub switch_policy: SwitchPolicy,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            root_note: DEFAULT_ROOT_NOTE,
            gate_length: DEFAULT_GATE_LENGTH,
            key_policy: KeyPolicy::default(),
            switch_policy: SwitchPolicy::default(),
        }
    }
}

/// A note the sequencer has started and not yet released.
#[derive(Debug, Clone, Copy, PartialEq)]
struct HeldNote {
    pitch: u8,
    /// Beat of the scheduled release. `None` while sliding into the next step.
    release: Option<f64>,
}

/// Plays the active pattern of a [`PatternBank`] against a [`Transport`].
#[derive(Debug, Clone)]
pub struct Sequencer {
    config: SequencerConfig,
    /// Copy of the pattern being played, refreshed at every boundary.
    pattern: Pattern,
    playing: usize,
    /// Beat at which step counting restarted.
    origin: f64,
    /// Boundaries played since `origin`.
    steps_played: u64,
    current_step: usize,
    held: Option<HeldNote>,
    last_pitch: Option<u8>,
}

impl Sequencer {
    /// Sequencer positioned before the first step of pattern 1.
    pub fn new(config: SequencerConfig) -> Self {
        let gate_length = if config.gate_length.is_finite() {
            config.gate_length.clamp(f64::EPSILON, 1.0)
        } else {
            DEFAULT_GATE_LENGTH
        };
        Self {
            config: SequencerConfig {
                gate_length,
                ..config
            },
            pattern: Pattern::new(),
            playing: 0,
            origin: 0.0,
            steps_played: 0,
            current_step: 0,
            held: None,
            last_pitch: None,
        }
    }

    /// Settings in force.
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Index of the pattern being played.
    pub fn playing_pattern(&self) -> usize {
        self.playing
    }

    /// Step index of the most recent boundary.
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Pitch still sounding, if any.
    pub fn held_pitch(&self) -> Option<u8> {
        self.held.map(|h| h.pitch)
    }

    /// Forget the held note without telling the engine.
    ///
    /// For use after the engine has already been silenced.
    pub fn clear_held(&mut self) {
        self.held = None;
    }

    /// Start over from step 0 at beat 0.
    pub fn restart(&mut self) {
        self.origin = 0.0;
        self.steps_played = 0;
        self.current_step = 0;
        self.held = None;
        self.last_pitch = None;
    }

    /// Play every boundary and release due at the transport's position.
    ///
    /// At most [`MAX_BOUNDARIES_PER_CALL`] boundaries are played. When the
    /// transport is further ahead, the missed steps are skipped and only the
    /// latest due boundary plays. Returns the number of note events sent to
    /// the engine.
    pub fn dispatch_due<E: SynthEngine + ?Sized>(
        &mut self,
        transport: &Transport,
        bank: &PatternBank,
        keys: &KeyState,
        engine: &mut E,
    ) -> usize {
        let now = transport.elapsed_beats() + BEAT_EPSILON;
        let mut sent = 0;
        let mut entered = 0;
        loop {
            let boundary = self.next_boundary();
            if let Some(HeldNote {
                pitch,
                release: Some(release),
            }) = self.held
                && release <= boundary + BEAT_EPSILON
                && release <= now
            {
                engine.note_off(pitch);
                self.held = None;
                sent += 1;
                continue;
            }
            if boundary > now {
                return sent;
            }
            if entered == MAX_BOUNDARIES_PER_CALL {
                let boundary = self.skip_to(now);
                return sent + self.enter_boundary(boundary, bank, keys, engine);
            }
            sent += self.enter_boundary(boundary, bank, keys, engine);
            entered += 1;
        }
    }

    /// Jump to the last boundary at or before `now` and return its position.
    fn skip_to(&mut self, now: f64) -> f64 {
        let length = self.pattern.step_length();
        let behind = libm::floor((now - self.origin) / length);
        if behind.is_finite() && behind > self.steps_played as f64 {
            self.steps_played = behind as u64;
        }
        self.next_boundary()
    }

    fn next_boundary(&self) -> f64 {
        self.origin + self.steps_played as f64 * self.pattern.step_length()
    }

    /// Pick up pattern switches and edits, then play the step at `boundary`.
    fn enter_boundary<E: SynthEngine + ?Sized>(
        &mut self,
        boundary: f64,
        bank: &PatternBank,
        keys: &KeyState,
        engine: &mut E,
    ) -> usize {
        let wrapped = self.steps_played % self.pattern.num_steps() as u64 == 0;
        let requested = bank.active_index();
        if requested != self.playing
            && (self.config.switch_policy == SwitchPolicy::NextStep || wrapped)
        {
            self.playing = requested;
        }

        let previous = self.pattern;
        if let Some(pattern) = bank.pattern(self.playing) {
            self.pattern = *pattern;
        }
        if self.pattern.step_length() != previous.step_length()
            || self.pattern.num_steps() != previous.num_steps()
        {
            self.origin = boundary;
            self.steps_played = 0;
        }

        let index = (self.steps_played % self.pattern.num_steps() as u64) as usize;
        self.current_step = index;
        self.steps_played += 1;

        let step = self.pattern.step(index);
        match self.resolve_pitch(step, keys) {
            Some(pitch) => self.play(boundary, step, pitch, engine),
            None => self.release(engine),
        }
    }

    fn resolve_pitch(&self, step: Step, keys: &KeyState) -> Option<u8> {
        if !step.gate {
            return None;
        }
        match keys.resolve(step.key, self.config.key_policy) {
            KeyResolution::Play(key) => {
                let pitch = self.config.root_note as i32 + step.octave as i32 * 12 + key as i32;
                Some(pitch.clamp(0, 127) as u8)
            }
            KeyResolution::Mute => None,
            KeyResolution::Hold => self.last_pitch,
        }
    }

    fn play<E: SynthEngine + ?Sized>(
        &mut self,
        boundary: f64,
        step: Step,
        pitch: u8,
        engine: &mut E,
    ) -> usize {
        let velocity = if step.accent {
            ACCENT_VELOCITY
        } else {
            NORMAL_VELOCITY
        };
        let mut sent = 0;
        match self.held.take() {
            Some(HeldNote {
                pitch: old,
                release: None,
            }) => {
                // Legato: new note first so the engine glides.
                engine.note_on(pitch, velocity);
                sent += 1;
                if old != pitch {
                    engine.note_off(old);
                    sent += 1;
                }
            }
            Some(HeldNote { pitch: old, .. }) => {
                engine.note_off(old);
                engine.note_on(pitch, velocity);
                sent += 2;
            }
            None => {
                engine.note_on(pitch, velocity);
                sent += 1;
            }
        }
        let release = if step.slide {
            None
        } else {
            Some(boundary + self.config.gate_length * self.pattern.step_length())
        };
        self.held = Some(HeldNote { pitch, release });
        self.last_pitch = Some(pitch);
        sent
    }

    fn release<E: SynthEngine + ?Sized>(&mut self, engine: &mut E) -> usize {
        match self.held.take() {
            Some(note) => {
                engine.note_off(note.pitch);
                1
            }
            None => 0,
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new(SequencerConfig::default())
    }
}
