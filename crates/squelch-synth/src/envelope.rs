//! Attack-decay envelope with an optional release.
//!
//! Unlike an ADSR there is no sustain stage: once the attack peaks, the level
//! falls towards zero whether or not the gate is still held. Releasing the
//! gate switches to the (usually shorter) release time.

use libm::expf;

/// Envelope stages
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeState {
    /// Output is zero.
    #[default]
    Idle,
    /// Rising towards the peak.
    Attack,
    /// Falling from the peak with the decay time.
    Decay,
    /// Falling with the release time after the gate closed.
    Release,
}

/// Level below which the envelope goes idle.
const FLOOR: f32 = 1e-4;

/// Attack-decay envelope generator.
///
/// ```rust
/// use squelch_synth::{DecayEnvelope, EnvelopeState};
///
/// let mut env = DecayEnvelope::new(48000.0);
/// env.set_decay_ms(200.0);
/// env.gate_on();
/// let level = env.advance();
/// assert_eq!(env.state(), EnvelopeState::Attack);
/// ```
#[derive(Debug, Clone)]
pub struct DecayEnvelope {
    state: EnvelopeState,
    level: f32,
    sample_rate: f32,

    attack_ms: f32,
    decay_ms: f32,
    release_ms: f32,

    attack_coeff: f32,
    decay_coeff: f32,
    release_coeff: f32,
}

impl Default for DecayEnvelope {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl DecayEnvelope {
    /// Attack 1 ms, decay 200 ms, release 10 ms.
    pub fn new(sample_rate: f32) -> Self {
        let mut env = Self {
            state: EnvelopeState::Idle,
            level: 0.0,
            sample_rate: sample_rate.max(1.0),
            attack_ms: 1.0,
            decay_ms: 200.0,
            release_ms: 10.0,
            attack_coeff: 0.0,
            decay_coeff: 0.0,
            release_coeff: 0.0,
        };
        env.recalculate_coefficients();
        env
    }

    /// Set attack time in milliseconds.
    pub fn set_attack_ms(&mut self, ms: f32) {
        self.attack_ms = ms.max(0.01);
        self.attack_coeff = self.coeff(self.attack_ms);
    }

    /// Set decay time in milliseconds (time constant of the fall).
    pub fn set_decay_ms(&mut self, ms: f32) {
        self.decay_ms = ms.max(0.1);
        self.decay_coeff = self.coeff(self.decay_ms);
    }

    /// Decay time in milliseconds.
    pub fn decay_ms(&self) -> f32 {
        self.decay_ms
    }

    /// Set release time in milliseconds.
    pub fn set_release_ms(&mut self, ms: f32) {
        self.release_ms = ms.max(0.1);
        self.release_coeff = self.coeff(self.release_ms);
    }

    /// Set sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.recalculate_coefficients();
    }

    /// Start from the current level (no click on retrigger).
    pub fn gate_on(&mut self) {
        self.state = EnvelopeState::Attack;
    }

    /// Switch to the release time.
    pub fn gate_off(&mut self) {
        if self.state != EnvelopeState::Idle {
            self.state = EnvelopeState::Release;
        }
    }

    /// Force idle at zero.
    pub fn reset(&mut self) {
        self.state = EnvelopeState::Idle;
        self.level = 0.0;
    }

    /// Current stage.
    pub fn state(&self) -> EnvelopeState {
        self.state
    }

    /// Current level without advancing.
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Not idle.
    pub fn is_active(&self) -> bool {
        self.state != EnvelopeState::Idle
    }

    /// Advance one sample and return the level.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        match self.state {
            EnvelopeState::Idle => self.level = 0.0,
            EnvelopeState::Attack => {
                // Aim past 1.0 so the peak is reached in finite time
                const TARGET: f32 = 1.5;
                self.level = TARGET + (self.level - TARGET) * self.attack_coeff;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.state = EnvelopeState::Decay;
                }
            }
            EnvelopeState::Decay => self.fall(self.decay_coeff),
            EnvelopeState::Release => self.fall(self.release_coeff),
        }
        self.level
    }

    #[inline]
    fn fall(&mut self, coeff: f32) {
        self.level *= coeff;
        if self.level < FLOOR {
            self.level = 0.0;
            self.state = EnvelopeState::Idle;
        }
    }

    fn coeff(&self, ms: f32) -> f32 {
        let samples = ms * self.sample_rate / 1000.0;
        expf(-1.0 / samples.max(1.0))
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = self.coeff(self.attack_ms);
        self.decay_coeff = self.coeff(self.decay_ms);
        self.release_coeff = self.coeff(self.release_ms);
    }
}
