//! The reference bass voice.

use libm::{exp2f, expf, powf};
use squelch_core::{ACCENT_VELOCITY, PARAM_COUNT, ParamId, SynthEngine};

use crate::envelope::DecayEnvelope;
use crate::filter::LadderFilter;
use crate::oscillator::BlendOscillator;

/// Glide time constant for slides.
pub const SLIDE_MS: f32 = 60.0;

/// Octaves the filter envelope can open the cutoff at full Env Mod.
const ENV_MOD_OCTAVES: f32 = 4.0;

/// Octaves an accent can add to the cutoff at full Accent.
const ACCENT_OCTAVES: f32 = 2.0;

/// Decay of the accent sweep, independent of the Decay knob.
const ACCENT_DECAY_MS: f32 = 200.0;

/// Amplitude decay while the gate is held.
const AMP_DECAY_MS: f32 = 3000.0;

/// Amplitude release after the gate closes.
const AMP_RELEASE_MS: f32 = 8.0;

/// Frequency of a (fractional) MIDI pitch, with A4 tuned to `a4_hz`.
#[inline]
pub fn midi_to_freq(pitch: f32, a4_hz: f32) -> f32 {
    a4_hz * exp2f((pitch - 69.0) / 12.0)
}

/// Monophonic 303-style voice.
///
/// Parameter changes arrive in physical units through
/// [`SynthEngine::set_parameter`] and are dispatched through a table indexed
/// by parameter id. A note-on while another note is held slides to the new
/// pitch without retriggering the envelopes.
///
/// # Example
///
/// ```rust
/// use squelch_core::{SynthEngine, layout};
/// use squelch_synth::AcidVoice;
///
/// let mut voice = AcidVoice::new(48000.0);
/// voice.set_parameter(layout::CUTOFF, 800.0);
/// voice.note_on(36, 127);
///
/// let block: Vec<f32> = (0..256).map(|_| voice.render_sample()).collect();
/// assert!(block.iter().any(|s| *s != 0.0));
/// ```
#[derive(Debug, Clone)]
pub struct AcidVoice {
    osc: BlendOscillator,
    filter: LadderFilter,
    amp_env: DecayEnvelope,
    filter_env: DecayEnvelope,
    accent_env: DecayEnvelope,

    sample_rate: f32,
    /// Held pitch, if the gate is open
    held: Option<u8>,
    /// Sounding pitch in semitones, glides towards `target_pitch`
    pitch: f32,
    target_pitch: f32,
    sliding: bool,
    glide_coeff: f32,
    accented: bool,

    // Physical parameter values
    tuning: f32,
    cutoff: f32,
    env_mod: f32,
    accent: f32,
    gain: f32,
    bend: f32,
}

impl Default for AcidVoice {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

/// Setter per parameter id. Ids the voice has no use for map to [`ignore`].
static SETTERS: [fn(&mut AcidVoice, f64); PARAM_COUNT] = [
    AcidVoice::set_waveform,
    AcidVoice::set_tuning,
    AcidVoice::set_cutoff,
    AcidVoice::set_resonance,
    AcidVoice::set_env_mod,
    AcidVoice::set_decay,
    AcidVoice::set_accent,
    AcidVoice::set_volume,
    AcidVoice::set_filter_type,
    ignore, // audio peak
    AcidVoice::set_pitch_bend,
    ignore, // decay mode is folded into the decay conversion
    ignore, // pattern
    ignore, // step position
];

fn ignore(_voice: &mut AcidVoice, _value: f64) {}

impl AcidVoice {
    /// A voice with the parameter table's default sound.
    pub fn new(sample_rate: f32) -> Self {
        let mut voice = Self {
            osc: BlendOscillator::new(sample_rate),
            filter: LadderFilter::new(sample_rate),
            amp_env: DecayEnvelope::new(sample_rate),
            filter_env: DecayEnvelope::new(sample_rate),
            accent_env: DecayEnvelope::new(sample_rate),
            sample_rate: sample_rate.max(1.0),
            held: None,
            pitch: 36.0,
            target_pitch: 36.0,
            sliding: false,
            glide_coeff: 0.0,
            accented: false,
            tuning: 440.0,
            cutoff: 2394.0,
            env_mod: 0.25,
            accent: 0.5,
            gain: powf(10.0, -12.0 / 20.0),
            bend: 0.0,
        };
        voice.amp_env.set_decay_ms(AMP_DECAY_MS);
        voice.amp_env.set_release_ms(AMP_RELEASE_MS);
        voice.accent_env.set_decay_ms(ACCENT_DECAY_MS);
        voice.filter.set_mode(crate::filter::MODE_TB303);
        voice.filter.set_resonance(0.5);
        voice.osc.set_blend(0.85);
        voice.update_glide_coeff();
        voice
    }

    /// Change sample rate, keeping all settings.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.osc = {
            let mut osc = BlendOscillator::new(self.sample_rate);
            osc.set_blend(self.osc.blend());
            osc
        };
        self.filter.set_sample_rate(self.sample_rate);
        self.amp_env.set_sample_rate(self.sample_rate);
        self.filter_env.set_sample_rate(self.sample_rate);
        self.accent_env.set_sample_rate(self.sample_rate);
        self.update_glide_coeff();
    }

    fn update_glide_coeff(&mut self) {
        let samples = SLIDE_MS * self.sample_rate / 1000.0;
        self.glide_coeff = expf(-1.0 / samples.max(1.0));
    }

    /// Pitch currently held by the gate.
    pub fn held_pitch(&self) -> Option<u8> {
        self.held
    }

    /// Sounding pitch in semitones, including any glide in progress.
    pub fn current_pitch(&self) -> f32 {
        self.pitch
    }

    /// Whether the amplitude envelope is still running.
    pub fn is_sounding(&self) -> bool {
        self.amp_env.is_active()
    }

    /// Current filter cutoff including modulation.
    pub fn filter_cutoff(&self) -> f32 {
        self.filter.cutoff()
    }

    /// Selected filter response.
    pub fn filter_mode(&self) -> usize {
        self.filter.mode()
    }

    fn set_waveform(&mut self, value: f64) {
        self.osc.set_blend(value as f32);
    }

    fn set_tuning(&mut self, value: f64) {
        self.tuning = value as f32;
    }

    fn set_cutoff(&mut self, value: f64) {
        self.cutoff = value as f32;
    }

    fn set_resonance(&mut self, value: f64) {
        self.filter.set_resonance(value as f32 / 100.0);
    }

    fn set_env_mod(&mut self, value: f64) {
        self.env_mod = (value as f32 / 100.0).clamp(0.0, 1.0);
    }

    fn set_decay(&mut self, value: f64) {
        self.filter_env.set_decay_ms(value as f32);
    }

    fn set_accent(&mut self, value: f64) {
        self.accent = (value as f32 / 100.0).clamp(0.0, 1.0);
    }

    fn set_volume(&mut self, value: f64) {
        self.gain = powf(10.0, value as f32 / 20.0);
    }

    fn set_filter_type(&mut self, value: f64) {
        self.filter.set_mode(value.max(0.0) as usize);
    }

    fn set_pitch_bend(&mut self, value: f64) {
        self.bend = value as f32;
    }
}

impl SynthEngine for AcidVoice {
    fn set_parameter(&mut self, id: ParamId, value: f64) {
        if let Some(setter) = SETTERS.get(id.index()) {
            setter(self, value);
        }
    }

    fn render_sample(&mut self) -> f32 {
        if self.sliding {
            self.pitch = self.target_pitch + (self.pitch - self.target_pitch) * self.glide_coeff;
        } else {
            self.pitch = self.target_pitch;
        }

        self.osc
            .set_frequency(midi_to_freq(self.pitch + self.bend, self.tuning));
        let raw = self.osc.advance();

        let amp = self.amp_env.advance();
        let sweep = self.filter_env.advance();
        let accent = if self.accented {
            self.accent_env.advance() * self.accent
        } else {
            0.0
        };

        let octaves = self.env_mod * ENV_MOD_OCTAVES * sweep + ACCENT_OCTAVES * accent;
        self.filter.set_cutoff(self.cutoff * exp2f(octaves));
        let filtered = self.filter.process(raw * 0.5);

        filtered * amp * (1.0 + accent) * self.gain
    }

    fn note_on(&mut self, pitch: u8, velocity: u8) {
        let legato = self.held.is_some() && self.amp_env.is_active();
        self.held = Some(pitch);
        self.target_pitch = f32::from(pitch);

        if legato {
            self.sliding = true;
            return;
        }

        self.sliding = false;
        self.pitch = self.target_pitch;
        self.accented = velocity >= ACCENT_VELOCITY;
        self.amp_env.gate_on();
        self.filter_env.gate_on();
        if self.accented {
            self.accent_env.gate_on();
        }
    }

    fn note_off(&mut self, pitch: u8) {
        if self.held == Some(pitch) {
            self.held = None;
            self.sliding = false;
            self.amp_env.gate_off();
        }
    }

    fn all_notes_off(&mut self) {
        self.held = None;
        self.sliding = false;
        self.amp_env.gate_off();
        self.accent_env.reset();
    }
}
