//! Four-stage ladder filter with selectable response.
//!
//! Four cascaded one-pole lowpass stages with saturated global feedback.
//! Each response is a fixed weighted sum of the stage taps, so switching
//! mode never resets the filter state.

use core::f32::consts::PI;
use libm::{tanf, tanhf};

/// Number of responses, matching the filter-type selector.
pub const FILTER_MODE_COUNT: usize = 16;

/// Tap weights `[u, y1, y2, y3, y4]` per mode, in selector order:
/// Flat, LP 6..24, HP 6..24, BP 12/12, 6/18, 18/6, 6/12, 12/6, 6/6, TB 303.
///
/// BP a/b is a highpass of slope a dB/oct followed by a lowpass of b.
static MODE_TAPS: [[f32; 5]; FILTER_MODE_COUNT] = [
    [1.0, 0.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 1.0],
    [1.0, -1.0, 0.0, 0.0, 0.0],
    [1.0, -2.0, 1.0, 0.0, 0.0],
    [1.0, -3.0, 3.0, -1.0, 0.0],
    [1.0, -4.0, 6.0, -4.0, 1.0],
    [0.0, 0.0, 1.0, -2.0, 1.0],
    [0.0, 0.0, 0.0, 1.0, -1.0],
    [0.0, 1.0, -3.0, 3.0, -1.0],
    [0.0, 0.0, 1.0, -1.0, 0.0],
    [0.0, 1.0, -2.0, 1.0, 0.0],
    [0.0, 1.0, -1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 0.0, 1.0],
];

/// Index of the 303-flavoured lowpass.
pub const MODE_TB303: usize = 15;

/// Ladder filter.
#[derive(Debug, Clone)]
pub struct LadderFilter {
    sample_rate: f32,
    cutoff: f32,
    resonance: f32,
    mode: usize,
    /// One-pole gain, g / (1 + g)
    gain: f32,
    /// Feedback amount, 0..4
    feedback: f32,
    /// Integrator states
    states: [f32; 4],
    /// Last output of each stage
    taps: [f32; 4],
}

impl Default for LadderFilter {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl LadderFilter {
    /// 24 dB lowpass at 1 kHz, no resonance.
    pub fn new(sample_rate: f32) -> Self {
        let mut filter = Self {
            sample_rate: sample_rate.max(1.0),
            cutoff: 1000.0,
            resonance: 0.0,
            mode: 4,
            gain: 0.0,
            feedback: 0.0,
            states: [0.0; 4],
            taps: [0.0; 4],
        };
        filter.update_gain();
        filter
    }

    /// Set cutoff in Hz, limited to `20 Hz..0.45 fs`.
    #[inline]
    pub fn set_cutoff(&mut self, hz: f32) {
        let hz = hz.clamp(20.0, self.sample_rate * 0.45);
        if hz != self.cutoff {
            self.cutoff = hz;
            self.update_gain();
        }
    }

    /// Cutoff in Hz.
    pub fn cutoff(&self) -> f32 {
        self.cutoff
    }

    /// Set resonance, 0 (none) to 1 (edge of self-oscillation).
    pub fn set_resonance(&mut self, amount: f32) {
        self.resonance = amount.clamp(0.0, 1.0);
        self.feedback = 3.9 * self.resonance;
    }

    /// Select a response by selector index. Out-of-range indices are ignored.
    pub fn set_mode(&mut self, mode: usize) {
        if mode < FILTER_MODE_COUNT {
            self.mode = mode;
        }
    }

    /// Selected response.
    pub fn mode(&self) -> usize {
        self.mode
    }

    /// Set sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate.max(1.0);
        self.update_gain();
    }

    /// Clear the stage memories.
    pub fn reset(&mut self) {
        self.states = [0.0; 4];
        self.taps = [0.0; 4];
    }

    fn update_gain(&mut self) {
        let g = tanf(PI * self.cutoff / self.sample_rate);
        self.gain = g / (1.0 + g);
    }

    /// Filter one sample.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let feedback = if self.mode == MODE_TB303 {
            // Softer resonance, less passband loss
            self.feedback * 0.8
        } else {
            self.feedback
        };
        let u = tanhf(input - feedback * self.taps[3]);

        let mut x = u;
        for (state, tap) in self.states.iter_mut().zip(&mut self.taps) {
            let v = (x - *state) * self.gain;
            let y = v + *state;
            *state = y + v;
            *tap = y;
            x = y;
        }

        let weights = &MODE_TAPS[self.mode];
        let mut out = weights[0] * u;
        for (w, y) in weights[1..].iter().zip(self.taps) {
            out += w * y;
        }
        if self.mode == MODE_TB303 {
            // Passband compensation
            out * (1.0 + 0.5 * self.resonance)
        } else {
            out
        }
    }
}
