//! Band-limited saw/square oscillator.
//!
//! Both shapes share one phase accumulator and are corrected with PolyBLEP
//! (Polynomial Band-Limited Step), so the blend between them never drifts
//! out of phase.

/// Saw/square oscillator with a continuous blend control.
///
/// # Example
///
/// ```rust
/// use squelch_synth::BlendOscillator;
///
/// let mut osc = BlendOscillator::new(48000.0);
/// osc.set_frequency(55.0);
/// osc.set_blend(0.0); // pure saw
///
/// let sample = osc.advance();
/// ```
#[derive(Debug, Clone)]
pub struct BlendOscillator {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    sample_rate: f32,
    frequency: f32,
    /// 0 = saw, 1 = square
    blend: f32,
}

impl Default for BlendOscillator {
    fn default() -> Self {
        Self::new(48000.0)
    }
}

impl BlendOscillator {
    /// Create a saw oscillator at 110 Hz.
    pub fn new(sample_rate: f32) -> Self {
        let sample_rate = sample_rate.max(1.0);
        Self {
            phase: 0.0,
            phase_inc: 110.0 / sample_rate,
            sample_rate,
            frequency: 110.0,
            blend: 0.0,
        }
    }

    /// Set frequency in Hz, limited to just below Nyquist.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.frequency = freq_hz.clamp(0.0, self.sample_rate * 0.45);
        self.phase_inc = self.frequency / self.sample_rate;
    }

    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Set the saw (0) to square (1) blend.
    pub fn set_blend(&mut self, blend: f32) {
        self.blend = blend.clamp(0.0, 1.0);
    }

    /// Current blend.
    pub fn blend(&self) -> f32 {
        self.blend
    }

    /// Reset phase to 0.
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Generate the next sample in `[-1, 1]` (plus PolyBLEP ripple).
    #[inline]
    pub fn advance(&mut self) -> f32 {
        let t = self.phase;
        let dt = self.phase_inc.max(1e-6);

        let saw = 2.0 * t - 1.0 - poly_blep(t, dt);

        let naive = if t < 0.5 { 1.0 } else { -1.0 };
        let falling = t + 0.5;
        let falling = if falling >= 1.0 { falling - 1.0 } else { falling };
        let square = naive + poly_blep(t, dt) - poly_blep(falling, dt);

        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        saw + (square - saw) * self.blend
    }
}

/// 4th-order PolyBLEP correction around a unit step at phase 0.
///
/// The window spans two samples either side of the discontinuity. Returns
/// 0.0 away from it.
#[inline]
fn poly_blep(t: f32, dt: f32) -> f32 {
    // p1(n) = A4 n^4 + A3 n^3 + A2 n^2 + A0 on [0, 1), p2(n) = C (2 - n)^4 on [1, 2)
    const A4: f32 = -43.0 / 48.0;
    const A3: f32 = 7.0 / 6.0;
    const A2: f32 = 0.5;
    const A0: f32 = -1.0;
    const C: f32 = -11.0 / 48.0;

    let piece = |n: f32| {
        if n < 1.0 {
            let n2 = n * n;
            A4 * n2 * n2 + A3 * n2 * n + A2 * n2 + A0
        } else {
            let u = 2.0 - n;
            let u2 = u * u;
            C * u2 * u2
        }
    };

    let dt2 = 2.0 * dt;
    if t < dt2 {
        piece(t / dt)
    } else if t > 1.0 - dt2 {
        -piece((1.0 - t) / dt)
    } else {
        0.0
    }
}
