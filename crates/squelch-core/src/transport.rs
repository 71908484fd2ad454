//! Tempo and musical position for the step sequencer.
//!
//! The transport counts samples and converts them to beats. A tempo change
//! folds the beats elapsed so far into a base offset before switching rate,
//! so the beat position never jumps backwards or skips.

/// Lowest accepted tempo.
pub const MIN_BPM: f64 = 1.0;

/// Highest accepted tempo. Faster requests are clamped.
pub const MAX_BPM: f64 = 999.0;

/// Transport state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    /// Not advancing.
    #[default]
    Stopped,
    /// Advancing with every processed slice.
    Playing,
}

/// Sample-driven musical clock.
///
/// # Example
///
/// ```rust
/// use squelch_core::Transport;
///
/// let mut transport = Transport::new(48000.0, 120.0);
/// transport.play();
/// transport.advance(24000);
/// assert!((transport.elapsed_beats() - 1.0).abs() < 1e-12);
///
/// transport.set_tempo(60.0);
/// transport.advance(48000);
/// assert!((transport.elapsed_beats() - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Transport {
    bpm: f64,
    sample_rate: f64,
    beats_per_sample: f64,
    /// Beats accumulated before the last tempo change.
    base_beats: f64,
    /// Samples since the last tempo change.
    position: u64,
    state: TransportState,
}

impl Transport {
    /// Create a stopped transport at beat zero.
    pub fn new(sample_rate: f64, bpm: f64) -> Self {
        let bpm = if bpm.is_finite() { bpm.clamp(MIN_BPM, MAX_BPM) } else { 120.0 };
        Self {
            bpm,
            sample_rate,
            beats_per_sample: bpm / 60.0 / sample_rate,
            base_beats: 0.0,
            position: 0,
            state: TransportState::Stopped,
        }
    }

    /// Change tempo without moving the beat position.
    ///
    /// Non-finite or non-positive tempos are ignored; returns whether the
    /// tempo was accepted.
    pub fn set_tempo(&mut self, bpm: f64) -> bool {
        if !bpm.is_finite() || bpm <= 0.0 {
            return false;
        }
        let bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        if bpm != self.bpm {
            self.base_beats = self.elapsed_beats();
            self.position = 0;
            self.bpm = bpm;
            self.beats_per_sample = bpm / 60.0 / self.sample_rate;
        }
        true
    }

    /// Current tempo in BPM.
    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Beats covered by one sample at the current tempo.
    pub fn beats_per_sample(&self) -> f64 {
        self.beats_per_sample
    }

    /// Start advancing.
    pub fn play(&mut self) {
        self.state = TransportState::Playing;
    }

    /// Stop advancing. The position is kept.
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
    }

    /// Current state.
    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Whether the transport is playing.
    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Return to beat zero.
    pub fn rewind(&mut self) {
        self.base_beats = 0.0;
        self.position = 0;
    }

    /// Advance by `samples` if playing.
    pub fn advance(&mut self, samples: usize) {
        if self.is_playing() {
            self.position = self.position.wrapping_add(samples as u64);
        }
    }

    /// Beats elapsed since the last rewind.
    pub fn elapsed_beats(&self) -> f64 {
        self.base_beats + self.position as f64 * self.beats_per_sample
    }

    /// Length of `beats` in samples at the current tempo.
    pub fn beats_to_samples(&self, beats: f64) -> f64 {
        beats / self.beats_per_sample
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new(48000.0, 120.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopped_transport_does_not_move() {
        let mut t = Transport::new(48000.0, 120.0);
        t.advance(1000);
        assert_eq!(t.elapsed_beats(), 0.0);
    }

    #[test]
    fn one_beat_at_120_bpm() {
        let mut t = Transport::new(48000.0, 120.0);
        t.play();
        t.advance(24000);
        assert!((t.elapsed_beats() - 1.0).abs() < 1e-12);
        assert!((t.beats_to_samples(0.25) - 6000.0).abs() < 1e-9);
    }

    #[test]
    fn tempo_change_keeps_position() {
        let mut t = Transport::new(48000.0, 120.0);
        t.play();
        t.advance(12000);
        assert!(t.set_tempo(240.0));
        assert!((t.elapsed_beats() - 0.5).abs() < 1e-12);
        t.advance(12000);
        assert!((t.elapsed_beats() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn invalid_tempo_is_ignored() {
        let mut t = Transport::new(48000.0, 120.0);
        assert!(!t.set_tempo(0.0));
        assert!(!t.set_tempo(-10.0));
        assert!(!t.set_tempo(f64::NAN));
        assert!(!t.set_tempo(f64::INFINITY));
        assert_eq!(t.bpm(), 120.0);
    }

    #[test]
    fn extreme_tempo_is_clamped() {
        let mut t = Transport::new(48000.0, 1e12);
        assert_eq!(t.bpm(), MAX_BPM);
        assert!(t.set_tempo(120.0));
        assert!(t.set_tempo(1e12));
        assert_eq!(t.bpm(), MAX_BPM);
        t.play();
        t.advance(48000);
        assert!((t.elapsed_beats() - MAX_BPM / 60.0).abs() < 1e-9);
    }

    #[test]
    fn rewind_and_state() {
        let mut t = Transport::default();
        t.play();
        assert_eq!(t.state(), TransportState::Playing);
        t.advance(48000);
        t.stop();
        t.advance(48000);
        assert!((t.elapsed_beats() - 2.0).abs() < 1e-12);
        t.rewind();
        assert_eq!(t.elapsed_beats(), 0.0);
    }
}
