//! Block scheduler: slices each audio callback into short sub-blocks.
//!
//! Within a callback of `N` samples the scheduler walks slices of at most
//! `slice_size` samples. At the start of each slice it dispatches the host
//! events that have come due, plays due sequencer steps, advances parameter
//! smoothing once and renders the slice. Event timing, parameter updates and
//! sequencer steps are therefore accurate to one slice.
//!
//! # Example
//!
//! ```rust
//! use squelch_core::{BlockScheduler, Event, HostContext, NullSink, SchedulerConfig, SilentEngine};
//!
//! let mut scheduler = BlockScheduler::new(SchedulerConfig::default());
//! let mut out = [0.0f32; 256];
//! let events = [Event::note_on(17, 48, 100)];
//! let report = scheduler.process(
//!     &mut out,
//!     &events,
//!     &HostContext::stopped(),
//!     &mut SilentEngine,
//!     &mut NullSink,
//! );
//! assert_eq!(report.dispatched, 1);
//! assert!(report.silent);
//! ```

use crate::engine::SynthEngine;
use crate::event::{Event, EventKind};
use crate::layout::{AUDIO_PEAK, PATTERN, PEAK_CURVE, STEP_POSITION, VOICE_PARAMS};
use crate::params::{ParamValues, ParameterSet};
use crate::pattern::{MAX_PATTERNS, PatternBank};
use crate::reporter::{DEFAULT_REPORT_HZ, TelemetrySink, ThrottledReporter};
use crate::sequencer::{KeyFollow, KeyState, Sequencer, SequencerConfig};
use crate::transport::{MAX_BPM, Transport};

/// Default slice length in samples.
pub const DEFAULT_SLICE_SIZE: usize = 4;

/// Largest accepted slice length.
pub const MAX_SLICE_SIZE: usize = 64;

/// Default sample rate.
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Default tempo.
pub const DEFAULT_TEMPO_BPM: f64 = 120.0;

/// How the output meter summarizes a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeterMode {
    /// Largest absolute sample.
    #[default]
    Peak,
    /// Mean absolute sample.
    Average,
}

/// Everything a [`BlockScheduler`] needs to know up front.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulerConfig {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Slice length in samples, `1..=64`.
    pub slice_size: usize,
    /// Telemetry rate in Hz.
    pub meter_hz: f64,
    /// Meter summary.
    pub meter_mode: MeterMode,
    /// Initial tempo.
    pub tempo_bpm: f64,
    /// Which mask the sequencer follows.
    pub key_follow: KeyFollow,
    /// Sequencer settings.
    pub sequencer: SequencerConfig,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            slice_size: DEFAULT_SLICE_SIZE,
            meter_hz: DEFAULT_REPORT_HZ,
            meter_mode: MeterMode::default(),
            tempo_bpm: DEFAULT_TEMPO_BPM,
            key_follow: KeyFollow::default(),
            sequencer: SequencerConfig::default(),
        }
    }
}

/// Host state accompanying one callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HostContext {
    /// Host tempo, if the host supplies one.
    pub tempo_bpm: Option<f64>,
    /// Whether the host transport is running.
    pub playing: bool,
}

impl HostContext {
    /// Transport running at `bpm`.
    pub const fn playing(bpm: f64) -> Self {
        Self {
            tempo_bpm: Some(bpm),
            playing: true,
        }
    }

    /// Transport stopped, no tempo information.
    pub const fn stopped() -> Self {
        Self {
            tempo_bpm: None,
            playing: false,
        }
    }
}

/// Summary of one processed callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BlockReport {
    /// The block rendered exact digital silence.
    pub silent: bool,
    /// Linear meter level.
    pub level: f32,
    /// Host events dispatched.
    pub dispatched: usize,
}

/// Drives parameters, sequencer and engine for one voice.
#[derive(Debug, Clone)]
pub struct BlockScheduler {
    params: ParameterSet,
    transport: Transport,
    sequencer: Sequencer,
    keys: KeyState,
    bank: PatternBank,
    peak: ThrottledReporter,
    step: ThrottledReporter,
    slice_size: usize,
    meter_mode: MeterMode,
    was_playing: bool,
    pattern_step: usize,
}

impl BlockScheduler {
    /// Build a scheduler. All allocation happens here.
    pub fn new(config: SchedulerConfig) -> Self {
        let params = ParameterSet::voice();
        let pattern_step = Self::selector_step(&params);
        let mut bank = PatternBank::new();
        bank.select(pattern_step);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            sample_rate = config.sample_rate,
            slice_size = config.slice_size,
            "block scheduler created"
        );

        Self {
            params,
            transport: Transport::new(config.sample_rate, config.tempo_bpm),
            sequencer: Sequencer::new(config.sequencer),
            keys: KeyState::new(config.key_follow),
            bank,
            peak: ThrottledReporter::new(AUDIO_PEAK, config.sample_rate, config.meter_hz),
            step: ThrottledReporter::new(STEP_POSITION, config.sample_rate, config.meter_hz),
            slice_size: config.slice_size.clamp(1, MAX_SLICE_SIZE),
            meter_mode: config.meter_mode,
            was_playing: false,
            pattern_step,
        }
    }

    /// Slice length in samples.
    pub fn slice_size(&self) -> usize {
        self.slice_size
    }

    /// Live parameters.
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Live parameters, mutably.
    pub fn params_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    /// Live pattern bank.
    pub fn bank(&self) -> &PatternBank {
        &self.bank
    }

    /// Transport.
    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    /// Sequencer.
    pub fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Key-permissibility state.
    pub fn keys(&self) -> &KeyState {
        &self.keys
    }

    /// Apply a parameter snapshot.
    pub fn apply_values(&mut self, values: &ParamValues) {
        self.params.apply_values(values);
    }

    /// Replace the live bank. Takes effect at the next step boundary.
    ///
    /// The active pattern stays the one the pattern parameter selects,
    /// whatever index the incoming bank carries.
    pub fn apply_bank(&mut self, bank: &PatternBank) {
        self.bank = *bank;
        self.pattern_step = Self::selector_step(&self.params);
        self.bank.select(self.pattern_step);
    }

    /// Push every parameter to the engine.
    pub fn sync<E: SynthEngine + ?Sized>(&mut self, engine: &mut E) -> usize {
        self.params.sync_all(engine)
    }

    /// Process one callback.
    ///
    /// `events` must be sorted by offset. Events at or past `out.len()` are
    /// dispatched in the final slice.
    pub fn process<E, S>(
        &mut self,
        out: &mut [f32],
        events: &[Event],
        host: &HostContext,
        engine: &mut E,
        sink: &mut S,
    ) -> BlockReport
    where
        E: SynthEngine + ?Sized,
        S: TelemetrySink + ?Sized,
    {
        let len = out.len();
        if len == 0 {
            return BlockReport::default();
        }

        self.update_transport(host, engine);

        let mut report = BlockReport::default();
        let mut meter = 0.0f32;
        let mut next_event = 0;
        let mut start = 0;
        while start < len {
            let slice = self.slice_size.min(len - start);
            let last = start + slice == len;

            while let Some(event) = events.get(next_event) {
                if event.offset > start && !last {
                    break;
                }
                self.dispatch_event(event, engine);
                next_event += 1;
                report.dispatched += 1;
            }

            if self.transport.is_playing() {
                self.sequencer
                    .dispatch_due(&self.transport, &self.bank, &self.keys, engine);
            }

            self.params.advance_all(slice, engine);
            self.follow_pattern_selector();

            for sample in &mut out[start..start + slice] {
                *sample = engine.render_sample();
                let magnitude = libm::fabsf(*sample);
                meter = match self.meter_mode {
                    MeterMode::Peak => meter.max(magnitude),
                    MeterMode::Average => meter + magnitude,
                };
            }

            self.transport.advance(slice);
            start += slice;
        }

        if self.meter_mode == MeterMode::Average {
            meter /= len as f32;
        }
        report.level = meter;
        report.silent = meter == 0.0;
        let normalized = PEAK_CURVE.to_normalized(f64::from(meter));
        self.params.set_immediate(AUDIO_PEAK, normalized);
        if let Some(change) = self.peak.report(normalized, len) {
            sink.notify(change);
        }

        let step = VOICE_PARAMS[STEP_POSITION.index()]
            .to_normalized(self.sequencer.current_step() as f64);
        self.params.set_immediate(STEP_POSITION, step);
        if let Some(change) = self.step.report(step, len) {
            sink.notify(change);
        }

        report
    }

    fn update_transport<E: SynthEngine + ?Sized>(&mut self, host: &HostContext, engine: &mut E) {
        if let Some(bpm) = host.tempo_bpm
            && bpm.is_finite()
            && bpm > 0.0
        {
            self.transport.set_tempo(bpm.min(MAX_BPM));
        }
        match (self.was_playing, host.playing) {
            (true, false) => {
                engine.all_notes_off();
                self.sequencer.clear_held();
                self.transport.stop();
            }
            (false, true) => {
                self.transport.rewind();
                self.sequencer.restart();
                self.transport.play();
            }
            _ => {}
        }
        self.was_playing = host.playing;
    }

    fn dispatch_event<E: SynthEngine + ?Sized>(&mut self, event: &Event, engine: &mut E) {
        match event.kind {
            EventKind::NoteOn { pitch, velocity } => engine.note_on(pitch, velocity),
            EventKind::NoteOff { pitch } => engine.note_off(pitch),
            EventKind::ScaleMask { mask } => self.keys.set_scale(mask),
            EventKind::ChordMask { root, mask } => self.keys.set_chord(root, mask),
            EventKind::AllNotesOff => {
                engine.all_notes_off();
                self.sequencer.clear_held();
            }
        }
    }

    /// Select the bank pattern named by the pattern parameter when it moves.
    fn follow_pattern_selector(&mut self) {
        let step = Self::selector_step(&self.params);
        if step != self.pattern_step {
            self.pattern_step = step;
            self.bank.select(step);
        }
    }

    fn selector_step(params: &ParameterSet) -> usize {
        let conversion = params
            .conversion(PATTERN)
            .unwrap_or(VOICE_PARAMS[PATTERN.index()].conversion);
        let normalized = params.get(PATTERN).unwrap_or(0.0);
        conversion.step_index(normalized).min(MAX_PATTERNS - 1)
    }
}

impl Default for BlockScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SilentEngine;
    use crate::event::KeyMask;
    use crate::layout;
    use crate::param_info::ParamId;
    use crate::pattern::{Pattern, Step};
    use crate::reporter::{NullSink, Telemetry};

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Call {
        On(u8, u8),
        Off(u8),
        AllOff,
    }

    /// Records note calls with the sample index they arrived at.
    #[derive(Default)]
    struct Recorder {
        sample: usize,
        calls: Vec<(usize, Call)>,
        params: usize,
        output: f32,
    }

    impl SynthEngine for Recorder {
        fn set_parameter(&mut self, _id: ParamId, _value: f64) {
            self.params += 1;
        }
        fn render_sample(&mut self) -> f32 {
            self.sample += 1;
            self.output
        }
        fn note_on(&mut self, pitch: u8, velocity: u8) {
            self.calls.push((self.sample, Call::On(pitch, velocity)));
        }
        fn note_off(&mut self, pitch: u8) {
            self.calls.push((self.sample, Call::Off(pitch)));
        }
        fn all_notes_off(&mut self) {
            self.calls.push((self.sample, Call::AllOff));
        }
    }

    #[derive(Default)]
    struct Collect(Vec<Telemetry>);

    impl TelemetrySink for Collect {
        fn notify(&mut self, change: Telemetry) {
            self.0.push(change);
        }
    }

    #[test]
    fn empty_block_is_noop() {
        let mut s = BlockScheduler::default();
        let mut engine = Recorder::default();
        let report = s.process(
            &mut [],
            &[Event::note_on(0, 60, 100)],
            &HostContext::playing(120.0),
            &mut engine,
            &mut NullSink,
        );
        assert_eq!(report, BlockReport::default());
        assert!(engine.calls.is_empty());
        assert!(!s.transport().is_playing());
    }

    #[test]
    fn events_land_on_slice_starts() {
        let mut s = BlockScheduler::default();
        let mut engine = Recorder::default();
        let mut out = [0.0; 16];
        let events = [
            Event::note_on(0, 60, 100),
            Event::note_off(5, 60),
            Event::note_on(8, 62, 90),
        ];
        let report =
            s.process(&mut out, &events, &HostContext::stopped(), &mut engine, &mut NullSink);
        assert_eq!(report.dispatched, 3);
        assert_eq!(
            engine.calls,
            vec![(0, Call::On(60, 100)), (8, Call::Off(60)), (8, Call::On(62, 90))]
        );
    }

    #[test]
    fn late_events_go_in_last_slice() {
        let mut s = BlockScheduler::default();
        let mut engine = Recorder::default();
        let mut out = [0.0; 10];
        let events = [Event::note_on(9, 60, 100), Event::note_off(400, 60)];
        let report =
            s.process(&mut out, &events, &HostContext::stopped(), &mut engine, &mut NullSink);
        assert_eq!(report.dispatched, 2);
        assert_eq!(engine.calls, vec![(8, Call::On(60, 100)), (8, Call::Off(60))]);
    }

    #[test]
    fn mask_events_update_key_state() {
        let mut s = BlockScheduler::new(SchedulerConfig {
            key_follow: KeyFollow::Chord,
            ..SchedulerConfig::default()
        });
        let mut out = [0.0; 8];
        let events = [
            Event::scale_mask(0, KeyMask::MAJOR),
            Event::chord_mask(4, 7, KeyMask::from_keys(&[0, 4, 7])),
        ];
        s.process(&mut out, &events, &HostContext::stopped(), &mut SilentEngine, &mut NullSink);
        assert!(s.keys().mask().contains(7));
        assert!(s.keys().mask().contains(11));
        assert!(!s.keys().mask().contains(0));
    }

    #[test]
    fn silence_is_flagged_and_not_metered() {
        let mut s = BlockScheduler::default();
        let mut sink = Collect::default();
        let mut out = [1.0; 64];
        let mut quiet = Recorder::default();
        let report = s.process(&mut out, &[], &HostContext::stopped(), &mut quiet, &mut sink);
        assert!(report.silent);
        assert_eq!(report.level, 0.0);
        assert!(out.iter().all(|&x| x == 0.0));
        assert!(sink.0.iter().all(|t| t.id != layout::AUDIO_PEAK));
    }

    #[test]
    fn meter_falls_to_zero_when_audio_stops() {
        let mut loud = Recorder {
            output: 0.5,
            ..Recorder::default()
        };
        let mut s = BlockScheduler::default();
        let mut sink = Collect::default();
        s.process(&mut [0.0; 64], &[], &HostContext::stopped(), &mut loud, &mut sink);
        assert!(s.params().get(layout::AUDIO_PEAK).unwrap() > 0.0);

        sink.0.clear();
        let mut out = [0.0; 1024];
        let mut quiet = Recorder::default();
        let report = s.process(&mut out, &[], &HostContext::stopped(), &mut quiet, &mut sink);
        assert!(report.silent);
        assert_eq!(s.params().get(layout::AUDIO_PEAK), Some(0.0));
        let peak = sink.0.iter().find(|t| t.id == layout::AUDIO_PEAK).unwrap();
        assert_eq!(peak.value, 0.0);
    }

    #[test]
    fn extreme_host_tempo_is_limited() {
        let mut bank = PatternBank::new();
        *bank.active_mut() = Pattern::from_steps(&[Step::note(0, 0)], 0.25);
        let mut s = BlockScheduler::default();
        s.apply_bank(&bank);
        let mut out = [0.0; 256];
        s.process(&mut out, &[], &HostContext::playing(1e12), &mut SilentEngine, &mut NullSink);
        assert_eq!(s.transport().bpm(), MAX_BPM);
        s.process(&mut out, &[], &HostContext::playing(1e12), &mut SilentEngine, &mut NullSink);
        assert!(s.transport().elapsed_beats() > 0.0);
    }

    #[test]
    fn peak_and_average_meters() {
        let mut engine = Recorder {
            output: -0.5,
            ..Recorder::default()
        };
        let mut s = BlockScheduler::default();
        let mut sink = Collect::default();
        let mut out = [0.0; 64];
        let report = s.process(&mut out, &[], &HostContext::stopped(), &mut engine, &mut sink);
        assert!(!report.silent);
        assert_eq!(report.level, 0.5);
        let peak = sink.0.iter().find(|t| t.id == layout::AUDIO_PEAK).unwrap();
        assert!((peak.value - PEAK_CURVE.to_normalized(0.5)).abs() < 1e-9);

        let mut s = BlockScheduler::new(SchedulerConfig {
            meter_mode: MeterMode::Average,
            ..SchedulerConfig::default()
        });
        let report = s.process(&mut out, &[], &HostContext::stopped(), &mut engine, &mut NullSink);
        assert!((report.level - 0.5).abs() < 1e-6);
    }

    #[test]
    fn stop_edge_silences_engine() {
        let mut s = BlockScheduler::default();
        let mut engine = Recorder::default();
        let mut out = [0.0; 32];
        s.process(&mut out, &[], &HostContext::playing(120.0), &mut engine, &mut NullSink);
        assert!(s.transport().is_playing());
        s.process(&mut out, &[], &HostContext::stopped(), &mut engine, &mut NullSink);
        assert!(!s.transport().is_playing());
        assert_eq!(engine.calls.last(), Some(&(32, Call::AllOff)));
    }

    #[test]
    fn start_edge_rewinds() {
        let mut s = BlockScheduler::default();
        let mut out = [0.0; 480];
        let host = HostContext::playing(120.0);
        s.process(&mut out, &[], &host, &mut SilentEngine, &mut NullSink);
        assert!(s.transport().elapsed_beats() > 0.0);
        s.process(&mut out, &[], &HostContext::stopped(), &mut SilentEngine, &mut NullSink);
        s.process(&mut out[..4], &[], &host, &mut SilentEngine, &mut NullSink);
        assert!((s.transport().elapsed_beats() - 4.0 / 24000.0).abs() < 1e-12);
    }

    #[test]
    fn host_tempo_is_followed() {
        let mut s = BlockScheduler::default();
        let mut out = [0.0; 4];
        s.process(&mut out, &[], &HostContext::playing(140.0), &mut SilentEngine, &mut NullSink);
        assert_eq!(s.transport().bpm(), 140.0);
        let host = HostContext {
            tempo_bpm: Some(f64::NAN),
            playing: true,
        };
        s.process(&mut out, &[], &host, &mut SilentEngine, &mut NullSink);
        assert_eq!(s.transport().bpm(), 140.0);
    }

    #[test]
    fn parameters_advance_once_per_slice() {
        let mut s = BlockScheduler::default();
        s.params_mut().set_target(layout::CUTOFF, 0.0);
        let mut out = [0.0; 8];
        s.process(&mut out, &[], &HostContext::stopped(), &mut SilentEngine, &mut NullSink);
        // Two slices at alpha 0.1 from 1.0: 0.9, then 0.81.
        assert!((s.params().get(layout::CUTOFF).unwrap() - 0.81).abs() < 1e-12);
    }

    #[test]
    fn pattern_parameter_selects_bank_pattern() {
        let mut s = BlockScheduler::default();
        let mut values = ParamValues::from_set(s.params());
        values.set(layout::PATTERN, 3.0 / 15.0);
        s.apply_values(&values);
        s.process(&mut [0.0; 4], &[], &HostContext::stopped(), &mut SilentEngine, &mut NullSink);
        assert_eq!(s.bank().active_index(), 3);
    }

    #[test]
    fn applied_bank_follows_pattern_parameter() {
        let mut s = BlockScheduler::default();
        let mut values = ParamValues::from_set(s.params());
        values.set(layout::PATTERN, 3.0 / 15.0);
        s.apply_values(&values);
        s.process(&mut [0.0; 4], &[], &HostContext::stopped(), &mut SilentEngine, &mut NullSink);

        let mut bank = PatternBank::new();
        bank.select(9);
        s.apply_bank(&bank);
        assert_eq!(s.bank().active_index(), 3);
        s.process(&mut [0.0; 4], &[], &HostContext::stopped(), &mut SilentEngine, &mut NullSink);
        assert_eq!(s.bank().active_index(), 3);
    }

    #[test]
    fn sequencer_runs_only_while_playing() {
        let mut bank = PatternBank::new();
        *bank.active_mut() = Pattern::from_steps(&[Step::note(0, 0)], 0.25);
        let mut s = BlockScheduler::default();
        s.apply_bank(&bank);
        let mut engine = Recorder::default();
        let mut out = [0.0; 64];
        s.process(&mut out, &[], &HostContext::stopped(), &mut engine, &mut NullSink);
        assert!(engine.calls.is_empty());
        s.process(&mut out, &[], &HostContext::playing(120.0), &mut engine, &mut NullSink);
        assert_eq!(engine.calls, vec![(64, Call::On(36, 100))]);
    }

    #[test]
    fn step_position_is_reported() {
        let mut sink = Collect::default();
        let mut bank = PatternBank::new();
        *bank.active_mut() = Pattern::from_steps(&[Step::note(0, 0); 4], 0.25);
        let mut s = BlockScheduler::default();
        s.apply_bank(&bank);
        let mut out = [0.0; 6400];
        s.process(&mut out, &[], &HostContext::playing(120.0), &mut SilentEngine, &mut sink);
        assert_eq!(s.sequencer().current_step(), 1);
        let step = sink.0.iter().rev().find(|t| t.id == layout::STEP_POSITION).unwrap();
        assert!((step.value - 1.0 / 15.0).abs() < 1e-12);
    }
}
