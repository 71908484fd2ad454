//! Control-thread / audio-thread split for one voice.
//!
//! [`voice_channel`] builds a [`ControlHandle`] for the control thread and a
//! [`RealtimeVoice`] for the audio callback. They share nothing but the
//! snapshot pools and the telemetry channel:
//!
//! ```text
//!  ControlHandle ──ParamValues──▶ ┐
//!                ──PatternBank──▶ ├─ RealtimeVoice::process ─▶ SynthEngine
//!                ◀──Telemetry──── ┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use squelch_core::{layout, voice_channel, HostContext, SilentEngine, VoiceConfig};
//!
//! let (mut control, mut voice) = voice_channel(&VoiceConfig::default());
//! control.set_parameter(layout::CUTOFF, 0.3);
//! assert!(control.commit_parameters());
//!
//! let mut out = [0.0f32; 64];
//! voice.process(&mut out, &[], &HostContext::stopped(), &mut SilentEngine);
//! assert_eq!(voice.scheduler().params().target(layout::CUTOFF), Some(0.3));
//! ```

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::engine::SynthEngine;
use crate::event::Event;
use crate::layout::{PATTERN, VOICE_PARAMS};
use crate::param_info::ParamId;
use crate::params::{ParamValues, ParameterSet};
use crate::pattern::{PatternBank, PatternEditor};
use crate::reporter::Telemetry;
use crate::scheduler::{BlockReport, BlockScheduler, HostContext, SchedulerConfig};
use crate::snapshot::{DEFAULT_POOL, SnapshotPublisher, SnapshotReceiver, snapshot_channel};

/// Default telemetry channel capacity.
pub const DEFAULT_TELEMETRY_CAPACITY: usize = 256;

/// Construction settings for a voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceConfig {
    /// Scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Slots per snapshot pool, `2..=16`.
    pub snapshot_pool: usize,
    /// Telemetry channel capacity.
    pub telemetry_capacity: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            snapshot_pool: DEFAULT_POOL,
            telemetry_capacity: DEFAULT_TELEMETRY_CAPACITY,
        }
    }
}

/// Build both halves with default parameters and an empty bank.
pub fn voice_channel(config: &VoiceConfig) -> (ControlHandle, RealtimeVoice) {
    voice_channel_with(config, &[], PatternBank::new())
}

/// Build both halves starting from `values` and `bank`.
///
/// `values` are normalized, in id order; missing ids keep their defaults.
/// Both sides start settled, so nothing glides in at startup.
pub fn voice_channel_with(
    config: &VoiceConfig,
    values: &[f64],
    bank: PatternBank,
) -> (ControlHandle, RealtimeVoice) {
    let mut bank = bank;
    let mut values = values.to_vec();
    // The pattern selector and the bank's active index must agree.
    match values.get(PATTERN.index()) {
        Some(&selector) => {
            bank.select(VOICE_PARAMS[PATTERN.index()].conversion.step_index(selector));
        }
        None => {
            let given = values.len();
            values.extend(VOICE_PARAMS[given..=PATTERN.index()].iter().map(|d| d.default));
            values[PATTERN.index()] =
                VOICE_PARAMS[PATTERN.index()].to_normalized(bank.active_index() as f64);
        }
    }

    let mut params = ParameterSet::voice();
    let mut scheduler = BlockScheduler::new(config.scheduler);
    for (index, &value) in values.iter().enumerate() {
        let id = ParamId(index as u32);
        if params.descriptor(id).is_some_and(|d| !d.is_read_only()) {
            params.set_immediate(id, value);
            scheduler.params_mut().set_immediate(id, value);
        }
    }
    scheduler.apply_bank(&bank);

    let snapshot = ParamValues::from_set(&params);
    let (param_tx, param_rx) = snapshot_channel(snapshot.clone(), config.snapshot_pool);
    let (bank_tx, bank_rx) = snapshot_channel(bank, config.snapshot_pool);
    let (telemetry_tx, telemetry_rx) = bounded(config.telemetry_capacity.max(1));

    #[cfg(feature = "tracing")]
    tracing::debug!(
        pool = config.snapshot_pool,
        telemetry_capacity = config.telemetry_capacity,
        pattern = bank.active_index() + 1,
        "voice channel created"
    );

    (
        ControlHandle {
            params,
            staged: snapshot,
            editor: PatternEditor::new(bank),
            param_tx,
            bank_tx,
            telemetry_rx,
        },
        RealtimeVoice {
            scheduler,
            param_rx,
            bank_rx,
            telemetry_tx,
        },
    )
}

/// Control-thread half: stages edits and publishes them.
#[derive(Debug)]
pub struct ControlHandle {
    params: ParameterSet,
    staged: ParamValues,
    editor: PatternEditor,
    param_tx: SnapshotPublisher<ParamValues>,
    bank_tx: SnapshotPublisher<PatternBank>,
    telemetry_rx: Receiver<Telemetry>,
}

impl ControlHandle {
    /// Stage a normalized target. Read-only and unknown ids are rejected.
    pub fn set_parameter(&mut self, id: ParamId, normalized: f64) -> bool {
        let accepted = self.params.set_target(id, normalized);
        if accepted && id == PATTERN {
            let index = self.params.conversion(PATTERN).map_or(0, |c| c.step_index(normalized));
            self.editor.bank_mut().select(index);
        }
        accepted
    }

    /// Staged target, or the last reported value for read-only parameters.
    pub fn parameter(&self, id: ParamId) -> Option<f64> {
        self.params.target(id)
    }

    /// Staged parameters.
    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Stage normalized values in id order. Extra values are ignored.
    pub fn load_values(&mut self, values: &[f64]) {
        for (index, &value) in values.iter().enumerate() {
            self.set_parameter(ParamId(index as u32), value);
        }
    }

    /// Stage every parameter's default.
    pub fn reset_to_defaults(&mut self) {
        self.params.reset_to_defaults();
        let index = self.params.conversion(PATTERN).map_or(0, |c| {
            c.step_index(self.params.target(PATTERN).unwrap_or(0.0))
        });
        self.editor.bank_mut().select(index);
    }

    /// Staged targets in id order.
    pub fn values(&self) -> ParamValues {
        ParamValues::from_set(&self.params)
    }

    /// Staged bank.
    pub fn bank(&self) -> &PatternBank {
        self.editor.bank()
    }

    /// Staged bank, mutably.
    pub fn bank_mut(&mut self) -> &mut PatternBank {
        self.editor.bank_mut()
    }

    /// Pattern editor with clipboard.
    pub fn editor_mut(&mut self) -> &mut PatternEditor {
        &mut self.editor
    }

    /// Move the active pattern by `delta`, wrapping, and stage the pattern
    /// parameter to match.
    pub fn switch_active_pattern(&mut self, delta: i32) -> usize {
        let index = self.editor.switch_active_pattern(delta);
        self.stage_pattern_selector(index);
        index
    }

    /// Make pattern `index` active. Returns `false` when out of range.
    pub fn select_pattern(&mut self, index: usize) -> bool {
        if !self.editor.bank_mut().select(index) {
            return false;
        }
        self.stage_pattern_selector(index);
        true
    }

    fn stage_pattern_selector(&mut self, index: usize) {
        let normalized = VOICE_PARAMS[PATTERN.index()].to_normalized(index as f64);
        self.params.set_target(PATTERN, normalized);
    }

    /// Publish the staged parameters.
    pub fn commit_parameters(&mut self) -> bool {
        self.params.capture_targets(&mut self.staged);
        self.param_tx.publish(&self.staged)
    }

    /// Publish the staged bank.
    pub fn commit_patterns(&mut self) -> bool {
        self.bank_tx.publish(self.editor.bank())
    }

    /// Publish both. Returns `true` only if both went out.
    pub fn commit(&mut self) -> bool {
        let params = self.commit_parameters();
        let patterns = self.commit_patterns();
        params && patterns
    }

    /// Drain pending telemetry into `f`, updating read-only values.
    ///
    /// Returns the number of notifications handled.
    pub fn poll_telemetry<F: FnMut(Telemetry)>(&mut self, mut f: F) -> usize {
        let mut count = 0;
        while let Ok(change) = self.telemetry_rx.try_recv() {
            self.params.set_immediate(change.id, change.value);
            f(change);
            count += 1;
        }
        count
    }
}

/// Audio-thread half.
#[derive(Debug)]
pub struct RealtimeVoice {
    scheduler: BlockScheduler,
    param_rx: SnapshotReceiver<ParamValues>,
    bank_rx: SnapshotReceiver<PatternBank>,
    telemetry_tx: Sender<Telemetry>,
}

impl RealtimeVoice {
    /// Claim pending snapshots and process one callback.
    pub fn process<E: SynthEngine + ?Sized>(
        &mut self,
        out: &mut [f32],
        events: &[Event],
        host: &HostContext,
        engine: &mut E,
    ) -> BlockReport {
        if let Some(values) = self.param_rx.try_claim() {
            self.scheduler.apply_values(&values);
        }
        if let Some(bank) = self.bank_rx.try_claim() {
            self.scheduler.apply_bank(&bank);
        }
        self.scheduler
            .process(out, events, host, engine, &mut self.telemetry_tx)
    }

    /// Push every parameter to the engine. Call once before the first block.
    pub fn sync<E: SynthEngine + ?Sized>(&mut self, engine: &mut E) -> usize {
        self.scheduler.sync(engine)
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &BlockScheduler {
        &self.scheduler
    }
}
