//! Squelch Core - real-time control plane for a monophonic bass-line voice
//!
//! This crate turns parameter edits, pattern data and timestamped note events
//! into sample-accurate control of a synthesis engine, from inside an audio
//! callback that never blocks and never allocates.
//!
//! # Core Abstractions
//!
//! ## Parameters
//!
//! - [`ParamDescriptor`] - Static metadata: range, conversion, smoothing, flags
//! - [`Conversion`] - Linear, exponential and stepped normalized/physical maps
//! - [`SmoothedParam`] - One-pole smoothing advanced once per slice
//! - [`ParameterSet`] - The id-indexed store, with dependency resolution
//! - [`layout`] - The voice's parameter table
//!
//! ## Scheduling
//!
//! - [`BlockScheduler`] - Slices each callback, dispatches events, renders
//! - [`Event`] / [`EventKind`] - Timestamped host events
//! - [`SynthEngine`] - The engine seen from the control plane
//! - [`ThrottledReporter`] - Rate-limited telemetry
//!
//! ## Sequencing
//!
//! - [`Pattern`] / [`PatternBank`] / [`PatternEditor`] - Step data and editing
//! - [`Sequencer`] - Plays the active pattern, with slide and key following
//! - [`Transport`] - Sample-driven musical clock
//!
//! ## Threading (`std` only)
//!
//! - [`snapshot_channel`] - Latest-wins, allocation-free snapshot hand-off
//! - [`voice_channel`] - Builds a [`ControlHandle`] / [`RealtimeVoice`] pair
//!
//! # no_std Support
//!
//! Everything except the threading layer is `no_std` compatible:
//!
//! ```toml
//! [dependencies]
//! squelch-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use squelch_core::{
//!     voice_channel, HostContext, Pattern, SilentEngine, Step, VoiceConfig,
//! };
//!
//! let (mut control, mut voice) = voice_channel(&VoiceConfig::default());
//! *control.bank_mut().active_mut() = Pattern::from_steps(
//!     &[Step::note(0, 0), Step::rest(), Step::note(4, 1).with_accent(true), Step::rest()],
//!     0.25,
//! );
//! control.commit_patterns();
//!
//! let mut out = vec![0.0f32; 512];
//! let report = voice.process(&mut out, &[], &HostContext::playing(120.0), &mut SilentEngine);
//! assert!(report.silent);
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocation, locking or blocking in `process`
//! - **Latest wins**: Stale snapshots are replaced, never queued
//! - **Table driven**: Parameter behaviour lives in static descriptor tables

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod engine;
pub mod event;
pub mod layout;
pub mod param;
pub mod param_info;
pub mod params;
pub mod pattern;
pub mod reporter;
#[cfg(feature = "std")]
pub mod runtime;
pub mod scheduler;
pub mod sequencer;
#[cfg(feature = "std")]
pub mod snapshot;
pub mod transport;

// Re-export main types at crate root
pub use engine::{SilentEngine, SynthEngine};
pub use event::{Event, EventKind, KeyMask};
pub use layout::{Dependency, PARAM_COUNT, V1_PARAM_COUNT, VOICE_DEPENDENCIES, VOICE_PARAMS};
pub use param::SmoothedParam;
pub use param_info::{Conversion, ParamDescriptor, ParamFlags, ParamId, ParamUnit};
pub use params::{ParamValues, ParameterSet};
pub use pattern::{
    DEFAULT_STEP_LENGTH, MAX_OCTAVE, MAX_PATTERNS, MAX_STEPS, MIN_OCTAVE, MIN_STEP_LENGTH,
    Pattern, PatternBank, PatternEditor, Step,
};
pub use reporter::{DEFAULT_REPORT_HZ, NullSink, Telemetry, TelemetrySink, ThrottledReporter};
#[cfg(feature = "std")]
pub use runtime::{
    ControlHandle, DEFAULT_TELEMETRY_CAPACITY, RealtimeVoice, VoiceConfig, voice_channel,
    voice_channel_with,
};
pub use scheduler::{
    BlockReport, BlockScheduler, DEFAULT_SAMPLE_RATE, DEFAULT_SLICE_SIZE, DEFAULT_TEMPO_BPM,
    HostContext, MAX_SLICE_SIZE, MeterMode, SchedulerConfig,
};
pub use sequencer::{
    ACCENT_VELOCITY, DEFAULT_GATE_LENGTH, DEFAULT_ROOT_NOTE, KeyFollow, KeyPolicy, KeyResolution,
    KeyState, MAX_BOUNDARIES_PER_CALL, NORMAL_VELOCITY, Sequencer, SequencerConfig, SwitchPolicy,
};
#[cfg(feature = "std")]
pub use snapshot::{
    Claimed, DEFAULT_POOL, MAX_POOL, MIN_POOL, SnapshotPublisher, SnapshotReceiver,
    snapshot_channel,
};
pub use transport::{MAX_BPM, MIN_BPM, Transport, TransportState};
