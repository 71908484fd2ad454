//! Squelch Synth - reference bass voice for the squelch control plane
//!
//! The control plane in `squelch-core` drives any [`SynthEngine`]. This crate
//! provides the one it ships with: a single-oscillator monophonic voice
//! with a resonant ladder filter, accent and slide.
//!
//! # Building Blocks
//!
//! - [`BlendOscillator`] - PolyBLEP saw/square with a continuous blend
//! - [`LadderFilter`] - four-pole ladder with [`FILTER_MODE_COUNT`] responses
//! - [`DecayEnvelope`] - attack/decay envelope without sustain
//!
//! ```rust
//! use squelch_synth::{DecayEnvelope, LadderFilter};
//!
//! let mut env = DecayEnvelope::new(48000.0);
//! let mut filter = LadderFilter::new(48000.0);
//! filter.set_cutoff(800.0);
//! filter.set_resonance(0.7);
//!
//! env.gate_on();
//! let y = filter.process(env.advance());
//! ```
//!
//! # The Voice
//!
//! [`AcidVoice`] takes physical parameter values from the scheduler:
//!
//! ```rust
//! use squelch_core::{voice_channel, HostContext, VoiceConfig};
//! use squelch_synth::AcidVoice;
//!
//! let (_control, mut realtime) = voice_channel(&VoiceConfig::default());
//! let mut voice = AcidVoice::new(48000.0);
//! realtime.sync(&mut voice);
//!
//! let mut out = [0.0f32; 256];
//! realtime.process(&mut out, &[], &HostContext::stopped(), &mut voice);
//! ```
//!
//! # no_std Support
//!
//! Disable the default `std` feature:
//!
//! ```toml
//! [dependencies]
//! squelch-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod voice;

pub use envelope::{DecayEnvelope, EnvelopeState};
pub use filter::{FILTER_MODE_COUNT, LadderFilter};
pub use oscillator::BlendOscillator;
pub use squelch_core::SynthEngine;
pub use voice::{AcidVoice, SLIDE_MS, midi_to_freq};
