//! Integration tests for squelch-synth.
//!
//! Runs the voice under the real control plane: patterns sequenced by the
//! scheduler, parameters pushed in physical units, edits committed from a
//! control handle.

use squelch_core::{
    HostContext, Pattern, PatternBank, RealtimeVoice, Step, VoiceConfig, layout, voice_channel,
    voice_channel_with,
};
use squelch_synth::AcidVoice;

const SAMPLE_RATE: f32 = 48000.0;
const BLOCK: usize = 256;
/// One sixteenth at 120 BPM.
const STEP_SAMPLES: usize = 6000;

fn bank_of(steps: &[Step]) -> PatternBank {
    let mut bank = PatternBank::new();
    *bank.active_mut() = Pattern::from_steps(steps, 0.25);
    bank
}

fn start(steps: &[Step]) -> (RealtimeVoice, AcidVoice) {
    let (_control, mut realtime) =
        voice_channel_with(&VoiceConfig::default(), &[], bank_of(steps));
    let mut voice = AcidVoice::new(SAMPLE_RATE);
    realtime.sync(&mut voice);
    (realtime, voice)
}

/// Render `total` samples while playing at 120 BPM.
fn play(realtime: &mut RealtimeVoice, voice: &mut AcidVoice, total: usize) -> Vec<f32> {
    let host = HostContext::playing(120.0);
    let mut rendered = Vec::with_capacity(total);
    let mut out = [0.0f32; BLOCK];
    while rendered.len() < total {
        let n = BLOCK.min(total - rendered.len());
        realtime.process(&mut out[..n], &[], &host, voice);
        rendered.extend_from_slice(&out[..n]);
    }
    rendered
}

fn energy(samples: &[f32]) -> f32 {
    samples.iter().map(|s| s * s).sum()
}

// ============================================================================
// 1. Sequenced output
// ============================================================================

/// A running pattern produces bounded, finite audio.
#[test]
fn test_pattern_renders_audio() {
    let (mut realtime, mut voice) = start(&[
        Step::note(0, 0).with_accent(true),
        Step::note(3, 0),
        Step::rest(),
        Step::note(7, 0).with_slide(true),
    ]);
    let audio = play(&mut realtime, &mut voice, 4 * STEP_SAMPLES);

    assert!(audio.iter().all(|s| s.is_finite() && s.abs() < 4.0));
    assert!(energy(&audio[..STEP_SAMPLES]) > 0.0);
}

/// Stopped transport with nothing held renders digital silence.
#[test]
fn test_stopped_voice_is_silent() {
    let (_control, mut realtime) = voice_channel(&VoiceConfig::default());
    let mut voice = AcidVoice::new(SAMPLE_RATE);
    realtime.sync(&mut voice);

    let mut out = [0.0f32; BLOCK];
    let report = realtime.process(&mut out, &[], &HostContext::stopped(), &mut voice);
    assert!(report.silent);
    assert!(out.iter().all(|&s| s == 0.0));
}

// ============================================================================
// 2. Accent and slide
// ============================================================================

/// An accented step is louder than the same step unaccented.
#[test]
fn test_accent_is_louder() {
    let step_energy = |accent: bool| {
        let (mut realtime, mut voice) = start(&[Step::note(0, 0).with_accent(accent)]);
        energy(&play(&mut realtime, &mut voice, STEP_SAMPLES / 2))
    };
    assert!(step_energy(true) > step_energy(false) * 1.2);
}

/// A slide step glides into the next note instead of jumping.
#[test]
fn test_slide_glides_between_steps() {
    let (mut realtime, mut voice) = start(&[Step::note(0, 0).with_slide(true), Step::note(7, 0)]);
    play(&mut realtime, &mut voice, STEP_SAMPLES + 100);

    assert_eq!(voice.held_pitch(), Some(43));
    let pitch = voice.current_pitch();
    assert!(pitch > 36.0 && pitch < 43.0, "pitch {pitch}");
}

/// Without slide the second note lands on pitch at once.
#[test]
fn test_plain_step_jumps() {
    let (mut realtime, mut voice) = start(&[Step::note(0, 0), Step::note(7, 0)]);
    play(&mut realtime, &mut voice, STEP_SAMPLES + 100);

    assert_eq!(voice.held_pitch(), Some(43));
    assert_eq!(voice.current_pitch(), 43.0);
}

// ============================================================================
// 3. Parameter changes
// ============================================================================

/// A committed filter type reaches the voice on the next block.
#[test]
fn test_filter_type_follows_control() {
    let (mut control, mut realtime) = voice_channel(&VoiceConfig::default());
    let mut voice = AcidVoice::new(SAMPLE_RATE);
    realtime.sync(&mut voice);
    assert_eq!(voice.filter_mode(), 15);

    control.set_parameter(layout::FILTER_TYPE, 0.0);
    assert!(control.commit_parameters());
    let mut out = [0.0f32; BLOCK];
    realtime.process(&mut out, &[], &HostContext::stopped(), &mut voice);
    assert_eq!(voice.filter_mode(), 0);
}

/// Lowering the stored volume lowers the rendered level.
#[test]
fn test_volume_from_initial_values() {
    let steps = [Step::note(0, 0)];
    let level = |volume: f64| {
        let mut values = layout::default_values().to_vec();
        values[layout::VOLUME.index()] = volume;
        let (_control, mut realtime) =
            voice_channel_with(&VoiceConfig::default(), &values, bank_of(&steps));
        let mut voice = AcidVoice::new(SAMPLE_RATE);
        realtime.sync(&mut voice);
        energy(&play(&mut realtime, &mut voice, STEP_SAMPLES / 2))
    };
    assert!(level(1.0) > level(0.5) * 100.0);
}
