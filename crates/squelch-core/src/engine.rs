//! The synthesis engine seen from the control plane.

use crate::param_info::ParamId;

/// A monophonic synthesis engine driven by the block scheduler.
///
/// All methods are called from the audio thread and must not block or
/// allocate. Parameter values arrive in physical units, already converted
/// through the parameter's active [`Conversion`](crate::Conversion).
pub trait SynthEngine {
    /// Apply a parameter change in physical units.
    fn set_parameter(&mut self, id: ParamId, value: f64);

    /// Produce the next output sample.
    fn render_sample(&mut self) -> f32;

    /// Start (or, while another note is held, glide to) a note.
    fn note_on(&mut self, pitch: u8, velocity: u8);

    /// Release a note. Releasing a pitch that is not sounding is a no-op.
    fn note_off(&mut self, pitch: u8);

    /// Release everything immediately.
    fn all_notes_off(&mut self);
}

impl<E: SynthEngine + ?Sized> SynthEngine for &mut E {
    fn set_parameter(&mut self, id: ParamId, value: f64) {
        (**self).set_parameter(id, value);
    }

    fn render_sample(&mut self) -> f32 {
        (**self).render_sample()
    }

    fn note_on(&mut self, pitch: u8, velocity: u8) {
        (**self).note_on(pitch, velocity);
    }

    fn note_off(&mut self, pitch: u8) {
        (**self).note_off(pitch);
    }

    fn all_notes_off(&mut self) {
        (**self).all_notes_off();
    }
}

/// An engine that renders silence and ignores everything.
///
/// Useful for driving the scheduler and sequencer without audio, e.g. when
/// only the event stream or telemetry matters.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentEngine;

impl SynthEngine for SilentEngine {
    fn set_parameter(&mut self, _id: ParamId, _value: f64) {}

    fn render_sample(&mut self) -> f32 {
        0.0
    }

    fn note_on(&mut self, _pitch: u8, _velocity: u8) {}

    fn note_off(&mut self, _pitch: u8) {}

    fn all_notes_off(&mut self) {}
}
