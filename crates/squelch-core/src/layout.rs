//! The voice's parameter table and its cross-parameter dependencies.
//!
//! [`VOICE_PARAMS`] is the single source of truth for ids, defaults,
//! smoothing and conversions. Its order is the persisted order: ids 0..=11
//! form the version-1 state layout, ids 12 and 13 were added in version 2.

use crate::param_info::{Conversion, ParamDescriptor, ParamId, ParamUnit};

/// Oscillator blend, saw (0) to square (1).
pub const WAVEFORM: ParamId = ParamId(0);
/// Master tuning, reference pitch of A4.
pub const TUNING: ParamId = ParamId(1);
/// Filter cutoff.
pub const CUTOFF: ParamId = ParamId(2);
/// Filter resonance.
pub const RESONANCE: ParamId = ParamId(3);
/// Envelope-to-cutoff modulation depth.
pub const ENV_MOD: ParamId = ParamId(4);
/// Filter envelope decay time.
pub const DECAY: ParamId = ParamId(5);
/// Accent intensity.
pub const ACCENT: ParamId = ParamId(6);
/// Output level.
pub const VOLUME: ParamId = ParamId(7);
/// Filter response selector.
pub const FILTER_TYPE: ParamId = ParamId(8);
/// Output meter (read-only).
pub const AUDIO_PEAK: ParamId = ParamId(9);
/// Pitch bend in semitones.
pub const PITCH_BEND: ParamId = ParamId(10);
/// Decay range selector.
pub const DECAY_MODE: ParamId = ParamId(11);
/// Active pattern selector.
pub const PATTERN: ParamId = ParamId(12);
/// Current sequencer step (read-only).
pub const STEP_POSITION: ParamId = ParamId(13);

/// Number of parameters in the current layout.
pub const PARAM_COUNT: usize = 14;

/// Number of parameters in the version-1 persisted layout.
pub const V1_PARAM_COUNT: usize = 12;

/// Filter responses, in selector order.
pub const FILTER_TYPE_LABELS: &[&str] = &[
    "Flat", "LP 6", "LP 12", "LP 18", "LP 24", "HP 6", "HP 12", "HP 18", "HP 24", "BP 12/12",
    "BP 6/18", "BP 18/6", "BP 6/12", "BP 12/6", "BP 6/6", "TB 303",
];

/// Decay range choices.
pub const DECAY_MODE_LABELS: &[&str] = &["Original", "Extended"];

/// Pattern selector choices.
pub const PATTERN_LABELS: &[&str] = &[
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16",
];

/// Decay range in `Original` mode, milliseconds.
pub const DECAY_ORIGINAL: Conversion = Conversion::Exponential {
    min: 200.0,
    max: 2000.0,
};

/// Decay range in `Extended` mode, milliseconds.
pub const DECAY_EXTENDED: Conversion = Conversion::Exponential {
    min: 30.0,
    max: 3000.0,
};

/// Meter curve: -60 dBFS maps to 0, full scale to 1.
pub const PEAK_CURVE: Conversion = Conversion::Exponential {
    min: 0.001,
    max: 1.0,
};

/// Process-wide descriptor table, indexed by [`ParamId`].
pub static VOICE_PARAMS: [ParamDescriptor; PARAM_COUNT] = [
    ParamDescriptor::continuous(
        WAVEFORM,
        "Waveform",
        "Wave",
        "waveform",
        ParamUnit::None,
        0.85,
        Conversion::Linear { min: 0.0, max: 1.0 },
    ),
    ParamDescriptor::continuous(
        TUNING,
        "Tuning",
        "Tune",
        "tuning",
        ParamUnit::Hertz,
        0.5,
        Conversion::Linear {
            min: 400.0,
            max: 480.0,
        },
    ),
    ParamDescriptor::continuous(
        CUTOFF,
        "Cutoff",
        "Cutoff",
        "cutoff",
        ParamUnit::Hertz,
        1.0,
        Conversion::Exponential {
            min: 314.0,
            max: 2394.0,
        },
    ),
    ParamDescriptor::continuous(
        RESONANCE,
        "Resonance",
        "Reso",
        "resonance",
        ParamUnit::Percent,
        0.5,
        Conversion::Linear {
            min: 0.0,
            max: 100.0,
        },
    ),
    ParamDescriptor::continuous(
        ENV_MOD,
        "Env Mod",
        "EnvMod",
        "envmod",
        ParamUnit::Percent,
        0.25,
        Conversion::Linear {
            min: 0.0,
            max: 100.0,
        },
    ),
    ParamDescriptor::continuous(
        DECAY,
        "Decay",
        "Decay",
        "decay",
        ParamUnit::Milliseconds,
        0.1,
        DECAY_ORIGINAL,
    ),
    ParamDescriptor::continuous(
        ACCENT,
        "Accent",
        "Accent",
        "accent",
        ParamUnit::Percent,
        0.5,
        Conversion::Linear {
            min: 0.0,
            max: 100.0,
        },
    ),
    ParamDescriptor::continuous(
        VOLUME,
        "Volume",
        "Volume",
        "volume",
        ParamUnit::Decibels,
        0.8,
        Conversion::Linear {
            min: -60.0,
            max: 0.0,
        },
    ),
    ParamDescriptor::stepped(
        FILTER_TYPE,
        "Filter Type",
        "FiltType",
        "filter_type",
        1.0,
        FILTER_TYPE_LABELS,
    ),
    ParamDescriptor::continuous(
        AUDIO_PEAK,
        "Audio Peak",
        "Peak",
        "audio_peak",
        ParamUnit::None,
        0.0,
        PEAK_CURVE,
    )
    .read_only(),
    ParamDescriptor::continuous(
        PITCH_BEND,
        "Pitch Bend",
        "Bend",
        "pitchbend",
        ParamUnit::Semitones,
        0.5,
        Conversion::Linear {
            min: -12.0,
            max: 12.0,
        },
    ),
    ParamDescriptor::stepped(
        DECAY_MODE,
        "Decay Mode",
        "DcyMode",
        "decay_mode",
        0.0,
        DECAY_MODE_LABELS,
    ),
    ParamDescriptor::stepped(PATTERN, "Pattern", "Pattern", "pattern", 0.0, PATTERN_LABELS),
    ParamDescriptor::stepped(STEP_POSITION, "Step", "Step", "step", 0.0, PATTERN_LABELS)
        .read_only(),
];

/// A parameter whose conversion is selected by another parameter's step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dependency {
    /// Stepped parameter that selects.
    pub source: ParamId,
    /// Parameter whose conversion changes.
    pub target: ParamId,
    /// Conversion per source step. Steps past the end keep the last entry.
    pub conversions: &'static [Conversion],
}

impl Dependency {
    /// Conversion the target uses while the source sits on `step`.
    pub fn conversion_for(&self, step: usize) -> Option<Conversion> {
        self.conversions
            .get(step)
            .or_else(|| self.conversions.last())
            .copied()
    }
}

/// Cross-parameter dependencies of the voice.
pub static VOICE_DEPENDENCIES: [Dependency; 1] = [Dependency {
    source: DECAY_MODE,
    target: DECAY,
    conversions: &[DECAY_ORIGINAL, DECAY_EXTENDED],
}];

/// Look up a descriptor by its string id.
pub fn find_param(string_id: &str) -> Option<&'static ParamDescriptor> {
    VOICE_PARAMS.iter().find(|d| d.string_id == string_id)
}

/// Default normalized value of every parameter, in id order.
pub fn default_values() -> [f64; PARAM_COUNT] {
    let mut values = [0.0; PARAM_COUNT];
    for (value, desc) in values.iter_mut().zip(VOICE_PARAMS.iter()) {
        *value = desc.default;
    }
    values
}
