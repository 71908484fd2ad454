//! Engine settings stored as TOML.
//!
//! Every key is optional; missing keys take their defaults.
//!
//! ```toml
//! sample_rate = 48000
//! slice_size = 4
//! meter_hz = 60.0
//! meter_mode = "peak"
//! tempo_bpm = 120.0
//! key_follow = "scale"
//! key_policy = "transpose"
//! switch_policy = "pattern-end"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use squelch_core::{
    DEFAULT_GATE_LENGTH, DEFAULT_POOL, DEFAULT_REPORT_HZ, DEFAULT_ROOT_NOTE, DEFAULT_SAMPLE_RATE,
    DEFAULT_SLICE_SIZE, DEFAULT_TELEMETRY_CAPACITY, DEFAULT_TEMPO_BPM, KeyFollow, KeyPolicy,
    MAX_POOL, MAX_SLICE_SIZE, MIN_POOL, MeterMode, SchedulerConfig, SequencerConfig, SwitchPolicy,
    VoiceConfig,
};

use crate::error::{ConfigError, Result};

/// How the output meter summarizes a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeterSetting {
    /// Largest absolute sample.
    #[default]
    Peak,
    /// Mean absolute sample.
    Average,
}

impl From<MeterSetting> for MeterMode {
    fn from(value: MeterSetting) -> Self {
        match value {
            MeterSetting::Peak => MeterMode::Peak,
            MeterSetting::Average => MeterMode::Average,
        }
    }
}

/// Which host mask the sequencer follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyFollowSetting {
    /// Play every key.
    #[default]
    Off,
    /// Follow the scale mask.
    Scale,
    /// Follow the chord mask, transposed to the chord root.
    Chord,
}

impl From<KeyFollowSetting> for KeyFollow {
    fn from(value: KeyFollowSetting) -> Self {
        match value {
            KeyFollowSetting::Off => KeyFollow::Off,
            KeyFollowSetting::Scale => KeyFollow::Scale,
            KeyFollowSetting::Chord => KeyFollow::Chord,
        }
    }
}

/// What happens to a step whose key the mask forbids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPolicySetting {
    /// Skip the step.
    Mute,
    /// Move to the nearest permitted key.
    #[default]
    Transpose,
    /// Keep the previous note sounding.
    Hold,
}

impl From<KeyPolicySetting> for KeyPolicy {
    fn from(value: KeyPolicySetting) -> Self {
        match value {
            KeyPolicySetting::Mute => KeyPolicy::Mute,
            KeyPolicySetting::Transpose => KeyPolicy::Transpose,
            KeyPolicySetting::Hold => KeyPolicy::Hold,
        }
    }
}

/// When a pattern change takes effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SwitchPolicySetting {
    /// At the next step boundary.
    #[default]
    NextStep,
    /// When the playing pattern wraps.
    PatternEnd,
}

impl From<SwitchPolicySetting> for SwitchPolicy {
    fn from(value: SwitchPolicySetting) -> Self {
        match value {
            SwitchPolicySetting::NextStep => SwitchPolicy::NextStep,
            SwitchPolicySetting::PatternEnd => SwitchPolicy::PatternEnd,
        }
    }
}

/// Runtime settings for a voice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    /// Sample rate in Hz, `8000..=192000`.
    pub sample_rate: u32,
    /// Control slice length in samples, `1..=64`.
    pub slice_size: usize,
    /// Telemetry rate in Hz.
    pub meter_hz: f64,
    /// Output meter summary.
    pub meter_mode: MeterSetting,
    /// Slots per snapshot pool, `2..=16`.
    pub snapshot_pool: usize,
    /// Telemetry channel capacity.
    pub telemetry_capacity: usize,
    /// Tempo used when the host supplies none, `20..=300`.
    pub tempo_bpm: f64,
    /// MIDI pitch of key 0 at octave 0.
    pub root_note: u8,
    /// Fraction of a step a non-sliding note sounds for.
    pub gate_length: f64,
    /// Host mask to follow.
    pub key_follow: KeyFollowSetting,
    /// Handling of forbidden keys.
    pub key_policy: KeyPolicySetting,
    /// Timing of pattern changes.
    pub switch_policy: SwitchPolicySetting,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE as u32,
            slice_size: DEFAULT_SLICE_SIZE,
            meter_hz: DEFAULT_REPORT_HZ,
            meter_mode: MeterSetting::default(),
            snapshot_pool: DEFAULT_POOL,
            telemetry_capacity: DEFAULT_TELEMETRY_CAPACITY,
            tempo_bpm: DEFAULT_TEMPO_BPM,
            root_note: DEFAULT_ROOT_NOTE,
            gate_length: DEFAULT_GATE_LENGTH,
            key_follow: KeyFollowSetting::default(),
            key_policy: KeyPolicySetting::default(),
            switch_policy: SwitchPolicySetting::default(),
        }
    }
}

fn check(ok: bool, field: &'static str, reason: impl FnOnce() -> String) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::invalid_setting(field, reason()))
    }
}

impl EngineSettings {
    /// Load and validate settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let settings = Self::from_toml(&content)?;
        tracing::debug!(
            path = %path.display(),
            sample_rate = settings.sample_rate,
            "loaded settings"
        );
        Ok(settings)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let settings: Self = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save the settings to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        tracing::info!(path = %path.display(), "saved settings");
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every field against its valid range.
    pub fn validate(&self) -> Result<()> {
        check(
            (8000..=192_000).contains(&self.sample_rate),
            "sample_rate",
            || format!("{} outside 8000..=192000", self.sample_rate),
        )?;
        check(
            (1..=MAX_SLICE_SIZE).contains(&self.slice_size),
            "slice_size",
            || format!("{} outside 1..={MAX_SLICE_SIZE}", self.slice_size),
        )?;
        check(
            self.meter_hz.is_finite()
                && self.meter_hz > 0.0
                && self.meter_hz <= f64::from(self.sample_rate),
            "meter_hz",
            || format!("{} must be positive and at most the sample rate", self.meter_hz),
        )?;
        check(
            (MIN_POOL..=MAX_POOL).contains(&self.snapshot_pool),
            "snapshot_pool",
            || format!("{} outside {MIN_POOL}..={MAX_POOL}", self.snapshot_pool),
        )?;
        check(self.telemetry_capacity >= 1, "telemetry_capacity", || {
            "must be at least 1".to_string()
        })?;
        check(
            (20.0..=300.0).contains(&self.tempo_bpm),
            "tempo_bpm",
            || format!("{} outside 20..=300", self.tempo_bpm),
        )?;
        check(self.root_note <= 115, "root_note", || {
            format!("{} outside 0..=115", self.root_note)
        })?;
        check(
            self.gate_length > 0.0 && self.gate_length <= 1.0,
            "gate_length",
            || format!("{} outside (0, 1]", self.gate_length),
        )?;
        Ok(())
    }

    /// Scheduler configuration described by these settings.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            sample_rate: f64::from(self.sample_rate),
            slice_size: self.slice_size,
            meter_hz: self.meter_hz,
            meter_mode: self.meter_mode.into(),
            tempo_bpm: self.tempo_bpm,
            key_follow: self.key_follow.into(),
            sequencer: SequencerConfig {
                root_note: self.root_note,
                gate_length: self.gate_length,
                key_policy: self.key_policy.into(),
                switch_policy: self.switch_policy.into(),
            },
        }
    }

    /// Full voice configuration described by these settings.
    pub fn voice_config(&self) -> VoiceConfig {
        VoiceConfig {
            scheduler: self.scheduler_config(),
            snapshot_pool: self.snapshot_pool,
            telemetry_capacity: self.telemetry_capacity,
        }
    }
}

impl From<&EngineSettings> for SchedulerConfig {
    fn from(settings: &EngineSettings) -> Self {
        settings.scheduler_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = EngineSettings::default();
        settings.validate().unwrap();
        let config = settings.scheduler_config();
        assert_eq!(config, SchedulerConfig::default());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let settings = EngineSettings::from_toml(
            r#"
            slice_size = 16
            key_follow = "chord"
            switch_policy = "pattern-end"
            "#,
        )
        .unwrap();
        assert_eq!(settings.slice_size, 16);
        assert_eq!(settings.key_follow, KeyFollowSetting::Chord);
        assert_eq!(settings.switch_policy, SwitchPolicySetting::PatternEnd);
        assert_eq!(settings.sample_rate, 48000);
        assert_eq!(settings.key_policy, KeyPolicySetting::Transpose);
    }

    #[test]
    fn keys_are_kebab_case() {
        let toml = EngineSettings::default().to_toml().unwrap();
        assert!(toml.contains("switch_policy = \"next-step\""), "got: {toml}");
        assert!(toml.contains("meter_mode = \"peak\""), "got: {toml}");
        assert_eq!(EngineSettings::from_toml(&toml).unwrap(), EngineSettings::default());
    }

    #[test]
    fn out_of_range_rejected() {
        let cases = [
            ("sample_rate = 4000", "sample_rate"),
            ("slice_size = 0", "slice_size"),
            ("slice_size = 65", "slice_size"),
            ("meter_hz = 0.0", "meter_hz"),
            ("snapshot_pool = 1", "snapshot_pool"),
            ("telemetry_capacity = 0", "telemetry_capacity"),
            ("tempo_bpm = 400.0", "tempo_bpm"),
            ("root_note = 120", "root_note"),
            ("gate_length = 0.0", "gate_length"),
        ];
        for (toml, key) in cases {
            match EngineSettings::from_toml(toml) {
                Err(ConfigError::InvalidSetting { field, .. }) => assert_eq!(field, key),
                other => panic!("{toml}: expected InvalidSetting, got {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_key_is_parse_error() {
        assert!(matches!(
            EngineSettings::from_toml("slices = 4"),
            Err(ConfigError::TomlParse(_))
        ));
        assert!(matches!(
            EngineSettings::from_toml("key_policy = \"shift\""),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn voice_config_carries_pool() {
        let settings = EngineSettings {
            snapshot_pool: 5,
            telemetry_capacity: 8,
            key_policy: KeyPolicySetting::Hold,
            ..EngineSettings::default()
        };
        let voice = settings.voice_config();
        assert_eq!(voice.snapshot_pool, 5);
        assert_eq!(voice.telemetry_capacity, 8);
        assert_eq!(voice.scheduler.sequencer.key_policy, KeyPolicy::Hold);
    }
}
