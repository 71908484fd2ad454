//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use clap::Args;
use squelch_config::{EngineSettings, ParameterState, factory_bank, load_bank, settings_path};
use squelch_core::{
    ControlHandle, MAX_PATTERNS, PatternBank, RealtimeVoice, Telemetry, VOICE_PARAMS, layout,
    voice_channel_with,
};
use squelch_synth::AcidVoice;
use std::path::PathBuf;

/// Inputs shared by `render` and `play`.
#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Pattern bank file (defaults to the factory bank)
    #[arg(short, long)]
    pub bank: Option<PathBuf>,

    /// Parameter state file (defaults to the parameter defaults)
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Engine settings file (defaults to the user settings, if present)
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// Pattern to start on, 1-16
    #[arg(short, long)]
    pub pattern: Option<usize>,

    /// Tempo in BPM, overriding the settings
    #[arg(short, long)]
    pub tempo: Option<f64>,
}

/// Everything needed to start a voice.
#[derive(Debug, Clone)]
pub struct Session {
    pub settings: EngineSettings,
    pub values: Vec<f64>,
    pub bank: PatternBank,
}

impl Session {
    /// Resolve files and overrides into a session.
    pub fn load(args: &SessionArgs) -> anyhow::Result<Self> {
        let mut settings = load_settings(args.settings.as_ref())?;
        if let Some(bpm) = args.tempo {
            settings.tempo_bpm = bpm;
            settings.validate().context("invalid --tempo")?;
        }

        let bank = match &args.bank {
            Some(path) => load_bank(path)
                .with_context(|| format!("failed to load bank {}", path.display()))?,
            None => factory_bank(),
        };

        let mut values = match &args.state {
            Some(path) => ParameterState::load(path)
                .with_context(|| format!("failed to load state {}", path.display()))?
                .migrate(&VOICE_PARAMS)
                .with_context(|| format!("state {} does not fit this voice", path.display()))?,
            None => layout::default_values().to_vec(),
        };

        if let Some(number) = args.pattern {
            let index = pattern_index(number)?;
            values[layout::PATTERN.index()] =
                VOICE_PARAMS[layout::PATTERN.index()].to_normalized(index as f64);
        }

        Ok(Self {
            settings,
            values,
            bank,
        })
    }

    /// Tempo the transport runs at.
    pub fn tempo(&self) -> f64 {
        self.settings.tempo_bpm
    }

    /// Both halves of a voice plus the engine they drive.
    pub fn start(&self) -> (ControlHandle, RealtimeVoice, AcidVoice) {
        let (control, mut realtime) =
            voice_channel_with(&self.settings.voice_config(), &self.values, self.bank);
        let mut voice = AcidVoice::new(self.settings.sample_rate as f32);
        realtime.sync(&mut voice);
        tracing::info!(
            sample_rate = self.settings.sample_rate,
            tempo = self.settings.tempo_bpm,
            pattern = control.bank().active_index() + 1,
            "voice ready"
        );
        (control, realtime, voice)
    }
}

/// Settings from `path`, else the user settings file, else defaults.
pub fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<EngineSettings> {
    if let Some(path) = path {
        return EngineSettings::load(path)
            .with_context(|| format!("failed to load settings {}", path.display()));
    }
    let user = settings_path();
    if user.exists() {
        tracing::debug!(path = %user.display(), "using user settings");
        return EngineSettings::load(&user)
            .with_context(|| format!("failed to load settings {}", user.display()));
    }
    Ok(EngineSettings::default())
}

/// Zero-based index for a 1-based pattern number.
pub fn pattern_index(number: usize) -> anyhow::Result<usize> {
    if (1..=MAX_PATTERNS).contains(&number) {
        Ok(number - 1)
    } else {
        anyhow::bail!("pattern must be 1-{MAX_PATTERNS}, got {number}")
    }
}

/// Parse a `key=value` string for clap's `value_parser`.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("Invalid parameter format: '{}' (expected name=value)", s)),
    }
}

/// Running summary of telemetry received on the control side.
#[derive(Debug, Clone, Default)]
pub struct TelemetrySummary {
    /// Latest reported output level, linear.
    pub level: f64,
    /// Highest reported output level, linear.
    pub peak: f64,
    /// Last reported step, zero-based.
    pub step: Option<usize>,
    /// Step reports received.
    pub step_reports: usize,
    /// Notifications received.
    pub notifications: usize,
}

impl TelemetrySummary {
    /// Fold one notification in.
    pub fn record(&mut self, change: Telemetry) {
        self.notifications += 1;
        let Some(desc) = VOICE_PARAMS.get(change.id.index()) else {
            return;
        };
        if change.id == layout::AUDIO_PEAK {
            self.level = desc.to_physical(change.value);
            self.peak = self.peak.max(self.level);
        } else if change.id == layout::STEP_POSITION {
            self.step = Some(desc.conversion.step_index(change.value));
            self.step_reports += 1;
        }
    }

    /// Peak in dBFS.
    pub fn peak_db(&self) -> f64 {
        linear_to_db(self.peak)
    }
}

/// Linear amplitude to dBFS, floored at -120.
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        -120.0
    } else {
        20.0 * linear.log10()
    }
}
