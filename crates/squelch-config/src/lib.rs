//! Persisted state and configuration for squelch.
//!
//! # Features
//!
//! - **Parameter state**: Versioned little-endian parameter files with migration
//! - **Patterns**: Binary pattern and bank records, strictly validated on load
//! - **Notation**: Text form of steps and patterns for editing and display
//! - **Settings**: TOML engine settings with range validation
//! - **Paths**: Platform-specific config, pattern and state directories
//!
//! Every load either yields a complete value or an error; callers keep their
//! previous state on failure.
//!
//! # Example
//!
//! ```rust,no_run
//! use squelch_config::{EngineSettings, ParameterState, load_bank};
//! use squelch_core::{VOICE_PARAMS, voice_channel_with};
//!
//! let settings = EngineSettings::load("settings.toml").unwrap();
//! let values = ParameterState::load("init.sqps").unwrap().migrate(&VOICE_PARAMS).unwrap();
//! let bank = load_bank("acid.sqpb").unwrap();
//!
//! let (control, voice) = voice_channel_with(&settings.voice_config(), &values, bank);
//! ```

mod codec;
mod error;
mod pattern_state;
mod settings;
mod state;

/// Text notation for steps and patterns.
pub mod notation;

/// Factory patterns bundled with the library.
pub mod factory_patterns;

/// Platform-specific paths for settings, banks and states.
#[cfg(feature = "std")]
pub mod paths;

pub use error::{ConfigError, Result, StateError};
pub use factory_patterns::{FACTORY_PATTERN_NAMES, factory_bank, get_factory_pattern};
pub use notation::{format_pattern, format_step, parse_pattern, parse_step};
pub use pattern_state::{
    BANK_MAGIC, BANK_VERSION, PATTERN_MAGIC, PATTERN_RECORD_LEN, PATTERN_VERSION, decode_bank,
    decode_pattern, encode_bank, encode_pattern, load_bank, load_pattern, save_bank, save_pattern,
    write_pattern,
};
#[cfg(feature = "std")]
pub use paths::{
    ensure_user_config_dir, ensure_user_patterns_dir, ensure_user_states_dir, settings_path,
    user_config_dir, user_patterns_dir, user_states_dir,
};
pub use settings::{
    EngineSettings, KeyFollowSetting, KeyPolicySetting, MeterSetting, SwitchPolicySetting,
};
pub use state::{ParameterState, STATE_MAGIC, STATE_VERSION};
