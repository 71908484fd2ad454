//! Error types for persisted state and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// A malformed binary state, pattern or bank record.
///
/// Decoding never yields partial results: any of these fails the whole load.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    /// The record does not start with the expected magic number
    #[error("bad magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic {
        /// Magic number of the format being decoded.
        expected: i32,
        /// Magic number found in the data.
        found: i32,
    },

    /// The record was written by a newer format version
    #[error("unsupported version {found} (supported up to {supported})")]
    UnsupportedVersion {
        /// Version found in the data.
        found: i32,
        /// Highest version this build reads.
        supported: i32,
    },

    /// A pattern record declares a step capacity other than 16
    #[error("pattern step capacity must be 16, found {found}")]
    StepCapacity {
        /// Capacity found in the data.
        found: i32,
    },

    /// The data ends before the record does
    #[error("truncated record: needed {needed} bytes, {available} available")]
    Truncated {
        /// Bytes the record requires.
        needed: usize,
        /// Bytes actually present.
        available: usize,
    },

    /// A field holds a value outside its range
    #[error("invalid {field}: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Description of why the value is invalid.
        reason: String,
    },

    /// A parameter value is NaN or infinite
    #[error("parameter value {index} is not finite")]
    NonFinite {
        /// Position of the value in the record.
        index: usize,
    },
}

impl StateError {
    /// Create an invalid field error.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        StateError::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors that can occur while loading or saving configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a file
    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        /// Path of the file that could not be written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to create directory
    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        /// Path of the directory that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to serialize TOML
    #[error("failed to serialize TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// Malformed binary record
    #[error("invalid state data: {0}")]
    State(#[from] StateError),

    /// A setting lies outside its valid range
    #[error("invalid setting '{field}': {reason}")]
    InvalidSetting {
        /// TOML key of the setting.
        field: &'static str,
        /// Description of why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create a write file error.
    pub fn write_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::WriteFile {
            path: path.into(),
            source,
        }
    }

    /// Create a create directory error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid setting error.
    pub fn invalid_setting(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidSetting {
            field,
            reason: reason.into(),
        }
    }
}

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn mock_io_err() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::NotFound, "mock")
    }

    #[test]
    fn read_file_factory_produces_correct_variant() {
        let err = ConfigError::read_file("/some/path", mock_io_err());
        assert!(
            matches!(
                err,
                ConfigError::ReadFile { ref path, .. } if path == std::path::Path::new("/some/path")
            )
        );
    }

    #[test]
    fn create_dir_display() {
        let err = ConfigError::create_dir("/a/b", mock_io_err());
        let msg = err.to_string();
        assert!(msg.contains("failed to create directory"), "got: {msg}");
        assert!(msg.contains("/a/b"), "got: {msg}");
    }

    #[test]
    fn io_variants_expose_source() {
        assert!(ConfigError::read_file("/x", mock_io_err()).source().is_some());
        assert!(ConfigError::write_file("/x", mock_io_err()).source().is_some());
        assert!(ConfigError::create_dir("/x", mock_io_err()).source().is_some());
    }

    #[test]
    fn bad_magic_display_is_hex() {
        let err = StateError::BadMagic {
            expected: 0x5351_5053,
            found: 0,
        };
        assert_eq!(
            err.to_string(),
            "bad magic: expected 0x53515053, found 0x00000000"
        );
    }

    #[test]
    fn state_error_converts() {
        let err: ConfigError = StateError::StepCapacity { found: 32 }.into();
        assert!(matches!(
            err,
            ConfigError::State(StateError::StepCapacity { found: 32 })
        ));
        assert!(err.to_string().contains("must be 16"), "got: {err}");
    }

    #[test]
    fn invalid_helpers() {
        let err = StateError::invalid("octave", "3 outside -2..=2");
        assert_eq!(err.to_string(), "invalid octave: 3 outside -2..=2");

        let err = ConfigError::invalid_setting("slice_size", "0 outside 1..=64");
        assert_eq!(
            err.to_string(),
            "invalid setting 'slice_size': 0 outside 1..=64"
        );
    }
}
