// Error types for soundcue
// Each concern gets its own enum; main.rs wraps them with anyhow context

use std::path::PathBuf;
use thiserror::Error;

/// The audio engine could not produce a playable resource for a file
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported audio format in {path}: {reason}")]
    Unsupported { path: PathBuf, reason: String },

    #[error("no audio track found in {0}")]
    NoTrack(PathBuf),

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("failed to convert {path} to the output format: {reason}")]
    Convert { path: PathBuf, reason: String },
}

impl LoadError {
    /// Path of the file that failed to load
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Open { path, .. }
            | Self::Unsupported { path, .. }
            | Self::Decode { path, .. }
            | Self::Convert { path, .. } => path,
            Self::NoTrack(path) => path,
        }
    }
}

/// Failures while opening the output device
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("no output device available")]
    NoDevice,

    #[error("output device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to enumerate output devices: {0}")]
    Devices(String),

    #[error("failed to get output config: {0}")]
    Config(String),

    #[error("unsupported sample format: {0}")]
    SampleFormat(String),

    #[error("failed to start output stream: {0}")]
    Stream(String),
}

/// Failures while loading or validating settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl SettingsError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_error_reports_path() {
        let err = LoadError::NoTrack(PathBuf::from("/tmp/silence.wav"));
        assert_eq!(err.path(), std::path::Path::new("/tmp/silence.wav"));
        assert!(err.to_string().contains("no audio track"));
    }

    #[test]
    fn open_error_keeps_source() {
        let err = LoadError::Open {
            path: PathBuf::from("missing.wav"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("failed to open missing.wav"));
    }

    #[test]
    fn invalid_setting_display() {
        let err = SettingsError::invalid("cache.capacity", "must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid setting cache.capacity: must be at least 1"
        );
    }
}
