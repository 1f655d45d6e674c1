// Settings loading and validation
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::cache::DEFAULT_CAPACITY;
use crate::error::SettingsError;

/// Sound cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub capacity: usize, // Number of distinct sound files kept loaded
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Command stream settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    pub exit_token: String,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            exit_token: "exit".to_string(),
        }
    }
}

/// Output device settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    pub device: Option<String>, // None = system default output
    pub max_voices: usize,
    pub drain_on_exit: bool,
    pub drain_timeout_ms: u64,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            device: None,
            max_voices: 32,
            drain_on_exit: false,
            drain_timeout_ms: 5000,
        }
    }
}

impl OutputSettings {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }
}

/// Main player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub version: i32, // Settings schema version for future migrations
    pub cache: CacheSettings,
    pub commands: CommandSettings,
    pub output: OutputSettings,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            version: 1,
            cache: CacheSettings::default(),
            commands: CommandSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl PlayerSettings {
    /// Load settings from file, or return defaults if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!(path = %path.display(), "no settings file found, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let settings: PlayerSettings =
            serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        info!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Check values that would otherwise fail later, far from the file
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.cache_capacity()?;

        if self.output.max_voices == 0 {
            return Err(SettingsError::invalid("output.max_voices", "must be at least 1"));
        }

        let token = &self.commands.exit_token;
        if token.is_empty() {
            return Err(SettingsError::invalid("commands.exit_token", "must not be empty"));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(SettingsError::invalid(
                "commands.exit_token",
                format!("{:?} must not contain whitespace", token),
            ));
        }

        Ok(())
    }

    pub fn cache_capacity(&self) -> Result<NonZeroUsize, SettingsError> {
        NonZeroUsize::new(self.cache.capacity)
            .ok_or_else(|| SettingsError::invalid("cache.capacity", "must be at least 1"))
    }
}
