// soundcue - line-driven sound effect player
// Module declarations
pub mod audio;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod error;
pub mod settings;

pub use audio::{AudioEngine, SoundPlayer, SystemAudioEngine};
pub use cache::{CacheKey, SoundCache};
pub use error::{LoadError, OutputError, SettingsError};
