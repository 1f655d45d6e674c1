// Audio playback module
// Uses Symphonia for decoding and cpal for output

pub mod convert;
pub mod decoder;
pub mod engine;
pub mod mixer;
pub mod output;
pub mod player;
pub mod resource;

pub use engine::{AudioEngine, SystemAudioEngine};
pub use player::SoundPlayer;
pub use resource::SoundResource;
