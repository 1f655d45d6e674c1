// Audio engine capability consumed by the sound player
// SystemAudioEngine is the real implementation: symphonia decode, rubato conversion, cpal output

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::convert;
use super::decoder;
use super::mixer::Voice;
use super::output::AudioOutput;
use super::resource::SoundResource;
use crate::error::{LoadError, OutputError};
use crate::settings::OutputSettings;

/// Load and play primitives the player is built on
///
/// A resource is an engine-owned handle. Its volume is a property of the
/// handle, so `set_volume_and_play` on a resource that is still sounding
/// changes the volume of that earlier playback as well.
pub trait AudioEngine {
    type Resource: Clone;

    /// Decode `path` into a playable resource
    fn load(&self, path: &Path) -> Result<Self::Resource, LoadError>;

    /// Set the resource volume and start a new playback of it
    ///
    /// Volumes outside [0, 1] play at full volume. Never blocks on playback.
    fn set_volume_and_play(&self, resource: &Self::Resource, volume: f32);

    /// Wait for playbacks to finish, up to `timeout`
    /// Returns true if nothing is left playing
    fn drain(&self, _timeout: Duration) -> bool {
        true
    }
}

/// Engine playing through a cpal output device
pub struct SystemAudioEngine {
    output: AudioOutput,
}

impl SystemAudioEngine {
    pub fn open(settings: &OutputSettings) -> Result<Self, OutputError> {
        let output = AudioOutput::open(settings.device.as_deref(), settings.max_voices)?;
        Ok(Self { output })
    }
}

impl AudioEngine for SystemAudioEngine {
    type Resource = Arc<SoundResource>;

    fn load(&self, path: &Path) -> Result<Self::Resource, LoadError> {
        let started = Instant::now();
        let decoded = decoder::decode_file(path)?;

        let channels = self.output.channels();
        let sample_rate = self.output.sample_rate();
        let samples = convert::to_output_format(&decoded, channels as usize, sample_rate)
            .map_err(|reason| LoadError::Convert {
                path: path.to_path_buf(),
                reason,
            })?;

        let resource = SoundResource::new(path, samples, channels, sample_rate);
        debug!(
            path = %path.display(),
            source_rate = decoded.sample_rate,
            source_channels = decoded.channels,
            duration_ms = resource.duration().as_millis() as u64,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "loaded sound"
        );

        Ok(Arc::new(resource))
    }

    fn set_volume_and_play(&self, resource: &Self::Resource, volume: f32) {
        resource.set_volume(volume);
        if !self.output.play(Voice::new(Arc::clone(resource))) {
            warn!(path = %resource.path().display(), "too many sounds queued, dropping playback");
        }
    }

    fn drain(&self, timeout: Duration) -> bool {
        self.output.wait_idle(timeout)
    }
}
