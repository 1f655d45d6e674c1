// Loaded sound resources
// A resource is shared by every playback of the same file, volume included

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Volume actually applied for a requested value
///
/// Anything outside [0, 1], NaN included, plays at full volume.
pub fn effective_volume(requested: f32) -> f32 {
    if (0.0..=1.0).contains(&requested) {
        requested
    } else {
        1.0
    }
}

/// Decoded sound ready for the mixer, already in the output format
///
/// The volume belongs to the resource, not to a playback: changing it
/// changes every playback of this resource that is still sounding.
#[derive(Debug)]
pub struct SoundResource {
    path: PathBuf,
    samples: Vec<f32>,
    channels: u16,
    sample_rate: u32,
    volume: Mutex<f32>,
}

impl SoundResource {
    pub fn new(path: impl Into<PathBuf>, samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            path: path.into(),
            samples,
            channels,
            sample_rate,
            volume: Mutex::new(1.0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Interleaved samples at the output channel count and rate
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels as usize
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / self.sample_rate as f64)
    }

    /// Set the volume for this sound and all of its playbacks
    pub fn set_volume(&self, volume: f32) {
        *self.volume.lock() = effective_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_in_range_is_kept() {
        assert_eq!(effective_volume(0.0), 0.0);
        assert_eq!(effective_volume(0.35), 0.35);
        assert_eq!(effective_volume(1.0), 1.0);
    }

    #[test]
    fn volume_out_of_range_plays_full() {
        assert_eq!(effective_volume(-0.1), 1.0);
        assert_eq!(effective_volume(1.5), 1.0);
        assert_eq!(effective_volume(f32::NAN), 1.0);
        assert_eq!(effective_volume(f32::INFINITY), 1.0);
    }

    #[test]
    fn resource_reports_length() {
        let sound = SoundResource::new("/sounds/step.wav", vec![0.0; 96000], 2, 48000);
        assert_eq!(sound.frames(), 48000);
        assert_eq!(sound.duration(), Duration::from_secs(1));
        assert_eq!(sound.volume(), 1.0);

        sound.set_volume(7.0);
        assert_eq!(sound.volume(), 1.0);
        sound.set_volume(0.25);
        assert_eq!(sound.volume(), 0.25);
    }
}
