// Audio output using cpal
// Hosts the mixer on the device callback and accepts new voices from the player

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use parking_lot::Mutex;
use std::time::Duration;
use tracing::{error, info};

use super::mixer::{Mixer, Voice, VoiceSender};
use crate::error::OutputError;

/// Voices allowed to wait for a mixer slot, per mixer slot
const QUEUE_SLOTS_PER_VOICE: usize = 4;

/// Frames mixed per pass; larger device buffers are filled in several passes
const MIX_CHUNK_FRAMES: usize = 4096;

pub struct AudioOutput {
    _stream: Stream,
    voices: Mutex<VoiceSender>,
    sample_rate: u32,
    channels: u16,
}

impl AudioOutput {
    /// Open the named output device, or the default one when `device` is None
    pub fn open(device: Option<&str>, max_voices: usize) -> Result<Self, OutputError> {
        let host = cpal::default_host();

        let device = match device {
            Some(name) => host
                .output_devices()
                .map_err(|e| OutputError::Devices(e.to_string()))?
                .find(|d| d.name().map(|n| n == name).unwrap_or(false))
                .ok_or_else(|| OutputError::DeviceNotFound(name.to_string()))?,
            None => host.default_output_device().ok_or(OutputError::NoDevice)?,
        };
        let device_name = device.name().unwrap_or_else(|_| "unknown".to_string());

        let config = device
            .default_output_config()
            .map_err(|e| OutputError::Config(e.to_string()))?;

        let sample_rate = config.sample_rate().0;
        let channels = config.channels();

        let (mixer, sender) = Mixer::new(max_voices, max_voices * QUEUE_SLOTS_PER_VOICE);
        let stream_config = config.config();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => Self::build_stream::<f32>(&device, &stream_config, mixer)?,
            cpal::SampleFormat::I16 => Self::build_stream::<i16>(&device, &stream_config, mixer)?,
            cpal::SampleFormat::U16 => Self::build_stream::<u16>(&device, &stream_config, mixer)?,
            cpal::SampleFormat::I32 => Self::build_stream::<i32>(&device, &stream_config, mixer)?,
            format => return Err(OutputError::SampleFormat(format!("{:?}", format))),
        };

        stream
            .play()
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        info!(
            device = %device_name,
            sample_rate,
            channels,
            max_voices,
            "audio output started"
        );

        Ok(Self {
            _stream: stream,
            voices: Mutex::new(sender),
            sample_rate,
            channels,
        })
    }

    fn build_stream<T: cpal::SizedSample + cpal::FromSample<f32>>(
        device: &cpal::Device,
        config: &StreamConfig,
        mut mixer: Mixer,
    ) -> Result<Stream, OutputError> {
        // Allocated once here, never on the audio thread
        let mut scratch = vec![0.0f32; MIX_CHUNK_FRAMES * config.channels.max(1) as usize];

        let stream = device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    for chunk in data.chunks_mut(scratch.len()) {
                        let mixed = &mut scratch[..chunk.len()];
                        mixer.mix(mixed);

                        for (sample, &value) in chunk.iter_mut().zip(mixed.iter()) {
                            *sample = T::from_sample(value);
                        }
                    }
                },
                move |err| {
                    error!(error = %err, "audio output error");
                },
                None,
            )
            .map_err(|e| OutputError::Stream(e.to_string()))?;

        Ok(stream)
    }

    /// Start a new voice; returns false if it had to be dropped
    pub fn play(&self, voice: Voice) -> bool {
        self.voices.lock().send(voice)
    }

    /// Block until every voice has finished or `timeout` passes
    /// Returns true if the output went idle in time
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.voices.lock().wait_idle(timeout)
    }

    /// Get the output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of output channels
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

/// Names of every output device on the default host
pub fn output_device_names() -> Result<Vec<String>, OutputError> {
    let host = cpal::default_host();
    let devices = host
        .output_devices()
        .map_err(|e| OutputError::Devices(e.to_string()))?;

    Ok(devices.filter_map(|d| d.name().ok()).collect())
}
