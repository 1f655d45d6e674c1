// Audio decoder using Symphonia
// Decodes a whole sound file to interleaved f32 PCM

use symphonia::core::audio::{AudioBufferRef, AudioPlanes, Signal};
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::LoadError;

/// Fully decoded sound in its source format
#[derive(Debug, Clone)]
pub struct DecodedSound {
    /// Interleaved samples in [-1, 1]
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedSound {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// Decode every packet of the first audio track in `path`
pub fn decode_file(path: &Path) -> Result<DecodedSound, LoadError> {
    let mut decoder = AudioDecoder::open(path)?;
    let mut samples = Vec::new();

    while let Some(chunk) = decoder.decode_next()? {
        samples.extend_from_slice(&chunk);
    }

    let sound = DecodedSound {
        samples,
        channels: decoder.channels(),
        sample_rate: decoder.sample_rate(),
    };
    reject_undecodable(path, sound, decoder.skipped_packets())
}

/// A stream whose every packet failed to decode holds no audio
fn reject_undecodable(
    path: &Path,
    sound: DecodedSound,
    skipped: usize,
) -> Result<DecodedSound, LoadError> {
    if sound.samples.is_empty() && skipped > 0 {
        return Err(LoadError::Decode {
            path: path.to_path_buf(),
            reason: format!("all {} packets failed to decode", skipped),
        });
    }
    Ok(sound)
}

pub struct AudioDecoder {
    path: PathBuf,
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    skipped: usize,
}

impl AudioDecoder {
    /// Open an audio file and prepare for decoding
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        // Create a hint using the file extension
        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
            .map_err(|e| LoadError::Unsupported {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let format = probed.format;

        // Find the first audio track
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| LoadError::NoTrack(path.to_path_buf()))?;

        let track_id = track.id;
        let sample_rate = track.codec_params.sample_rate.unwrap_or(44100);
        let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(2);

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Unsupported {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            skipped: 0,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Packets dropped so far because they could not be decoded
    pub fn skipped_packets(&self) -> usize {
        self.skipped
    }

    /// Decode next packet, returns interleaved f32 samples
    /// Returns None when end of stream is reached
    pub fn decode_next(&mut self) -> Result<Option<Vec<f32>>, LoadError> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Ok(None);
                }
                Err(SymphoniaError::ResetRequired) => {
                    self.decoder.reset();
                    continue;
                }
                Err(e) => return Err(decode_error(&self.path, e)),
            };

            // Skip packets from other tracks
            if packet.track_id() != self.track_id {
                continue;
            }

            match self.decoder.decode(&packet) {
                Ok(decoded) => {
                    // The first decoded buffer is authoritative over codec params
                    let spec = *decoded.spec();
                    self.sample_rate = spec.rate;
                    self.channels = spec.channels.count();
                    return Ok(Some(Self::audio_buf_to_f32(&decoded)));
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    warn!(path = %self.path.display(), error = e, "skipping undecodable packet");
                    self.skipped += 1;
                    continue;
                }
                Err(e) => return Err(decode_error(&self.path, e)),
            }
        }
    }

    /// Convert any AudioBufferRef to interleaved f32 samples
    fn audio_buf_to_f32(buf: &AudioBufferRef) -> Vec<f32> {
        match buf {
            AudioBufferRef::F32(b) => Self::interleave_convert(b.planes(), b.frames(), |s: f32| s),
            AudioBufferRef::F64(b) => {
                Self::interleave_convert(b.planes(), b.frames(), |s: f64| s as f32)
            }
            AudioBufferRef::S8(b) => {
                let scale = 1.0 / 128.0;
                Self::interleave_convert(b.planes(), b.frames(), |s: i8| s as f32 * scale)
            }
            AudioBufferRef::S16(b) => {
                let scale = 1.0 / 32768.0;
                Self::interleave_convert(b.planes(), b.frames(), |s: i16| s as f32 * scale)
            }
            AudioBufferRef::S24(b) => {
                let scale = 1.0 / 8388608.0;
                Self::interleave_convert(b.planes(), b.frames(), |s| s.inner() as f32 * scale)
            }
            AudioBufferRef::S32(b) => {
                let scale = 1.0 / 2147483648.0;
                Self::interleave_convert(b.planes(), b.frames(), |s: i32| s as f32 * scale)
            }
            AudioBufferRef::U8(b) => {
                Self::interleave_convert(b.planes(), b.frames(), |s: u8| (s as f32 - 128.0) / 128.0)
            }
            AudioBufferRef::U16(b) => Self::interleave_convert(b.planes(), b.frames(), |s: u16| {
                (s as f32 - 32768.0) / 32768.0
            }),
            AudioBufferRef::U24(b) => Self::interleave_convert(b.planes(), b.frames(), |s| {
                (s.inner() as f32 - 8388608.0) / 8388608.0
            }),
            AudioBufferRef::U32(b) => Self::interleave_convert(b.planes(), b.frames(), |s: u32| {
                (s as f64 - 2147483648.0) as f32 / 2147483648.0
            }),
        }
    }

    fn interleave_convert<T: Sample + Copy, F: Fn(T) -> f32>(
        planes: AudioPlanes<T>,
        frames: usize,
        convert: F,
    ) -> Vec<f32> {
        let planes = planes.planes();
        if planes.is_empty() || frames == 0 {
            return vec![];
        }

        let mut interleaved = Vec::with_capacity(frames * planes.len());
        for frame in 0..frames {
            for plane in planes {
                interleaved.push(convert(plane[frame]));
            }
        }

        interleaved
    }
}

fn decode_error(path: &Path, e: SymphoniaError) -> LoadError {
    LoadError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a 16-bit PCM WAV file in memory
    fn wav_bytes(channels: u16, sample_rate: u32, samples: &[i16]) -> Vec<u8> {
        let data_len = (samples.len() * 2) as u32;
        let block_align = channels * 2;
        let mut bytes = Vec::with_capacity(44 + data_len as usize);
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&sample_rate.to_le_bytes());
        bytes.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
        bytes.extend_from_slice(&block_align.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        for sample in samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn decodes_pcm_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("beep.wav");
        let samples: Vec<i16> = (0..200).map(|i| if i % 2 == 0 { 16384 } else { -16384 }).collect();
        std::fs::write(&path, wav_bytes(2, 8000, &samples)).unwrap();

        let sound = decode_file(&path).unwrap();

        assert_eq!(sound.channels, 2);
        assert_eq!(sound.sample_rate, 8000);
        assert_eq!(sound.frames(), 100);
        assert!((sound.samples[0] - 0.5).abs() < 1e-4);
        assert!((sound.samples[1] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn missing_file_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = decode_file(&dir.path().join("nope.wav")).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn garbage_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("noise.wav");
        std::fs::write(&path, b"this is not audio at all").unwrap();

        let err = decode_file(&path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Unsupported { .. } | LoadError::Decode { .. } | LoadError::NoTrack(_)
        ));
        assert_eq!(err.path(), path.as_path());
    }

    fn sound(samples: Vec<f32>) -> DecodedSound {
        DecodedSound {
            samples,
            channels: 1,
            sample_rate: 8000,
        }
    }

    #[test]
    fn stream_of_only_bad_packets_is_a_decode_error() {
        let path = Path::new("/sounds/broken.mp3");
        let err = reject_undecodable(path, sound(Vec::new()), 3).unwrap_err();

        assert!(matches!(err, LoadError::Decode { .. }));
        assert_eq!(err.path(), path);
    }

    #[test]
    fn partly_damaged_stream_keeps_what_decoded() {
        let path = Path::new("/sounds/scratched.mp3");
        let kept = reject_undecodable(path, sound(vec![0.1; 16]), 2).unwrap();
        assert_eq!(kept.frames(), 16);

        let empty = reject_undecodable(path, sound(Vec::new()), 0).unwrap();
        assert_eq!(empty.frames(), 0);
    }
}
