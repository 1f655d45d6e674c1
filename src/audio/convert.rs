// Conversion of decoded sounds to the output device format
// Channel remapping plus sample rate conversion with rubato

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

use super::decoder::DecodedSound;

/// Frames fed to the resampler per call
const CHUNK_FRAMES: usize = 1024;

/// Convert a decoded sound to interleaved samples at `channels` x `sample_rate`
pub fn to_output_format(
    sound: &DecodedSound,
    channels: usize,
    sample_rate: u32,
) -> Result<Vec<f32>, String> {
    let remapped = remap_channels(&sound.samples, sound.channels, channels);
    resample(&remapped, channels, sound.sample_rate, sample_rate)
}

/// Remap interleaved samples from one channel count to another
///
/// Mono is copied to every output channel, downmixing to mono averages,
/// anything else keeps the shared channels and silences the rest.
pub fn remap_channels(samples: &[f32], from: usize, to: usize) -> Vec<f32> {
    if from == to || from == 0 || to == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / from;
    let mut remapped = Vec::with_capacity(frames * to);

    for frame in samples.chunks_exact(from) {
        if from == 1 {
            remapped.extend(std::iter::repeat(frame[0]).take(to));
        } else if to == 1 {
            remapped.push(frame.iter().sum::<f32>() / from as f32);
        } else {
            remapped.extend((0..to).map(|ch| frame.get(ch).copied().unwrap_or(0.0)));
        }
    }

    remapped
}

/// Resample interleaved audio, returning exactly ceil(frames * to / from) frames
pub fn resample(
    samples: &[f32],
    channels: usize,
    from_rate: u32,
    to_rate: u32,
) -> Result<Vec<f32>, String> {
    if from_rate == to_rate || samples.is_empty() || channels == 0 {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(format!("invalid sample rates {} -> {}", from_rate, to_rate));
    }

    let params = SincInterpolationParameters {
        sinc_len: 128,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = to_rate as f64 / from_rate as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, CHUNK_FRAMES, channels)
        .map_err(|e| format!("Failed to create resampler: {}", e))?;

    let planar = deinterleave(samples, channels);
    let frames = planar[0].len();
    let expected = (frames as u64 * to_rate as u64).div_ceil(from_rate as u64) as usize;
    let delay = resampler.output_delay();

    let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(expected + delay); channels];
    let mut position = 0;

    while frames - position >= resampler.input_frames_next() {
        let needed = resampler.input_frames_next();
        let chunk: Vec<&[f32]> = planar
            .iter()
            .map(|ch| &ch[position..position + needed])
            .collect();
        let processed = resampler
            .process(&chunk[..], None)
            .map_err(|e| format!("Resampling failed: {}", e))?;
        append_planar(&mut output, processed);
        position += needed;
    }

    if position < frames {
        let chunk: Vec<&[f32]> = planar.iter().map(|ch| &ch[position..]).collect();
        let processed = resampler
            .process_partial(Some(&chunk[..]), None)
            .map_err(|e| format!("Resampling failed: {}", e))?;
        append_planar(&mut output, processed);
    }

    // Flush what is still held back by the filter delay
    while output[0].len() < expected + delay {
        let processed = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| format!("Resampling failed: {}", e))?;
        if processed[0].is_empty() {
            break;
        }
        append_planar(&mut output, processed);
    }

    for channel in &mut output {
        channel.drain(..delay.min(channel.len()));
        channel.resize(expected, 0.0);
    }

    Ok(interleave(&output))
}

fn deinterleave(samples: &[f32], channels: usize) -> Vec<Vec<f32>> {
    let frames = samples.len() / channels;
    let mut planar = vec![Vec::with_capacity(frames); channels];
    for frame in samples.chunks_exact(channels) {
        for (plane, &sample) in planar.iter_mut().zip(frame) {
            plane.push(sample);
        }
    }
    planar
}

fn interleave(planar: &[Vec<f32>]) -> Vec<f32> {
    let frames = planar.first().map(|p| p.len()).unwrap_or(0);
    let mut samples = Vec::with_capacity(frames * planar.len());
    for frame in 0..frames {
        for plane in planar {
            samples.push(plane[frame]);
        }
    }
    samples
}

fn append_planar(output: &mut [Vec<f32>], processed: Vec<Vec<f32>>) {
    for (out, chunk) in output.iter_mut().zip(processed) {
        out.extend_from_slice(&chunk);
    }
}
