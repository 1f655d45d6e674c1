// End-to-end runs of the command loop over real files, without an output device

use soundcue::audio::convert;
use soundcue::audio::decoder::decode_file;
use soundcue::audio::mixer::{Mixer, Voice, VoiceSender};
use soundcue::audio::SoundResource;
use soundcue::commands::{CommandLoop, LoopOutcome};
use soundcue::{AudioEngine, CacheKey, LoadError, SoundPlayer};
use std::cell::RefCell;
use std::io::Cursor;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const OUTPUT_RATE: u32 = 16000;
const OUTPUT_CHANNELS: u16 = 2;

/// Decodes for real and mixes into a buffer the test can inspect
struct OfflineEngine {
    mixer: RefCell<Mixer>,
    voices: RefCell<VoiceSender>,
    loads: RefCell<Vec<PathBuf>>,
}

impl OfflineEngine {
    fn new() -> Self {
        let (mixer, voices) = Mixer::new(8, 32);
        Self {
            mixer: RefCell::new(mixer),
            voices: RefCell::new(voices),
            loads: RefCell::new(Vec::new()),
        }
    }

    fn render(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * OUTPUT_CHANNELS as usize];
        self.mixer.borrow_mut().mix(&mut out);
        out
    }
}

impl AudioEngine for OfflineEngine {
    type Resource = Arc<SoundResource>;

    fn load(&self, path: &Path) -> Result<Self::Resource, LoadError> {
        let decoded = decode_file(path)?;
        let samples = convert::to_output_format(&decoded, OUTPUT_CHANNELS as usize, OUTPUT_RATE)
            .map_err(|reason| LoadError::Convert {
                path: path.to_path_buf(),
                reason,
            })?;
        self.loads.borrow_mut().push(path.to_path_buf());
        Ok(Arc::new(SoundResource::new(
            path,
            samples,
            OUTPUT_CHANNELS,
            OUTPUT_RATE,
        )))
    }

    fn set_volume_and_play(&self, resource: &Self::Resource, volume: f32) {
        resource.set_volume(volume);
        assert!(self.voices.borrow_mut().send(Voice::new(Arc::clone(resource))));
    }
}

/// Mono 16-bit PCM WAV holding a constant level
fn write_wav(path: &Path, level: i16, frames: usize) {
    let data_len = (frames * 2) as u32;
    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
    bytes.extend_from_slice(b"WAVEfmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM
    bytes.extend_from_slice(&1u16.to_le_bytes()); // mono
    bytes.extend_from_slice(&OUTPUT_RATE.to_le_bytes());
    bytes.extend_from_slice(&(OUTPUT_RATE * 2).to_le_bytes());
    bytes.extend_from_slice(&2u16.to_le_bytes());
    bytes.extend_from_slice(&16u16.to_le_bytes());
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_len.to_le_bytes());
    for _ in 0..frames {
        bytes.extend_from_slice(&level.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

fn sounds(names: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        write_wav(&dir.path().join(name), 16384, 4000);
    }
    dir
}

fn player(capacity: usize) -> SoundPlayer<OfflineEngine> {
    SoundPlayer::with_capacity(OfflineEngine::new(), NonZeroUsize::new(capacity).unwrap())
}

fn is_cached(player: &SoundPlayer<OfflineEngine>, path: &Path) -> bool {
    player.cache().contains(&CacheKey::resolve(path).unwrap())
}

#[test]
fn least_recently_played_file_is_evicted() {
    let dir = sounds(&["a.wav", "b.wav", "c.wav"]);
    let path = |name: &str| dir.path().join(name);
    let input = format!(
        "1 {}\n1 {}\n1 {}\n1 {}\n",
        path("a.wav").display(),
        path("b.wav").display(),
        path("a.wav").display(),
        path("c.wav").display(),
    );

    let mut player = player(2);
    let outcome = CommandLoop::new(&mut player, "exit")
        .run(Cursor::new(input))
        .unwrap();

    assert_eq!(outcome, LoopOutcome::EndOfInput);
    assert!(is_cached(&player, &path("a.wav")));
    assert!(!is_cached(&player, &path("b.wav")));
    assert!(is_cached(&player, &path("c.wav")));
    assert_eq!(player.engine().loads.borrow().len(), 3);
}

#[test]
fn decoded_sound_plays_at_requested_volume() {
    let dir = sounds(&["tone.wav"]);
    let input = format!("0.5 {}\n", dir.path().join("tone.wav").display());

    let mut player = player(4);
    CommandLoop::new(&mut player, "exit")
        .run(Cursor::new(input))
        .unwrap();

    // 16384 / 32768 = 0.5 at volume 0.5, copied to both channels
    let out = player.engine().render(64);
    assert!(out.iter().all(|s| (s - 0.25).abs() < 1e-3));
}

#[test]
fn replaying_a_sound_rescales_the_one_still_playing() {
    let dir = sounds(&["laser.wav"]);
    let laser = dir.path().join("laser.wav");

    let mut player = player(4);
    player.play(&laser, 0.2).unwrap();
    let first = player.engine().render(100);
    assert!(first.iter().all(|s| (s - 0.1).abs() < 1e-3));

    player.play(&laser, 0.8).unwrap();
    let both = player.engine().render(100);

    // Two playbacks of one resource, both at the latest volume
    assert!(both.iter().all(|s| (s - 0.8).abs() < 1e-3));
    assert_eq!(player.engine().loads.borrow().len(), 1);
}

#[test]
fn corrupt_file_is_skipped_and_cache_unchanged() {
    let dir = sounds(&["ok.wav"]);
    let corrupt = dir.path().join("corrupt.wav");
    std::fs::write(&corrupt, b"definitely not a wave file").unwrap();
    let ok = dir.path().join("ok.wav");
    let input = format!(
        "1 {ok}\n0.5 {corrupt}\n0.5 {missing}\nexit\n1 {ok}\n",
        ok = ok.display(),
        corrupt = corrupt.display(),
        missing = dir.path().join("missing.wav").display(),
    );

    let mut player = player(4);
    let mut commands = CommandLoop::new(&mut player, "exit");
    let outcome = commands.run(Cursor::new(input)).unwrap();
    let summary = commands.summary();

    assert_eq!(outcome, LoopOutcome::Exited);
    assert_eq!(summary.played, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.missing, 1);
    assert_eq!(player.cache().len(), 1);
    assert!(!is_cached(&player, &corrupt));
    assert_eq!(player.cache().stats().failed_loads, 1);
}

#[test]
fn dotted_and_plain_spellings_share_an_entry() {
    let dir = sounds(&["step.wav"]);
    let absolute = dir.path().join("step.wav");
    let dotted = dir.path().join(".").join("step.wav");

    let mut player = player(4);
    player.play(&absolute, 1.0).unwrap();
    player.play(&dotted, 1.0).unwrap();

    assert_eq!(player.cache().len(), 1);
    assert_eq!(player.cache().stats().hits, 1);
}

#[test]
fn evicted_sound_keeps_playing_to_the_end() {
    let dir = sounds(&["a.wav", "b.wav"]);
    let a = dir.path().join("a.wav");
    let b = dir.path().join("b.wav");

    let mut player = player(1);
    player.play(&a, 1.0).unwrap();
    let alone = player.engine().render(100);
    assert!(alone.iter().all(|s| (s - 0.5).abs() < 1e-3));

    player.play(&b, 0.5).unwrap();
    assert_eq!(player.cache().len(), 1);
    assert!(!is_cached(&player, &a));
    assert!(is_cached(&player, &b));

    // a is out of the cache but its playback still sounds: 0.5 + 0.25
    let mixed = player.engine().render(100);
    assert!(mixed.iter().all(|s| (s - 0.75).abs() < 1e-3));

    // a runs out after its 4000 frames, b has 100 frames left after that
    let rest_of_a = player.engine().render(3800);
    assert!(rest_of_a.iter().all(|s| (s - 0.75).abs() < 1e-3));
    let only_b = player.engine().render(50);
    assert!(only_b.iter().all(|s| (s - 0.25).abs() < 1e-3));
}
