// Sound player: resolves files through the LRU cache and dispatches playback
use std::num::NonZeroUsize;
use std::path::Path;
use tracing::debug;

use super::engine::AudioEngine;
use crate::cache::{CacheKey, SoundCache};
use crate::error::LoadError;

/// Plays sound files through an engine, keeping recently used sounds loaded
///
/// Single caller by design: every call runs to completion before the next.
pub struct SoundPlayer<E: AudioEngine> {
    engine: E,
    cache: SoundCache<E::Resource>,
}

impl<E: AudioEngine> SoundPlayer<E> {
    /// Create a player with the default cache capacity (50 sounds)
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            cache: SoundCache::default(),
        }
    }

    pub fn with_capacity(engine: E, capacity: NonZeroUsize) -> Self {
        Self {
            engine,
            cache: SoundCache::new(capacity),
        }
    }

    /// Get the loaded resource for `path`, loading it on a cache miss
    ///
    /// Load failures are returned as-is and leave the cache unchanged.
    pub fn resolve(&mut self, path: &Path) -> Result<E::Resource, LoadError> {
        let key = CacheKey::resolve(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let engine = &self.engine;
        self.cache
            .get_or_try_load(key, |key| engine.load(key.as_path()))
    }

    /// Play `path` at `volume`
    ///
    /// The volume is applied to the shared resource, so a playback of the
    /// same file that is still sounding switches to this volume too.
    pub fn play(&mut self, path: &Path, volume: f32) -> Result<(), LoadError> {
        let resource = self.resolve(path)?;
        debug!(path = %path.display(), volume, "playing sound");
        self.engine.set_volume_and_play(&resource, volume);
        Ok(())
    }

    pub fn cache(&self) -> &SoundCache<E::Resource> {
        &self.cache
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}
