// Sound cache module
// Bounded LRU mapping from canonical paths to loaded sounds

pub mod key;
pub mod sound_cache;

pub use key::CacheKey;
pub use sound_cache::{CacheStats, SoundCache, DEFAULT_CAPACITY};
