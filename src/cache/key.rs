// Cache keys: canonical absolute paths to sound files

use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Canonical form of a sound file path
///
/// Distinct spellings of the same file (relative vs absolute, `.`/`..`
/// segments, symlinks when the file exists) map to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(PathBuf);

impl CacheKey {
    /// Canonicalize `path` relative to the current working directory
    pub fn resolve(path: &Path) -> io::Result<Self> {
        if path.is_absolute() {
            return Ok(Self::resolve_from(Path::new(""), path));
        }
        let cwd = std::env::current_dir()?;
        Ok(Self::resolve_from(&cwd, path))
    }

    /// Canonicalize `path` relative to `base`
    ///
    /// Existing files go through the filesystem so symlinks are resolved.
    /// Anything else falls back to a purely lexical absolute form.
    pub fn resolve_from(base: &Path, path: &Path) -> Self {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };

        match fs::canonicalize(&joined) {
            Ok(canonical) => Self(canonical),
            Err(_) => Self(normalize_lexically(&joined)),
        }
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for CacheKey {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Drop `.` segments and fold `..` into its parent without touching the disk
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => normalized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                normalized.pop();
            }
            Component::Normal(part) => normalized.push(part),
        }
    }
    normalized
}
