//! In-memory file cache.
//!
//! Files under the configured root are read once at startup and served
//! from memory afterwards. Keys are paths relative to the root, so a
//! `FILE` request for `TYPE=moh3/tos/0_20753` looks up exactly that path.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
pub struct FileCache {
    files: Mutex<HashMap<PathBuf, Bytes>>,
}

impl FileCache {
    pub fn new() -> Self {
        FileCache::default()
    }

    /// Recursively load every regular file under `root`.
    ///
    /// Unreadable entries are logged and skipped; a path that is already
    /// cached is reported and left alone. Returns how many files were added.
    pub fn load_dir(&self, root: &Path) -> io::Result<usize> {
        let mut pending = vec![root.to_path_buf()];
        let mut loaded = 0;

        while let Some(dir) = pending.pop() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if dir == root => return Err(e),
                Err(e) => {
                    warn!("Skipping directory {}: {}", dir.display(), e);
                    continue;
                }
            };

            for entry in entries {
                let path = match entry {
                    Ok(entry) => entry.path(),
                    Err(e) => {
                        warn!("Skipping entry in {}: {}", dir.display(), e);
                        continue;
                    }
                };

                if path.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(key) = path.strip_prefix(root).map(Path::to_path_buf) else {
                    continue;
                };

                if self.load_file(&path, key) {
                    loaded += 1;
                }
            }
        }

        info!("Loaded {} file(s) from {}", loaded, root.display());
        Ok(loaded)
    }

    fn load_file(&self, path: &Path, key: PathBuf) -> bool {
        let mut files = self.lock();

        if files.contains_key(&key) {
            error!("File {} is already loaded", key.display());
            return false;
        }

        match fs::read(path) {
            Ok(data) => {
                debug!("Cached {} ({} bytes)", key.display(), data.len());
                files.insert(key, Bytes::from(data));
                true
            }
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                false
            }
        }
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<Bytes> {
        self.lock().get(path.as_ref()).cloned()
    }

    pub fn unload_all(&self) {
        let mut files = self.lock();
        debug!("Unloading {} cached file(s)", files.len());
        files.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Bytes>> {
        self.files.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("moh3/tos")).unwrap();
        fs::write(dir.path().join("moh3/tos/0_20753"), b"terms of service").unwrap();
        fs::write(dir.path().join("motd.txt"), b"welcome").unwrap();
        dir
    }

    #[test]
    fn loads_nested_files_by_relative_path() {
        let dir = populated();
        let cache = FileCache::new();

        assert_eq!(cache.load_dir(dir.path()).unwrap(), 2);
        assert_eq!(cache.len(), 2);
        assert_eq!(
            cache.get("moh3/tos/0_20753").as_deref(),
            Some(&b"terms of service"[..])
        );
        assert_eq!(cache.get("motd.txt").as_deref(), Some(&b"welcome"[..]));
        assert!(cache.get("missing").is_none());
    }

    #[test]
    fn second_load_skips_known_paths() {
        let dir = populated();
        let cache = FileCache::new();

        cache.load_dir(dir.path()).unwrap();
        fs::write(dir.path().join("motd.txt"), b"changed").unwrap();

        assert_eq!(cache.load_dir(dir.path()).unwrap(), 0);
        assert_eq!(cache.get("motd.txt").as_deref(), Some(&b"welcome"[..]));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new();

        assert!(cache.load_dir(&dir.path().join("nope")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn unload_all_empties_the_cache() {
        let dir = populated();
        let cache = FileCache::new();
        cache.load_dir(dir.path()).unwrap();

        cache.unload_all();
        assert!(cache.is_empty());
    }
}
