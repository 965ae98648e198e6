//! Image storage behind the `/image` endpoint.
//!
//! Keys are plain file names (`RCS-....png`). The file store keeps a
//! volume-bounded in-memory cache in front of the folder so fresh images are
//! served without touching the disk.

use std::collections::{HashMap, VecDeque};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use ring_common::{RingError, RingResult};

/// Byte sink and source keyed by file name.
pub trait ImageStore: Send + Sync {
    fn put(&self, key: &str, bytes: &[u8]) -> RingResult<()>;

    fn get(&self, key: &str) -> RingResult<Vec<u8>>;

    /// Drop the image. Unknown keys are not an error.
    fn forget(&self, key: &str) -> RingResult<()>;
}

fn validate_key(key: &str) -> RingResult<()> {
    if key.is_empty() || key == "." || key == ".." || key.contains(['/', '\\']) {
        return Err(RingError::InvalidInput(format!("bad image key: {key:?}")));
    }
    Ok(())
}

// ============================================================================
// File store
// ============================================================================

/// Insertion-ordered cache with a total byte limit
#[derive(Debug, Default)]
struct VolumeCache {
    max_bytes: usize,
    volume: usize,
    entries: HashMap<String, Vec<u8>>,
    order: VecDeque<String>,
}

impl VolumeCache {
    fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            ..Default::default()
        }
    }

    fn insert(&mut self, key: &str, bytes: &[u8]) {
        self.remove(key);
        if bytes.len() > self.max_bytes {
            return;
        }

        while self.volume + bytes.len() > self.max_bytes {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            if let Some(evicted) = self.entries.remove(&oldest) {
                self.volume -= evicted.len();
            }
        }

        self.volume += bytes.len();
        self.entries.insert(key.to_string(), bytes.to_vec());
        self.order.push_back(key.to_string());
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn remove(&mut self, key: &str) {
        if let Some(old) = self.entries.remove(key) {
            self.volume -= old.len();
            self.order.retain(|k| k != key);
        }
    }
}

/// Images kept as files in one folder.
#[derive(Debug)]
pub struct FileImageStore {
    folder: PathBuf,
    cache: Mutex<VolumeCache>,
}

impl FileImageStore {
    /// Open (creating if needed) the folder. With `clear` every regular file
    /// already in it is removed.
    pub fn open(folder: impl Into<PathBuf>, clear: bool, cache_max_bytes: usize) -> RingResult<Self> {
        let folder = folder.into();
        std::fs::create_dir_all(&folder)?;

        if clear {
            let removed = clear_folder(&folder)?;
            tracing::info!(folder = ?folder, removed = removed, "🧹 Images folder cleared");
        }

        Ok(Self {
            folder,
            cache: Mutex::new(VolumeCache::new(cache_max_bytes)),
        })
    }

    /// Bytes currently held in memory
    pub fn cached_volume(&self) -> usize {
        self.cache().volume
    }

    fn cache(&self) -> MutexGuard<'_, VolumeCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn path_of(&self, key: &str) -> RingResult<PathBuf> {
        validate_key(key)?;
        Ok(self.folder.join(key))
    }
}

fn clear_folder(folder: &Path) -> RingResult<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(folder)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            std::fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

impl ImageStore for FileImageStore {
    fn put(&self, key: &str, bytes: &[u8]) -> RingResult<()> {
        let path = self.path_of(key)?;
        std::fs::write(&path, bytes)?;
        self.cache().insert(key, bytes);
        Ok(())
    }

    fn get(&self, key: &str) -> RingResult<Vec<u8>> {
        let path = self.path_of(key)?;
        if let Some(bytes) = self.cache().get(key) {
            return Ok(bytes);
        }

        match std::fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RingError::UnknownId(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn forget(&self, key: &str) -> RingResult<()> {
        let path = self.path_of(key)?;
        self.cache().remove(key);

        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Memory store
// ============================================================================

/// Images kept in a map; nothing touches the disk.
#[derive(Debug, Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.images().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn images(&self) -> MutexGuard<'_, HashMap<String, Vec<u8>>> {
        self.images.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ImageStore for MemoryImageStore {
    fn put(&self, key: &str, bytes: &[u8]) -> RingResult<()> {
        validate_key(key)?;
        self.images().insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, key: &str) -> RingResult<Vec<u8>> {
        validate_key(key)?;
        self.images()
            .get(key)
            .cloned()
            .ok_or_else(|| RingError::UnknownId(key.to_string()))
    }

    fn forget(&self, key: &str) -> RingResult<()> {
        validate_key(key)?;
        self.images().remove(key);
        Ok(())
    }
}
