/*!
 * Content-addressed per-page translation cache.
 *
 * Keys derive from page image content plus the document schema version, so
 * the same page maps to the same entry regardless of filename or location,
 * and a schema bump invalidates old entries wholesale. Each entry is one
 * pretty-printed JSON document, which doubles as the human proofreading
 * surface: a hand-edited entry is read back as authoritative output.
 */

use log::{debug, warn};
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::page::{PAGE_SCHEMA_VERSION, PageTranslation};

/// Content-derived cache key for one page
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a page image. The schema version participates in
    /// the hash so entries written under an older document shape miss.
    pub fn for_image(image: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(format!("page-translation-v{}", PAGE_SCHEMA_VERSION).as_bytes());
        hasher.update(image);
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Hex digest backing this key
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// File-per-page cache of translation documents
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open a cache rooted at the given directory. The directory is created
    /// lazily on first write.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { dir: dir.as_ref().to_path_buf() }
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Read the cached document for a key. A missing entry returns `None`;
    /// an entry that exists but cannot be decoded is treated as a miss and
    /// logged, never as a fatal error.
    pub fn get(&self, key: &CacheKey) -> Option<PageTranslation> {
        let path = self.entry_path(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read cache entry {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(doc) => {
                debug!("Cache hit: {}", key);
                Some(doc)
            }
            Err(e) => {
                warn!(
                    "Corrupt cache entry {} treated as a miss: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Write a document under a key, replacing any previous entry. Uses a
    /// temp-file-and-rename so a crash cannot leave a half-written entry.
    pub fn put(&self, key: &CacheKey, result: &PageTranslation) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let json = serde_json::to_string_pretty(result)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &path)?;

        debug!("Cache entry written: {}", key);
        Ok(())
    }
}
