//! File registry: opaque identifiers for media files
//!
//! Maps fixed-width identifiers to absolute paths and caches file metadata.
//! The identifier is XXH64 of the file's base name, so re-registering the
//! same name yields the same id even from a different directory. This trades
//! collision-safety for path-independence: two files sharing a base name in
//! different directories collide, and the most recent registration wins.
//!
//! Absence is always `None`, never an error. Only I/O failures during a
//! directory scan are logged and skipped.

pub mod types;

pub use types::{FileRecord, MediaKind};

use crate::errors::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use twox_hash::XxHash64;

/// Cached metadata older than this is re-stat'ed on read
pub const METADATA_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    record: FileRecord,
    refreshed_at: Instant,
}

/// Process-local registry of media files
///
/// Constructed once at startup and shared by reference; the cache tolerates
/// concurrent reads, and concurrent refreshes of the same id resolve
/// last-writer-wins.
pub struct FileRegistry {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

/// Compute the fixed-width identifier for a path's base name
pub fn file_id(path: &Path) -> String {
    let base_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut hasher = XxHash64::with_seed(0);
    hasher.write(base_name.as_bytes());
    format!("{:016x}", hasher.finish())
}

impl FileRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a file and return its identifier
    ///
    /// Stats the file to populate metadata. Idempotent for the same base
    /// name: the returned id is identical on every call.
    pub fn register(&self, path: &Path) -> Result<String> {
        let record = stat_record(path)?;
        let id = record.id.clone();

        let mut entries = self.entries.write().expect("registry lock poisoned");
        entries.insert(
            id.clone(),
            CacheEntry {
                record,
                refreshed_at: Instant::now(),
            },
        );

        Ok(id)
    }

    /// Resolve an identifier to its path
    ///
    /// O(1) map lookup; never touches the filesystem.
    pub fn resolve(&self, id: &str) -> Option<PathBuf> {
        let entries = self.entries.read().expect("registry lock poisoned");
        entries.get(id).map(|e| e.record.path.clone())
    }

    /// Get the record for an identifier, refreshing stale metadata
    ///
    /// Returns the cached record if younger than [`METADATA_TTL`]; otherwise
    /// re-stats the file. If the underlying file has been deleted the entry
    /// is evicted and `None` is returned.
    pub fn get_info(&self, id: &str) -> Option<FileRecord> {
        let path = {
            let entries = self.entries.read().expect("registry lock poisoned");
            let entry = entries.get(id)?;
            if entry.refreshed_at.elapsed() < METADATA_TTL {
                return Some(entry.record.clone());
            }
            entry.record.path.clone()
        };

        match stat_record(&path) {
            Ok(record) => {
                let mut entries = self.entries.write().expect("registry lock poisoned");
                let refreshed = record.clone();
                entries.insert(
                    id.to_string(),
                    CacheEntry {
                        record,
                        refreshed_at: Instant::now(),
                    },
                );
                Some(refreshed)
            }
            Err(e) => {
                debug!(id, error = %e, "evicting registry entry for unreadable file");
                let mut entries = self.entries.write().expect("registry lock poisoned");
                entries.remove(id);
                None
            }
        }
    }

    /// All currently known records
    ///
    /// Does not trigger a filesystem scan; call [`FileRegistry::scan`] to
    /// pick up new files.
    pub fn list(&self) -> Vec<FileRecord> {
        let entries = self.entries.read().expect("registry lock poisoned");
        entries.values().map(|e| e.record.clone()).collect()
    }

    /// Number of registered files
    pub fn len(&self) -> usize {
        self.entries.read().expect("registry lock poisoned").len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scan a directory non-recursively and register every regular file
    ///
    /// Per-file failures are logged and skipped; an unreadable directory
    /// registers nothing. Returns the number of files registered.
    pub fn scan(&self, dir: &Path) -> usize {
        let read_dir = match std::fs::read_dir(dir) {
            Ok(rd) => rd,
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "source directory scan failed");
                return 0;
            }
        };

        let mut registered = 0;
        for entry in read_dir {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };

            let path = entry.path();
            match entry.file_type() {
                Ok(ft) if ft.is_file() => match self.register(&path) {
                    Ok(id) => {
                        debug!(id, path = %path.display(), "registered file");
                        registered += 1;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "skipping unreadable file");
                    }
                },
                Ok(_) => {}
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping entry with unknown type");
                }
            }
        }

        registered
    }
}

impl Default for FileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Stat a file and build its record
fn stat_record(path: &Path) -> Result<FileRecord> {
    let metadata = std::fs::metadata(path)?;
    let modified: DateTime<Utc> = metadata
        .modified()
        .map(DateTime::from)
        .unwrap_or_else(|_| Utc::now());

    Ok(FileRecord {
        id: file_id(path),
        path: path.to_path_buf(),
        size: metadata.len(),
        modified,
        media_kind: MediaKind::from_path(path),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"data").unwrap();
        path
    }

    #[test]
    fn test_register_resolve_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "clip.mp4");

        let registry = FileRegistry::new();
        let id = registry.register(&path).unwrap();

        assert_eq!(registry.resolve(&id), Some(path));
    }

    #[test]
    fn test_register_idempotent_on_base_name() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "clip.mp4");

        let registry = FileRegistry::new();
        let first = registry.register(&path).unwrap();
        let second = registry.register(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_same_base_name_different_dirs_collide() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let path_a = touch(&dir_a, "clip.mp4");
        let path_b = touch(&dir_b, "clip.mp4");

        let registry = FileRegistry::new();
        let id_a = registry.register(&path_a).unwrap();
        let id_b = registry.register(&path_b).unwrap();

        // Same base name, same id; last registration wins
        assert_eq!(id_a, id_b);
        assert_eq!(registry.resolve(&id_a), Some(path_b));
    }

    #[test]
    fn test_id_is_fixed_width_hex() {
        let id = file_id(&PathBuf::from("/anywhere/clip.mp4"));
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_id_independent_of_directory() {
        let a = file_id(&PathBuf::from("/tmp/clip.mp4"));
        let b = file_id(&PathBuf::from("/var/media/clip.mp4"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_resolve_unknown_id() {
        let registry = FileRegistry::new();
        assert_eq!(registry.resolve("0000000000000000"), None);
    }

    #[test]
    fn test_get_info_returns_metadata() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "clip.mp4");

        let registry = FileRegistry::new();
        let id = registry.register(&path).unwrap();

        let record = registry.get_info(&id).unwrap();
        assert_eq!(record.media_kind, MediaKind::Video);
        assert_eq!(record.size, 4);
        assert_eq!(record.path, path);
    }

    #[test]
    fn test_get_info_unknown_id() {
        let registry = FileRegistry::new();
        assert!(registry.get_info("ffffffffffffffff").is_none());
    }

    #[test]
    fn test_list_includes_registered() {
        let dir = TempDir::new().unwrap();
        let path = touch(&dir, "clip.mp4");

        let registry = FileRegistry::new();
        registry.register(&path).unwrap();

        let records = registry.list();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].media_kind, MediaKind::Video);
    }

    #[test]
    fn test_scan_registers_regular_files() {
        let dir = TempDir::new().unwrap();
        touch(&dir, "a.mp4");
        touch(&dir, "b.mp3");
        fs::create_dir(dir.path().join("subdir")).unwrap();
        fs::write(dir.path().join("subdir").join("nested.mp4"), b"x").unwrap();

        let registry = FileRegistry::new();
        let count = registry.scan(dir.path());

        // Non-recursive: the nested file is not picked up
        assert_eq!(count, 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_scan_missing_directory_is_not_fatal() {
        let registry = FileRegistry::new();
        let count = registry.scan(&PathBuf::from("/nonexistent/mediapilot-test"));
        assert_eq!(count, 0);
        assert!(registry.is_empty());
    }
}
