//! Directory-backed entry store.
//!
//! One directory, one file per entry. The filename carries all metadata
//! (see [`EntryMeta::encode_name`]); the file content is the raw blob.
//! Lookup cost is O(entries) on the first touch, after which a lazily
//! built fingerprint index answers without listing the directory. The
//! index is maintained on every write/delete, so its answers match what
//! a fresh directory scan would return.

use bytes::Bytes;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::{debug, warn};

use super::expiry::Ticks;
use super::key::{EntryMeta, Fingerprint};
use crate::Result;

/// Point-in-time store counters.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    pub deletes: u64,
}

impl CacheStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    deletes: AtomicU64,
}

impl AtomicStats {
    fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
        }
    }

    fn to_stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
        }
    }
}

/// Entry store over a single cache directory.
pub struct DiskStore {
    dir: PathBuf,
    index: Mutex<Option<HashMap<Fingerprint, EntryMeta>>>,
    stats: AtomicStats,
}

impl DiskStore {
    /// Open a store over `dir`, creating the directory if missing.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            index: Mutex::new(None),
            stats: AtomicStats::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a fingerprint to its on-disk entry, if one exists.
    ///
    /// Undecodable filenames in the directory are skipped. All I/O
    /// failures are absorbed as a miss; lookup never fails the caller.
    pub fn find_entry(&self, fingerprint: Fingerprint) -> Option<(PathBuf, EntryMeta)> {
        match self.lookup(fingerprint) {
            Some(meta) => {
                let path = self.dir.join(meta.encode_name());
                // The index may outlive a file removed behind our back.
                if path.is_file() {
                    self.stats.hits.fetch_add(1, Ordering::Relaxed);
                    Some((path, meta))
                } else {
                    self.forget(fingerprint);
                    self.stats.misses.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Read an entry's blob.
    pub fn read(&self, path: &Path) -> io::Result<Bytes> {
        fs::read(path).map(Bytes::from)
    }

    /// Persist a new entry, replacing any previous entry in the same slot.
    ///
    /// The blob lands under a temporary name and is renamed into place, so
    /// a concurrent `find_entry` either sees the complete entry or none.
    pub fn write(&self, meta: &EntryMeta, bytes: &[u8]) -> Result<PathBuf> {
        if let Some(old) = self.lookup(meta.fingerprint) {
            if old != *meta {
                self.delete(&self.dir.join(old.encode_name()));
            }
        }

        let name = meta.encode_name();
        let path = self.dir.join(&name);
        let staging = self.dir.join(format!("{name}.tmp"));
        fs::write(&staging, bytes)?;
        fs::rename(&staging, &path)?;

        if let Ok(mut guard) = self.index.lock() {
            if let Some(map) = guard.as_mut() {
                map.insert(meta.fingerprint, *meta);
            }
        }
        self.stats.writes.fetch_add(1, Ordering::Relaxed);
        debug!(entry = %name, len = bytes.len(), "cache entry written");
        Ok(path)
    }

    /// Remove an entry file. Idempotent: a file that is already gone is
    /// success, and no failure here ever reaches the caller.
    pub fn delete(&self, path: &Path) {
        match fs::remove_file(path) {
            Ok(()) => {
                self.stats.deletes.fetch_add(1, Ordering::Relaxed);
                debug!(entry = %path.display(), "cache entry deleted");
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(entry = %path.display(), error = %e, "cache delete failed"),
        }

        if let Some(meta) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| EntryMeta::decode_name(n).ok())
        {
            if let Ok(mut guard) = self.index.lock() {
                if let Some(map) = guard.as_mut() {
                    if map.get(&meta.fingerprint) == Some(&meta) {
                        map.remove(&meta.fingerprint);
                    }
                }
            }
        }
    }

    /// Delete every entry whose expiry has passed. Returns the number of
    /// entries removed.
    pub fn prune_expired(&self, now: Ticks) -> usize {
        let mut removed = 0;
        for meta in self.list() {
            if meta.is_expired(now) {
                self.delete(&self.dir.join(meta.encode_name()));
                removed += 1;
            }
        }
        removed
    }

    /// Delete every decodable entry. Foreign files in the directory are
    /// left alone.
    pub fn clear(&self) {
        for meta in self.list() {
            self.delete(&self.dir.join(meta.encode_name()));
        }
    }

    /// Number of decodable entries currently on disk.
    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }

    /// Index lookup, (re)building the index from a directory scan on first
    /// use. Does not touch the hit/miss counters.
    fn lookup(&self, fingerprint: Fingerprint) -> Option<EntryMeta> {
        let mut guard = self.index.lock().ok()?;
        if guard.is_none() {
            *guard = self.scan();
        }
        guard.as_ref()?.get(&fingerprint).copied()
    }

    fn forget(&self, fingerprint: Fingerprint) {
        if let Ok(mut guard) = self.index.lock() {
            if let Some(map) = guard.as_mut() {
                map.remove(&fingerprint);
            }
        }
    }

    /// Fresh directory listing of decodable entries.
    fn list(&self) -> Vec<EntryMeta> {
        self.scan().map(|m| m.into_values().collect()).unwrap_or_default()
    }

    fn scan(&self) -> Option<HashMap<Fingerprint, EntryMeta>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cache directory unreadable");
                return None;
            }
        };

        let mut map = HashMap::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            match EntryMeta::decode_name(name) {
                // First match wins, as a raw directory walk would behave.
                Ok(meta) => {
                    map.entry(meta.fingerprint).or_insert(meta);
                }
                Err(e) => debug!(file = %name, error = %e, "skipping undecodable cache file"),
            }
        }
        Some(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta_for(key: &str, expires_at: Ticks) -> EntryMeta {
        EntryMeta {
            fingerprint: Fingerprint::of(key),
            expires_at,
            width: 64,
            height: 32,
        }
    }

    #[test]
    fn test_write_then_find_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let meta = meta_for("https://x/img.png", 6000);

        let written = store.write(&meta, b"blob-bytes").unwrap();
        let (path, found) = store.find_entry(meta.fingerprint).unwrap();
        assert_eq!(path, written);
        assert_eq!(found, meta);
        assert_eq!(store.read(&path).unwrap().as_ref(), b"blob-bytes");
    }

    #[test]
    fn test_find_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        assert!(store.find_entry(Fingerprint::of("nope")).is_none());
        assert_eq!(store.stats().misses, 1);
    }

    #[test]
    fn test_write_replaces_previous_entry_in_slot() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let key = "https://x/img.png";

        store.write(&meta_for(key, 4000), b"old").unwrap();
        store.write(&meta_for(key, 6000), b"new").unwrap();

        assert_eq!(store.len(), 1);
        let (path, meta) = store.find_entry(Fingerprint::of(key)).unwrap();
        assert_eq!(meta.expires_at, 6000);
        assert_eq!(store.read(&path).unwrap().as_ref(), b"new");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let meta = meta_for("k", 1000);
        let path = store.write(&meta, b"x").unwrap();

        store.delete(&path);
        store.delete(&path);
        assert!(store.find_entry(meta.fingerprint).is_none());
        assert_eq!(store.stats().deletes, 1);
    }

    #[test]
    fn test_undecodable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README"), b"not an entry").unwrap();
        fs::write(dir.path().join("a_b_c"), b"short").unwrap();
        let store = DiskStore::open(dir.path()).unwrap();

        assert_eq!(store.len(), 0);
        assert!(store.find_entry(Fingerprint::of("README")).is_none());
    }

    #[test]
    fn test_staging_file_is_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let meta = meta_for("k", 1000);
        // Simulate a crashed write that left the staging file behind.
        fs::write(
            dir.path().join(format!("{}.tmp", meta.encode_name())),
            b"partial",
        )
        .unwrap();

        assert!(store.find_entry(meta.fingerprint).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_prune_expired_removes_only_stale() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        store.write(&meta_for("stale", 4000), b"a").unwrap();
        store.write(&meta_for("fresh", 9000), b"b").unwrap();

        assert_eq!(store.prune_expired(5000), 1);
        assert!(store.find_entry(Fingerprint::of("stale")).is_none());
        assert!(store.find_entry(Fingerprint::of("fresh")).is_some());
    }

    #[test]
    fn test_clear_leaves_foreign_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("keep.me"), b"foreign").unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        store.write(&meta_for("a", 1000), b"x").unwrap();
        store.write(&meta_for("b", 2000), b"y").unwrap();

        store.clear();
        assert!(store.is_empty());
        assert!(dir.path().join("keep.me").is_file());
    }

    #[test]
    fn test_externally_removed_file_becomes_a_miss() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let meta = meta_for("k", 1000);
        let path = store.write(&meta, b"x").unwrap();
        // Warm the index, then pull the file out from under it.
        assert!(store.find_entry(meta.fingerprint).is_some());
        fs::remove_file(&path).unwrap();

        assert!(store.find_entry(meta.fingerprint).is_none());
    }

    #[test]
    fn test_hit_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskStore::open(dir.path()).unwrap();
        let meta = meta_for("k", 1000);
        store.write(&meta, b"x").unwrap();

        store.find_entry(meta.fingerprint);
        store.find_entry(Fingerprint::of("other"));
        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
