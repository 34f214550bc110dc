// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Time-boxed response cache for remote module sources
//!
//! Entries are keyed by request URL. A cache is constructed once per process
//! and handed to the loader by reference. When a disk directory is given,
//! entries are also persisted as `<sha256(url)>.json` so a later run within
//! the TTL can skip the network.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default lifetime of cached responses
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct Entry {
    stored_at: Instant,
    body: String,
}

/// On-disk representation of a cached response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiskEntry {
    url: String,
    fetched_at: DateTime<Utc>,
    body: String,
}

/// Insert/expire map of response bodies keyed by URL
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: Duration,
    disk_dir: Option<PathBuf>,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResponseCache {
    /// Create an in-memory cache
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            disk_dir: None,
        }
    }

    /// Create a cache that also persists entries under `dir`
    #[must_use]
    pub fn with_disk(ttl: Duration, dir: impl Into<PathBuf>) -> Self {
        Self {
            disk_dir: Some(dir.into()),
            ..Self::new(ttl)
        }
    }

    /// Lifetime callers should pass to [`ResponseCache::get`]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get a body if it was stored less than `ttl` ago
    pub fn get(&self, key: &str, ttl: Duration) -> Option<String> {
        {
            let mut entries = self.lock();
            if let Some(entry) = entries.get(key) {
                if entry.stored_at.elapsed() < ttl {
                    debug!("Cache hit: {}", key);
                    return Some(entry.body.clone());
                }
                entries.remove(key);
            }
        }

        let body = self.read_disk(key, ttl)?;
        debug!("Disk cache hit: {}", key);
        self.lock().insert(
            key.to_string(),
            Entry {
                stored_at: Instant::now(),
                body: body.clone(),
            },
        );
        Some(body)
    }

    /// Store a body under `key`
    pub fn set(&self, key: &str, body: impl Into<String>) {
        let body = body.into();
        self.write_disk(key, &body);
        self.lock().insert(
            key.to_string(),
            Entry {
                stored_at: Instant::now(),
                body,
            },
        );
    }

    /// Drop every in-memory entry
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of in-memory entries (expired ones included until touched)
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True if no entries are held in memory
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        // Entries stay consistent across a panic in another holder
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn disk_path(dir: &Path, key: &str) -> PathBuf {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        dir.join(format!("{}.json", hex::encode(hasher.finalize())))
    }

    fn read_disk(&self, key: &str, ttl: Duration) -> Option<String> {
        let dir = self.disk_dir.as_ref()?;
        let path = Self::disk_path(dir, key);
        let content = fs::read_to_string(&path).ok()?;
        let entry: DiskEntry = match serde_json::from_str(&content) {
            Ok(e) => e,
            Err(e) => {
                warn!("Ignoring corrupt cache file {}: {}", path.display(), e);
                return None;
            }
        };
        if entry.url != key {
            return None;
        }
        let age = Utc::now().signed_duration_since(entry.fetched_at).to_std().ok()?;
        (age < ttl).then_some(entry.body)
    }

    fn write_disk(&self, key: &str, body: &str) {
        let Some(dir) = self.disk_dir.as_ref() else {
            return;
        };
        let entry = DiskEntry {
            url: key.to_string(),
            fetched_at: Utc::now(),
            body: body.to_string(),
        };
        let result = fs::create_dir_all(dir).and_then(|()| {
            let json = serde_json::to_string(&entry).map_err(std::io::Error::other)?;
            fs::write(Self::disk_path(dir, key), json)
        });
        if let Err(e) = result {
            warn!("Failed to persist cache entry for {}: {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const URL: &str = "https://api.github.com/repos/gettakaro/takaro/contents/x";

    #[test]
    fn test_set_then_get() {
        let cache = ResponseCache::default();
        cache.set(URL, "body");

        assert_eq!(cache.get(URL, DEFAULT_TTL).as_deref(), Some("body"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let cache = ResponseCache::default();
        cache.set(URL, "body");

        assert!(cache.get(URL, Duration::ZERO).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::default();
        cache.set("a", "1");
        cache.set("b", "2");
        cache.clear();

        assert!(cache.get("a", DEFAULT_TTL).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disk_entries_survive_a_new_cache() {
        let dir = TempDir::new().unwrap();
        {
            let cache = ResponseCache::with_disk(DEFAULT_TTL, dir.path());
            cache.set(URL, "persisted");
        }

        let cache = ResponseCache::with_disk(DEFAULT_TTL, dir.path());
        assert_eq!(cache.get(URL, DEFAULT_TTL).as_deref(), Some("persisted"));
    }

    #[test]
    fn test_corrupt_disk_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = ResponseCache::with_disk(DEFAULT_TTL, dir.path());
        fs::write(ResponseCache::disk_path(dir.path(), URL), "{not json").unwrap();

        assert!(cache.get(URL, DEFAULT_TTL).is_none());
    }
}
