//! Response cache for GET requests
//!
//! Entries are keyed by a SHA-256 of method, URL and `Accept` header. They
//! live in memory and, when a directory is configured, on disk as a body
//! file plus a small JSON metadata file so that a later process can reuse
//! them. Entries older than the expiry age are ignored and refetched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// A cached successful response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

/// Cache usage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries currently held in memory
    pub entries: usize,
}

pub struct ResponseCache {
    entries: RwLock<HashMap<String, CachedResponse>>,
    dir: Option<PathBuf>,
    expire: chrono::Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("dir", &self.dir)
            .field("expire", &self.expire)
            .field("stats", &self.stats())
            .finish()
    }
}

impl ResponseCache {
    /// A cache held in memory only
    pub fn in_memory(expire: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            dir: None,
            expire: to_chrono(expire),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// A cache persisted under `dir` (created if needed)
    pub fn with_dir(dir: impl Into<PathBuf>, expire: Duration) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: Some(dir),
            ..Self::in_memory(expire)
        })
    }

    /// Cache key for a request
    pub fn key(method: &str, url: &str, accept: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update(b" ");
        hasher.update(url.as_bytes());
        hasher.update(b" ");
        hasher.update(accept.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Fresh entry for `key`, from memory or disk
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        let now = Utc::now();

        let in_memory = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned();

        let found = match in_memory {
            Some(entry) => Some(entry),
            None => self.read_disk(key).inspect(|entry| {
                self.entries
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(key.to_string(), entry.clone());
            }),
        };

        match found {
            Some(entry) if now - entry.stored_at <= self.expire => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            },
            Some(_) => {
                tracing::debug!(key, "Cached response expired");
                self.remove(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            },
        }
    }

    /// Store an entry; disk write failures are logged and otherwise ignored
    pub fn put(&self, key: &str, entry: CachedResponse) {
        if let Err(e) = self.write_disk(key, &entry) {
            tracing::warn!(error = %e, url = %entry.url, "Failed to persist cached response");
        }
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), entry);
    }

    pub fn remove(&self, key: &str) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        if let Some(dir) = &self.dir {
            let _ = std::fs::remove_file(dir.join(format!("{}.body", key)));
            let _ = std::fs::remove_file(dir.join(format!("{}.json", key)));
        }
    }

    /// Drop every entry, in memory and on disk
    pub fn clear(&self) -> std::io::Result<()> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();

        if let Some(dir) = &self.dir {
            for entry in std::fs::read_dir(dir)? {
                let path = entry?.path();
                let is_cache_file = path
                    .extension()
                    .is_some_and(|ext| ext == "body" || ext == "json");
                if is_cache_file {
                    std::fs::remove_file(path)?;
                }
            }
        }
        Ok(())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len(),
        }
    }

    fn read_disk(&self, key: &str) -> Option<CachedResponse> {
        let dir = self.dir.as_ref()?;
        let meta = std::fs::read_to_string(dir.join(format!("{}.json", key))).ok()?;
        let meta: EntryMeta = serde_json::from_str(&meta).ok()?;
        let body = std::fs::read(dir.join(format!("{}.body", key))).ok()?;

        Some(CachedResponse {
            url: meta.url,
            headers: meta.headers,
            body,
            stored_at: meta.stored_at,
        })
    }

    fn write_disk(&self, key: &str, entry: &CachedResponse) -> std::io::Result<()> {
        let Some(dir) = &self.dir else {
            return Ok(());
        };

        let meta = EntryMeta {
            url: entry.url.clone(),
            headers: entry.headers.clone(),
            stored_at: entry.stored_at,
        };
        std::fs::write(dir.join(format!("{}.body", key)), &entry.body)?;
        std::fs::write(dir.join(format!("{}.json", key)), serde_json::to_vec(&meta)?)?;
        Ok(())
    }
}

fn to_chrono(expire: Duration) -> chrono::Duration {
    chrono::Duration::from_std(expire).unwrap_or_else(|_| chrono::Duration::days(36_500))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entry(url: &str, body: &str) -> CachedResponse {
        CachedResponse {
            url: url.to_string(),
            headers: vec![("content-type".to_string(), "text/plain".to_string())],
            body: body.as_bytes().to_vec(),
            stored_at: Utc::now(),
        }
    }

    #[test]
    fn test_key_depends_on_accept() {
        let a = ResponseCache::key("GET", "https://rest.kegg.jp/info/kegg", "text/plain");
        let b = ResponseCache::key("GET", "https://rest.kegg.jp/info/kegg", "application/json");
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_memory_hit_and_miss() {
        let cache = ResponseCache::in_memory(Duration::from_secs(60));
        assert!(cache.get("k").is_none());

        cache.put("k", entry("https://x/1", "hello"));
        let hit = cache.get("k").unwrap();
        assert_eq!(hit.body, b"hello");

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.entries), (1, 1, 1));
    }

    #[test]
    fn test_expired_entries_are_dropped() {
        let cache = ResponseCache::in_memory(Duration::from_secs(60));
        let mut old = entry("https://x/1", "stale");
        old.stored_at = Utc::now() - chrono::Duration::minutes(5);
        cache.put("k", old);

        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().entries, 0);
    }

    #[test]
    fn test_disk_entries_survive_new_instance() {
        let dir = TempDir::new().unwrap();
        {
            let cache = ResponseCache::with_dir(dir.path(), Duration::from_secs(60)).unwrap();
            cache.put("abc", entry("https://x/2", "persisted"));
        }

        let cache = ResponseCache::with_dir(dir.path(), Duration::from_secs(60)).unwrap();
        let hit = cache.get("abc").unwrap();
        assert_eq!(hit.url, "https://x/2");
        assert_eq!(hit.body, b"persisted");

        cache.clear().unwrap();
        assert!(cache.get("abc").is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
