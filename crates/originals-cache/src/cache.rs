//! # Resolution Cache
//!
//! Identifier → resolved document, bounded by `max_size`.
//!
//! ## Invariants
//!
//! - `get` returns a document only if it is unexpired and, with
//!   `verify_hash`, its recomputed SHA-256 content hash still equals the
//!   hash stored at insertion. A mismatch purges the entry and is a miss.
//! - Inserting a new id into a full cache evicts exactly the
//!   least-recently-accessed entry. Insertion counts as an access.
//! - A single `parking_lot::Mutex` guards the whole map, so expiry checks,
//!   hash checks, eviction and writes are serialized. `validate` compares and
//!   replaces under one acquisition.
//! - A TTL too large for the monotonic clock never expires.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use originals_core::{digest_value, ContentDigest};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;

use crate::config::CacheConfig;
use crate::error::CacheError;

/// Hit/miss accounting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub integrity_failures: u64,
    pub size: usize,
}

impl CacheStats {
    /// Hits over lookups, or 0 when there were none.
    pub fn hit_ratio(&self) -> f64 {
        let lookups = self.hits + self.misses;
        if lookups == 0 {
            0.0
        } else {
            self.hits as f64 / lookups as f64
        }
    }
}

/// Read-only view of one cached entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub inserted_at: Instant,
    /// `None` when the TTL reaches past the clock's range.
    pub expires_at: Option<Instant>,
    pub content_hash: ContentDigest,
    pub access_count: u64,
    pub last_access: Instant,
}

#[derive(Debug)]
struct CacheEntry {
    document: Value,
    content_hash: ContentDigest,
    inserted_at: Instant,
    expires_at: Option<Instant>,
    access_count: u64,
    last_access: Instant,
    // Monotonic access sequence; `Instant`s can tie.
    last_access_seq: u64,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    access_seq: u64,
    stats: CacheStats,
}

impl CacheState {
    fn next_seq(&mut self) -> u64 {
        self.access_seq += 1;
        self.access_seq
    }

    fn evict_lru(&mut self) {
        let victim = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_access_seq)
            .map(|(id, _)| id.clone());
        if let Some(id) = victim {
            self.entries.remove(&id);
            self.stats.evictions += 1;
            tracing::debug!(id = %id, "evicted least-recently-accessed cache entry");
        }
    }

    fn insert(
        &mut self,
        id: &str,
        document: Value,
        content_hash: ContentDigest,
        ttl: Duration,
        max_size: usize,
    ) {
        let now = Instant::now();
        let seq = self.next_seq();
        if !self.entries.contains_key(id) && self.entries.len() >= max_size {
            self.evict_lru();
        }
        self.entries.insert(
            id.to_string(),
            CacheEntry {
                document,
                content_hash,
                inserted_at: now,
                expires_at: now.checked_add(ttl),
                access_count: 0,
                last_access: now,
                last_access_seq: seq,
            },
        );
    }
}

/// Thread-safe, cloneable resolution cache. Clones share storage.
#[derive(Debug, Clone)]
pub struct ResolutionCache {
    config: CacheConfig,
    state: Arc<Mutex<CacheState>>,
}

impl ResolutionCache {
    /// Create an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up an unexpired, intact document.
    pub fn get(&self, id: &str) -> Option<Value> {
        if !self.config.enabled {
            return None;
        }
        let now = Instant::now();
        let mut state = self.state.lock();
        let seq = state.next_seq();

        let Some(entry) = state.entries.get_mut(id) else {
            state.stats.misses += 1;
            return None;
        };

        if entry.is_expired(now) {
            state.entries.remove(id);
            state.stats.expirations += 1;
            state.stats.misses += 1;
            tracing::debug!(id, "cache entry expired");
            return None;
        }

        if self.config.verify_hash {
            let intact = digest_value(&entry.document)
                .map(|h| h == entry.content_hash)
                .unwrap_or(false);
            if !intact {
                state.entries.remove(id);
                state.stats.integrity_failures += 1;
                state.stats.misses += 1;
                tracing::warn!(id, "cache entry failed content-hash verification; purged");
                return None;
            }
        }

        entry.access_count += 1;
        entry.last_access = now;
        entry.last_access_seq = seq;
        let document = entry.document.clone();
        state.stats.hits += 1;
        Some(document)
    }

    /// Store with the default TTL.
    pub fn set(&self, id: &str, document: Value) -> Result<(), CacheError> {
        self.set_with_ttl(id, document, self.config.default_ttl)
    }

    /// Store with an explicit TTL.
    pub fn set_with_ttl(&self, id: &str, document: Value, ttl: Duration) -> Result<(), CacheError> {
        if !self.config.enabled {
            return Ok(());
        }
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl { id: id.to_string() });
        }
        let content_hash = digest_value(&document).map_err(|source| CacheError::Canonicalization {
            id: id.to_string(),
            source,
        })?;

        self.state
            .lock()
            .insert(id, document, content_hash, ttl, self.config.max_size);
        tracing::debug!(id, ttl_secs = ttl.as_secs(), "cached document");
        Ok(())
    }

    /// Compare the cached entry with a fresh resolution.
    ///
    /// Returns `true` when the entry was missing or differed and has been
    /// replaced. An identical entry gets a fresh default TTL and `false` is
    /// returned.
    pub fn validate(&self, id: &str, fresh: Value) -> Result<bool, CacheError> {
        if !self.config.enabled {
            return Ok(false);
        }
        let fresh_hash = digest_value(&fresh).map_err(|source| CacheError::Canonicalization {
            id: id.to_string(),
            source,
        })?;
        let ttl = self.config.default_ttl;
        if ttl.is_zero() {
            return Err(CacheError::InvalidTtl { id: id.to_string() });
        }
        let mut state = self.state.lock();
        if let Some(entry) = state.entries.get_mut(id) {
            if entry.content_hash == fresh_hash && entry.document == fresh {
                entry.expires_at = Instant::now().checked_add(ttl);
                return Ok(false);
            }
        }
        tracing::info!(id, "cached document changed; replacing");
        state.insert(id, fresh, fresh_hash, ttl, self.config.max_size);
        Ok(true)
    }

    /// Remove an entry. Returns whether one was present.
    pub fn delete(&self, id: &str) -> bool {
        if !self.config.enabled {
            return false;
        }
        self.state.lock().entries.remove(id).is_some()
    }

    /// Remove every entry. Statistics are kept.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Drop all expired entries, returning how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut state = self.state.lock();
        let before = state.entries.len();
        state.entries.retain(|_, e| !e.is_expired(now));
        let removed = before - state.entries.len();
        state.stats.expirations += removed as u64;
        if removed > 0 {
            tracing::debug!(removed, "removed expired cache entries");
        }
        removed
    }

    /// Whether an unexpired entry exists. Does not count as an access.
    pub fn contains(&self, id: &str) -> bool {
        let now = Instant::now();
        self.state
            .lock()
            .entries
            .get(id)
            .is_some_and(|e| !e.is_expired(now))
    }

    /// Metadata for an entry, if present. Does not count as an access.
    pub fn entry_info(&self, id: &str) -> Option<EntryInfo> {
        self.state.lock().entries.get(id).map(|e| EntryInfo {
            inserted_at: e.inserted_at,
            expires_at: e.expires_at,
            content_hash: e.content_hash.clone(),
            access_count: e.access_count,
            last_access: e.last_access,
        })
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            size: state.entries.len(),
            ..state.stats
        }
    }

    #[cfg(test)]
    fn corrupt(&self, id: &str, document: Value) {
        if let Some(entry) = self.state.lock().entries.get_mut(id) {
            entry.document = document;
        }
    }
}

impl Default for ResolutionCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
