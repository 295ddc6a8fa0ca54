//! Single-use identifier tracking.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::error::{CacheError, CacheResult};

/// Inserts between sweeps of expired entries.
pub const PURGE_INTERVAL: usize = 256;

/// Store of identifiers that may be consumed only once.
///
/// Implementations must make [`insert_if_absent`](Self::insert_if_absent)
/// atomic: two concurrent calls with the same live ID must not both succeed.
pub trait ReplayCache: Send + Sync {
    /// Records `id` for `ttl` unless a live entry already exists.
    ///
    /// Returns `true` when the ID was newly recorded and `false` when it was
    /// already present, which indicates a replay.
    fn insert_if_absent(&self, id: &str, ttl: Duration) -> CacheResult<bool>;
}

/// Process-local replay cache.
#[derive(Debug)]
pub struct InMemoryReplayCache {
    entries: DashMap<String, Instant>,
    max_entries: Option<usize>,
    inserts: AtomicUsize,
}

impl InMemoryReplayCache {
    /// Creates a cache with no size limit.
    ///
    /// Expired entries are swept every [`PURGE_INTERVAL`] inserts.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: None,
            inserts: AtomicUsize::new(0),
        }
    }

    /// Creates a cache that refuses new entries past `max_entries` live IDs.
    ///
    /// # Errors
    ///
    /// Returns an error if `max_entries` is zero.
    pub fn with_max_entries(max_entries: usize) -> CacheResult<Self> {
        if max_entries == 0 {
            return Err(CacheError::Configuration(
                "max_entries must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            entries: DashMap::new(),
            max_entries: Some(max_entries),
            inserts: AtomicUsize::new(0),
        })
    }

    /// Drops expired entries and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, expires_at| *expires_at > now);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!(removed, "Purged expired replay entries");
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn ensure_capacity(&self) -> CacheResult<()> {
        let Some(max) = self.max_entries else {
            return Ok(());
        };
        if self.entries.len() >= max && self.purge_expired() == 0 && self.entries.len() >= max {
            warn!(max, "Replay cache is full");
            return Err(CacheError::CapacityExceeded(max));
        }
        Ok(())
    }
}

impl Default for InMemoryReplayCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayCache for InMemoryReplayCache {
    fn insert_if_absent(&self, id: &str, ttl: Duration) -> CacheResult<bool> {
        let seen = self.inserts.fetch_add(1, Ordering::Relaxed);
        if seen > 0 && seen % PURGE_INTERVAL == 0 {
            self.purge_expired();
        }
        self.ensure_capacity()?;

        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .ok_or_else(|| CacheError::Internal(format!("ttl out of range: {ttl:?}")))?;

        match self.entries.entry(id.to_string()) {
            Entry::Occupied(mut entry) => {
                if *entry.get() > now {
                    return Ok(false);
                }
                entry.insert(expires_at);
                Ok(true)
            }
            Entry::Vacant(entry) => {
                entry.insert(expires_at);
                Ok(true)
            }
        }
    }
}
