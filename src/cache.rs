//! Single-value cache with a time-to-live.
//!
//! The component that mutates the underlying data owns the cache and calls
//! [`TtlCache::invalidate`] after every mutation.

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::trace;

#[derive(Debug)]
struct CacheEntry<T> {
    value: T,
    inserted_at: DateTime<Utc>,
}

/// Holds one value for at most `ttl`.
#[derive(Debug)]
pub struct TtlCache<T> {
    ttl: TimeDelta,
    slot: RwLock<Option<CacheEntry<T>>>,
}

impl<T: Clone> TtlCache<T> {
    /// Empty cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: TimeDelta) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
        }
    }

    /// Cached value if one was stored less than `ttl` ago.
    pub async fn get(&self) -> Option<T> {
        self.get_at(Utc::now()).await
    }

    /// [`TtlCache::get`] against an explicit clock.
    pub async fn get_at(&self, now: DateTime<Utc>) -> Option<T> {
        let slot = self.slot.read().await;
        match slot.as_ref() {
            Some(entry) if now - entry.inserted_at <= self.ttl => {
                trace!("Cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                trace!("Cache entry expired");
                None
            }
            None => None,
        }
    }

    /// Stores `value`, replacing any previous one.
    pub async fn put(&self, value: T) {
        self.put_at(value, Utc::now()).await;
    }

    /// [`TtlCache::put`] against an explicit clock.
    pub async fn put_at(&self, value: T, now: DateTime<Utc>) {
        let mut slot = self.slot.write().await;
        *slot = Some(CacheEntry {
            value,
            inserted_at: now,
        });
    }

    /// Forgets the cached value.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        if slot.take().is_some() {
            trace!("Cache invalidated");
        }
    }
}
