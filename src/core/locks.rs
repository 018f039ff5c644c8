//! Location locks - who is counting which location right now.
//!
//! Locks live in this process's memory behind one mutex. Each operation runs
//! its staleness check and its mutation under the same guard. Expiry is lazy:
//! a stale lock is purged by the next operation that looks at it.
//!
//! This table is not shared between processes. Running several instances needs
//! an external coordinator; storing locks in the ledger sheet instead would
//! race on read-modify-write.

use crate::core::location::normalize_identifier;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Default lifetime of a lock.
pub const DEFAULT_LOCK_TIMEOUT_MINUTES: i64 = 30;

/// A claim of exclusive counting rights over one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lock {
    /// Normalized location identifier
    pub location: String,
    /// Staff member counting the location
    pub holder: String,
    /// When the claim was made
    pub acquired_at: DateTime<Utc>,
}

/// Outcome of [`LockRegistry::acquire`]. A conflict is a normal answer, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "lock", rename_all = "snake_case")]
pub enum AcquireOutcome {
    /// The caller now holds the lock
    Acquired(Lock),
    /// Someone else holds a live lock on the location
    Conflict(Lock),
}

impl AcquireOutcome {
    /// True when the caller now holds the lock.
    #[must_use]
    pub const fn is_acquired(&self) -> bool {
        matches!(self, Self::Acquired(_))
    }

    /// Holder to show as "locked by ..." when the acquire was refused.
    #[must_use]
    pub fn conflict_holder(&self) -> Option<&str> {
        match self {
            Self::Acquired(_) => None,
            Self::Conflict(lock) => Some(&lock.holder),
        }
    }
}

/// In-memory lock table keyed by location identifier.
#[derive(Debug)]
pub struct LockRegistry {
    timeout: TimeDelta,
    locks: Mutex<HashMap<String, Lock>>,
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new(TimeDelta::minutes(DEFAULT_LOCK_TIMEOUT_MINUTES))
    }
}

impl LockRegistry {
    /// Empty registry whose locks live for `timeout`.
    #[must_use]
    pub fn new(timeout: TimeDelta) -> Self {
        Self {
            timeout,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Lock lifetime.
    #[must_use]
    pub const fn timeout(&self) -> TimeDelta {
        self.timeout
    }

    /// Claims `location` for `holder`.
    ///
    /// Succeeds only when no live lock exists. Any live lock, including one
    /// already held by `holder`, yields [`AcquireOutcome::Conflict`], so a
    /// claim never outlives the timeout.
    pub fn acquire(&self, location: &str, holder: &str) -> AcquireOutcome {
        self.acquire_at(location, holder, Utc::now())
    }

    /// [`LockRegistry::acquire`] against an explicit clock.
    pub fn acquire_at(&self, location: &str, holder: &str, now: DateTime<Utc>) -> AcquireOutcome {
        let location = normalize_identifier(location);
        let mut table = self.table();

        if let Some(current) = self.live(&mut table, &location, now) {
            debug!("Location {location} is locked by {}", current.holder);
            return AcquireOutcome::Conflict(current);
        }

        let lock = Lock {
            location: location.clone(),
            holder: holder.to_string(),
            acquired_at: now,
        };
        table.insert(location, lock.clone());
        info!("Location {} locked by {}", lock.location, lock.holder);
        AcquireOutcome::Acquired(lock)
    }

    /// Drops the lock on `location`. Releasing an unlocked location is a no-op.
    ///
    /// Returns whether a lock was removed.
    pub fn release(&self, location: &str) -> bool {
        let location = normalize_identifier(location);
        let removed = self.table().remove(&location);
        if let Some(lock) = &removed {
            info!("Location {location} released by {}", lock.holder);
        }
        removed.is_some()
    }

    /// Current live lock on `location`, purging it if it has expired.
    #[must_use]
    pub fn check(&self, location: &str) -> Option<Lock> {
        self.check_at(location, Utc::now())
    }

    /// [`LockRegistry::check`] against an explicit clock.
    #[must_use]
    pub fn check_at(&self, location: &str, now: DateTime<Utc>) -> Option<Lock> {
        let location = normalize_identifier(location);
        let mut table = self.table();
        self.live(&mut table, &location, now)
    }

    /// All live locks by location. Stale entries are purged on the way.
    #[must_use]
    pub fn list_all(&self) -> BTreeMap<String, Lock> {
        self.list_all_at(Utc::now())
    }

    /// [`LockRegistry::list_all`] against an explicit clock.
    #[must_use]
    pub fn list_all_at(&self, now: DateTime<Utc>) -> BTreeMap<String, Lock> {
        let mut table = self.table();
        table.retain(|_, lock| !self.is_expired(lock, now));
        table
            .iter()
            .map(|(location, lock)| (location.clone(), lock.clone()))
            .collect()
    }

    fn live(
        &self,
        table: &mut HashMap<String, Lock>,
        location: &str,
        now: DateTime<Utc>,
    ) -> Option<Lock> {
        let lock = table.get(location)?;
        if self.is_expired(lock, now) {
            debug!("Lock on {location} held by {} expired", lock.holder);
            table.remove(location);
            return None;
        }
        Some(lock.clone())
    }

    fn is_expired(&self, lock: &Lock, now: DateTime<Utc>) -> bool {
        now - lock.acquired_at > self.timeout
    }

    fn table(&self) -> MutexGuard<'_, HashMap<String, Lock>> {
        // A panic while holding the guard cannot leave a half-written entry.
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
