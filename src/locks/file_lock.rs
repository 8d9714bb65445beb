//! # Exclusive File Locks
//!
//! At most one unexpired lock exists per path. An expired lock is inert:
//! lookups ignore it and a new acquisition by any owner reclaims it
//! silently. Locks are persisted through [`FileLockRepository`]; the
//! in-memory implementation here is the reference for external stores.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::actor::Actor;

use super::errors::{LockError, LockResult};

/// One persisted exclusive lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLock {
    /// Canonical virtual path; unique key
    pub path: String,
    pub locked_by: Uuid,
    pub owner_name: String,
    pub locked_at: DateTime<Utc>,
    /// None = held until released
    pub expires_at: Option<DateTime<Utc>>,
}

impl FileLock {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Lock persistence seam.
pub trait FileLockRepository: Send + Sync {
    /// Insert or replace the lock for its path.
    fn upsert(&self, lock: &FileLock) -> LockResult<()>;

    /// Fetch the lock for a path, expired or not.
    fn find(&self, path: &str) -> LockResult<Option<FileLock>>;

    /// Remove the lock for a path.
    fn remove(&self, path: &str) -> LockResult<()>;

    /// Drop every expired lock; returns how many were removed.
    fn remove_expired(&self) -> LockResult<usize>;
}

/// In-memory lock table.
#[derive(Debug, Default)]
pub struct InMemoryFileLockRepository {
    locks: RwLock<HashMap<String, FileLock>>,
}

impl InMemoryFileLockRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileLockRepository for InMemoryFileLockRepository {
    fn upsert(&self, lock: &FileLock) -> LockResult<()> {
        let mut locks = self
            .locks
            .write()
            .map_err(|_| LockError::Storage("Lock poisoned".into()))?;
        locks.insert(lock.path.clone(), lock.clone());
        Ok(())
    }

    fn find(&self, path: &str) -> LockResult<Option<FileLock>> {
        let locks = self
            .locks
            .read()
            .map_err(|_| LockError::Storage("Lock poisoned".into()))?;
        Ok(locks.get(path).cloned())
    }

    fn remove(&self, path: &str) -> LockResult<()> {
        let mut locks = self
            .locks
            .write()
            .map_err(|_| LockError::Storage("Lock poisoned".into()))?;
        locks.remove(path);
        Ok(())
    }

    fn remove_expired(&self) -> LockResult<usize> {
        let mut locks = self
            .locks
            .write()
            .map_err(|_| LockError::Storage("Lock poisoned".into()))?;
        let now = Utc::now();
        let before = locks.len();
        locks.retain(|_, lock| !lock.is_expired_at(now));
        Ok(before - locks.len())
    }
}

/// Acquire/release semantics over a lock repository.
pub struct LockService<R: FileLockRepository> {
    repository: R,
}

impl<R: FileLockRepository> LockService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Acquire or refresh the lock on a path.
    ///
    /// Fails with [`LockError::Held`] if another owner holds an unexpired
    /// lock. An expired lock is reclaimed silently; the same owner
    /// re-acquiring refreshes the expiry.
    pub fn acquire(
        &self,
        path: &str,
        actor: &Actor,
        ttl: Option<Duration>,
    ) -> LockResult<FileLock> {
        if let Some(existing) = self.repository.find(path)? {
            if !existing.is_expired() && existing.locked_by != actor.id {
                return Err(LockError::Held {
                    owner_name: existing.owner_name,
                });
            }
        }

        let now = Utc::now();
        let lock = FileLock {
            path: path.to_string(),
            locked_by: actor.id,
            owner_name: actor.username.clone(),
            locked_at: now,
            expires_at: ttl.map(|ttl| now + ttl),
        };
        self.repository.upsert(&lock)?;
        Ok(lock)
    }

    /// Release a lock held by the caller.
    pub fn release(&self, path: &str, actor: &Actor) -> LockResult<()> {
        match self.repository.find(path)? {
            Some(lock) if lock.locked_by == actor.id => self.repository.remove(path),
            Some(_) | None => Err(LockError::NotHeld),
        }
    }

    /// Current unexpired holder of a path, if any.
    pub fn holder(&self, path: &str) -> LockResult<Option<FileLock>> {
        Ok(self.repository.find(path)?.filter(|lock| !lock.is_expired()))
    }
}
