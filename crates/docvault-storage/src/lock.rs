//! Per-path lock table.
//!
//! At most one holder per path. Read and write locks exclude each other;
//! there is no shared mode. Waiters queue in FIFO order and are handed the
//! lock directly by the releasing holder.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use docvault_core::error::AppError;
use docvault_core::result::AppResult;

/// The kind of operation holding a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LockKind {
    /// A read of document content.
    Read,
    /// A store, update, or delete.
    Write,
}

/// The current holder of a path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockEntry {
    /// The locked path.
    pub path: PathBuf,
    /// Token identifying this holder.
    pub lock_id: Uuid,
    /// When the lock was granted.
    pub acquired_at: DateTime<Utc>,
    /// Operation kind.
    pub kind: LockKind,
}

impl LockEntry {
    fn granted(path: &Path, lock_id: Uuid, kind: LockKind) -> Self {
        Self {
            path: path.to_path_buf(),
            lock_id,
            acquired_at: Utc::now(),
            kind,
        }
    }
}

#[derive(Debug)]
struct Waiter {
    lock_id: Uuid,
    kind: LockKind,
    grant: oneshot::Sender<LockGuard>,
}

#[derive(Debug)]
struct Slot {
    holder: LockEntry,
    waiters: VecDeque<Waiter>,
}

#[derive(Debug, Default)]
struct Registry {
    slots: DashMap<PathBuf, Slot>,
}

impl Registry {
    fn release(self: &Arc<Self>, path: &Path, lock_id: Uuid) -> bool {
        let Entry::Occupied(mut occupied) = self.slots.entry(path.to_path_buf()) else {
            warn!(path = %path.display(), %lock_id, "Release of unlocked path ignored");
            return false;
        };

        if occupied.get().holder.lock_id != lock_id {
            warn!(
                path = %path.display(),
                %lock_id,
                holder = %occupied.get().holder.lock_id,
                "Stale lock release ignored"
            );
            return false;
        }

        while let Some(waiter) = occupied.get_mut().waiters.pop_front() {
            let entry = LockEntry::granted(path, waiter.lock_id, waiter.kind);
            occupied.get_mut().holder = entry.clone();
            match waiter.grant.send(LockGuard::armed(Arc::clone(self), entry)) {
                Ok(()) => {
                    debug!(path = %path.display(), lock_id = %waiter.lock_id, "Lock handed off");
                    return true;
                }
                // The waiter gave up; its guard must not re-enter this shard.
                Err(mut guard) => guard.disarm(),
            }
        }

        occupied.remove();
        debug!(path = %path.display(), %lock_id, "Lock released");
        true
    }
}

/// Exclusive access to one path, released on drop.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard {
    registry: Option<Arc<Registry>>,
    entry: LockEntry,
}

impl LockGuard {
    fn armed(registry: Arc<Registry>, entry: LockEntry) -> Self {
        Self {
            registry: Some(registry),
            entry,
        }
    }

    fn disarm(&mut self) {
        self.registry = None;
    }

    /// The token identifying this holder.
    pub fn lock_id(&self) -> Uuid {
        self.entry.lock_id
    }

    /// The lock entry this guard represents.
    pub fn entry(&self) -> &LockEntry {
        &self.entry
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.take() {
            registry.release(&self.entry.path, self.entry.lock_id);
        }
    }
}

/// Registry of per-path locks shared by every operation of one store.
#[derive(Debug, Clone)]
pub struct LockTable {
    registry: Arc<Registry>,
    enabled: bool,
}

impl LockTable {
    /// Create a lock table. When `enabled` is false every acquire succeeds
    /// immediately with the nil token.
    pub fn new(enabled: bool) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            enabled,
        }
    }

    /// Wait until `path` is free, then take it.
    pub async fn acquire(&self, path: &Path, kind: LockKind) -> AppResult<LockGuard> {
        if !self.enabled {
            let entry = LockEntry::granted(path, Uuid::nil(), kind);
            return Ok(LockGuard {
                registry: None,
                entry,
            });
        }

        let lock_id = Uuid::new_v4();
        let pending = match self.registry.slots.entry(path.to_path_buf()) {
            Entry::Vacant(vacant) => {
                let entry = LockEntry::granted(path, lock_id, kind);
                vacant.insert(Slot {
                    holder: entry.clone(),
                    waiters: VecDeque::new(),
                });
                debug!(path = %path.display(), %lock_id, ?kind, "Lock acquired");
                return Ok(LockGuard::armed(Arc::clone(&self.registry), entry));
            }
            Entry::Occupied(mut occupied) => {
                let (grant, pending) = oneshot::channel();
                occupied.get_mut().waiters.push_back(Waiter {
                    lock_id,
                    kind,
                    grant,
                });
                pending
            }
        };

        debug!(path = %path.display(), %lock_id, ?kind, "Waiting for lock");
        pending.await.map_err(|_| {
            AppError::internal(format!(
                "Lock queue for {} dropped a waiter",
                path.display()
            ))
        })
    }

    /// Release `path` if `lock_id` is its current holder.
    ///
    /// Returns whether anything was released. A stale token is ignored so a
    /// late release cannot evict a newer holder.
    pub fn release(&self, path: &Path, lock_id: Uuid) -> bool {
        if !self.enabled {
            return false;
        }
        self.registry.release(path, lock_id)
    }

    /// Whether `path` currently has a holder.
    pub fn is_locked(&self, path: &Path) -> bool {
        self.registry.slots.contains_key(path)
    }

    /// Number of operations queued behind the holder of `path`.
    pub fn waiting(&self, path: &Path) -> usize {
        self.registry
            .slots
            .get(path)
            .map(|slot| slot.waiters.len())
            .unwrap_or(0)
    }

    /// Snapshot of every current holder.
    pub fn held(&self) -> Vec<LockEntry> {
        self.registry
            .slots
            .iter()
            .map(|slot| slot.holder.clone())
            .collect()
    }
}
