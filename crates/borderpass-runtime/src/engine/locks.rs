use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::OwnedMutexGuard;

struct Entry {
    mutex: Arc<tokio::sync::Mutex<()>>,
    /// Holders plus waiters.
    users: usize,
}

type LockMap = HashMap<i64, Entry>;

/// One async mutex per process id.
///
/// Entries are created on first use and removed when the last holder or
/// waiter goes away, including a waiter whose future is dropped mid-wait.
#[derive(Clone, Default)]
pub struct ProcessLocks {
    inner: Arc<Mutex<LockMap>>,
}

impl ProcessLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to a process.
    pub async fn lock(&self, process_id: i64) -> ProcessGuard {
        let lease = Lease::acquire(&self.inner, process_id);
        let guard = lease.mutex.clone().lock_owned().await;
        ProcessGuard {
            _guard: guard,
            _lease: lease,
        }
    }

    /// Number of processes with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A claim on a map entry, held from the start of the wait until release.
struct Lease {
    mutex: Arc<tokio::sync::Mutex<()>>,
    process_id: i64,
    locks: Arc<Mutex<LockMap>>,
}

impl Lease {
    fn acquire(locks: &Arc<Mutex<LockMap>>, process_id: i64) -> Self {
        let mut map = locks.lock().unwrap_or_else(|e| e.into_inner());
        let entry = map.entry(process_id).or_insert_with(|| Entry {
            mutex: Arc::default(),
            users: 0,
        });
        entry.users += 1;
        Self {
            mutex: entry.mutex.clone(),
            process_id,
            locks: locks.clone(),
        }
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        let mut map = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(entry) = map.get_mut(&self.process_id) {
            entry.users = entry.users.saturating_sub(1);
            if entry.users == 0 {
                map.remove(&self.process_id);
            }
        }
    }
}

/// Held for the duration of a read-plan-commit sequence.
pub struct ProcessGuard {
    // Fields drop in order: unlock first, then leave the map.
    _guard: OwnedMutexGuard<()>,
    _lease: Lease,
}
