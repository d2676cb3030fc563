//! Process-wide cache coordinator.
//!
//! Tracks the most authoritative status any peer cache has published for a
//! `(level, index, tag)` triple, so that warm-up fills do not double-populate
//! a line some other cache at the same level already holds. Peers at the
//! same named level share visibility; entries for different levels are
//! independent, and an absent entry is equivalent to [`Status::Invalid`].
//!
//! Reads across different levels never block each other. Writes to a single
//! level are serialized, but a write to one level never blocks a read of (or
//! write to) another — the manager is consulted only from warm-up paths, so
//! it is deliberately not on the critical tag-scan path.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock, RwLock};

use crate::line_state::Status;

#[derive(Clone, Copy, Debug)]
struct Entry {
    status: Status,
    level_instance: u32,
}

type LevelTable = Mutex<HashMap<(u64, u64), Entry>>;

fn levels() -> &'static RwLock<HashMap<String, LevelTable>> {
    static LEVELS: OnceLock<RwLock<HashMap<String, LevelTable>>> = OnceLock::new();
    LEVELS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The process-wide `(level, index, tag) -> status` coordinator.
///
/// This is a zero-sized handle; all state lives behind a process-global
/// [`OnceLock`], matching the source's singleton (`CACHE_MANAGER::GetInstance()`)
/// without requiring every [`crate::cache::Cache`] to thread a shared handle
/// through its constructor.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheManager;

impl CacheManager {
    /// Returns the strongest status known for `(index, tag)` at `level`, or
    /// [`Status::Invalid`] if no peer has published one.
    #[must_use]
    pub fn get_status(level: &str, index: u64, tag: u64) -> Status {
        let table = levels().read().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(level_table) = table.get(level) else {
            return Status::Invalid;
        };
        let entries = level_table
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries
            .get(&(index, tag))
            .map_or(Status::Invalid, |entry| entry.status)
    }

    /// Associates `status` with `(index, tag)` at `level`, recording
    /// `level_instance` as the publishing cache. Publishing
    /// [`Status::Invalid`] removes the entry (an absent entry and an
    /// `INVALID` entry are equivalent, so there is no reason to keep one
    /// around).
    pub fn set_status(level: &str, level_instance: u32, index: u64, tag: u64, status: Status) {
        if status == Status::Invalid {
            Self::clear(level, index, tag);
            return;
        }
        // Level tables are created lazily and never removed, so a read lock
        // suffices once the table exists; only the (rare) first write to a
        // brand-new level name needs the write lock.
        {
            let table = levels().read().unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(level_table) = table.get(level) {
                let mut entries = level_table
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                let _ = entries.insert((index, tag), Entry { status, level_instance });
                return;
            }
        }
        let mut table = levels().write().unwrap_or_else(std::sync::PoisonError::into_inner);
        let level_table = table.entry(level.to_owned()).or_insert_with(|| Mutex::new(HashMap::new()));
        let mut entries = level_table
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let _ = entries.insert((index, tag), Entry { status, level_instance });
    }

    /// Removes any entry for `(index, tag)` at `level`, regardless of which
    /// instance published it.
    pub fn clear(level: &str, index: u64, tag: u64) {
        let table = levels().read().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(level_table) = table.get(level) {
            let mut entries = level_table
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let _ = entries.remove(&(index, tag));
        }
    }
}
