/// Snapshot cache for read-mostly tool calls
///
/// Entries are keyed by habit and day and expire after a fixed TTL measured
/// against the engine clock. Every successful mutation invalidates the
/// habit's entries; the evaluator itself never reads from here.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{DayKey, HabitId, ProgressSnapshot};

#[derive(Debug, Clone)]
struct CacheEntry {
    snapshot: ProgressSnapshot,
    cached_at: DateTime<Utc>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        match (now - self.cached_at).to_std() {
            Ok(elapsed) => elapsed >= ttl,
            // clock went backwards
            Err(_) => true,
        }
    }
}

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<(HabitId, DayKey), CacheEntry>,
    stats: CacheStats,
}

#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    state: Mutex<CacheState>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, state: Mutex::new(CacheState::default()) }
    }

    /// A zero TTL disables caching
    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn state(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn get(&self, habit_id: &HabitId, day: DayKey, now: DateTime<Utc>) -> Option<ProgressSnapshot> {
        if !self.is_enabled() {
            return None;
        }
        let mut state = self.state();
        let key = (habit_id.clone(), day);

        let expired = state.entries.get(&key).map(|entry| entry.is_expired(now, self.ttl));
        let fresh = match expired {
            Some(false) => state.entries.get(&key).map(|entry| entry.snapshot.clone()),
            Some(true) => {
                state.entries.remove(&key);
                None
            }
            None => None,
        };

        match fresh {
            Some(snapshot) => {
                state.stats.hits += 1;
                Some(snapshot)
            }
            None => {
                state.stats.misses += 1;
                None
            }
        }
    }

    pub fn put(&self, snapshot: ProgressSnapshot, now: DateTime<Utc>) {
        if !self.is_enabled() {
            return;
        }
        let ttl = self.ttl;
        let mut state = self.state();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired(now, ttl));
        let pruned = before - state.entries.len();
        if pruned > 0 {
            tracing::debug!("Pruned {} expired snapshot(s)", pruned);
        }

        let key = (snapshot.habit_id.clone(), snapshot.day);
        state.entries.insert(key, CacheEntry { snapshot, cached_at: now });
    }

    /// Number of entries held, expired or not
    pub fn len(&self) -> usize {
        self.state().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached day for a habit
    pub fn invalidate(&self, habit_id: &HabitId) {
        let mut state = self.state();
        let before = state.entries.len();
        state.entries.retain(|(id, _), _| id != habit_id);
        let removed = before - state.entries.len();
        if removed > 0 {
            tracing::debug!("Invalidated {} cached snapshot(s) for {}", removed, habit_id);
        }
    }

    pub fn clear(&self) {
        self.state().entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        self.state().stats
    }
}
