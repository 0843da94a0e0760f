//! Bounded LRU cache for categorization results
//!
//! Keys are normalized descriptions (trimmed, lowercased). The lock is only
//! held for map operations, never across an `.await`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::models::Category;

struct CacheEntry {
    category: Category,
    last_used: u64,
}

#[derive(Default)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    /// Monotonic use counter; higher = more recently used
    tick: u64,
}

impl CacheInner {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }
}

/// Description -> category cache with least-recently-used eviction
pub struct CategoryCache {
    capacity: usize,
    inner: Mutex<CacheInner>,
}

impl CategoryCache {
    /// A capacity of 0 disables caching
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    pub fn get(&self, description: &str) -> Option<Category> {
        let key = normalize(description);
        let mut inner = self.lock();
        let tick = inner.next_tick();
        let entry = inner.entries.get_mut(&key)?;
        entry.last_used = tick;
        Some(entry.category)
    }

    pub fn insert(&self, description: &str, category: Category) {
        if self.capacity == 0 {
            return;
        }
        let key = normalize(description);
        let mut inner = self.lock();
        let tick = inner.next_tick();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.capacity {
            let victim = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.last_used)
                .map(|(k, _)| k.clone());
            if let Some(victim) = victim {
                inner.entries.remove(&victim);
            }
        }

        inner.entries.insert(
            key,
            CacheEntry {
                category,
                last_used: tick,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // No operation leaves the map half-updated, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn normalize(description: &str) -> String {
    description.trim().to_lowercase()
}
