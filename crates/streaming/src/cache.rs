use std::collections::BTreeMap;

use foundation::time::Time;

use crate::protocol::StatsData;

#[derive(Debug, Clone, PartialEq)]
struct CacheEntry {
    /// `None` records a successful response that carried no data.
    data: Option<StatsData>,
    stored_at: Time,
}

/// Per-type-code stats cache with a fixed time-to-live.
///
/// Only successful responses are stored; failures never enter the cache.
#[derive(Debug, Clone)]
pub struct StatsCache {
    ttl_s: f64,
    entries: BTreeMap<String, CacheEntry>,
}

impl StatsCache {
    pub fn new(ttl_s: f64) -> Self {
        Self {
            ttl_s: ttl_s.max(0.0),
            entries: BTreeMap::new(),
        }
    }

    pub fn ttl_s(&self) -> f64 {
        self.ttl_s
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cached value if younger than the TTL at `now`.
    pub fn fresh(&self, type_code: &str, now: Time) -> Option<Option<StatsData>> {
        let entry = self.entries.get(type_code)?;
        if now.since(entry.stored_at) < self.ttl_s {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    pub fn insert(&mut self, type_code: impl Into<String>, data: Option<StatsData>, now: Time) {
        self.entries.insert(
            type_code.into(),
            CacheEntry {
                data,
                stored_at: now,
            },
        );
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&mut self, now: Time) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl_s;
        self.entries.retain(|_, e| now.since(e.stored_at) < ttl);
        before - self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
