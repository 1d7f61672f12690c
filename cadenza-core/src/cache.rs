//! Bounded memo of matcher + composer results, keyed by pitch-class
//! fingerprint. Oldest insertion is evicted first.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

use cadenza_types::{Fingerprint, Key, TieredAnalysis};

use crate::config::DEFAULT_CACHE_CAPACITY;
use crate::harmony::MatchResult;

/// What one fingerprint resolved to, and the key it was composed under.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedHarmony {
    pub key: Key,
    pub result: MatchResult,
    pub analysis: Option<TieredAnalysis>,
}

#[derive(Debug, Default)]
struct Entries {
    values: HashMap<Fingerprint, Arc<CachedHarmony>>,
    order: VecDeque<Fingerprint>,
}

/// Shared across analysis calls. Lookups take the read lock; stores and
/// resets take the write lock.
#[derive(Debug)]
pub struct AnalysisCache {
    entries: RwLock<Entries>,
    capacity: usize,
}

impl AnalysisCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Never computes anything.
    pub fn lookup(&self, fingerprint: Fingerprint) -> Option<Arc<CachedHarmony>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries.values.get(&fingerprint).cloned()
    }

    /// Insert or replace. Replacing keeps the entry's original position in
    /// the eviction order.
    pub fn store(&self, fingerprint: Fingerprint, value: Arc<CachedHarmony>) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.values.insert(fingerprint, value).is_some() {
            return;
        }
        entries.order.push_back(fingerprint);
        if entries.order.len() > self.capacity {
            if let Some(oldest) = entries.order.pop_front() {
                entries.values.remove(&oldest);
                log::debug!(target: "cache", "evicted {}", oldest);
            }
        }
    }

    pub fn reset(&self) {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let dropped = entries.values.len();
        entries.values.clear();
        entries.order.clear();
        log::debug!(target: "cache", "reset, dropped {} entries", dropped);
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}
