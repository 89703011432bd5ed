//! Memoized resolution outcomes.
//!
//! Keys capture the operation name and the exact runtime type pattern of a
//! call, null positions included. Entries are never invalidated except by
//! [`ResolutionCache::clear`]; a module registered after a key was cached
//! does not change that key's outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::result::ResolutionOutcome;
use crate::config::CacheConfig;
use crate::types::{TypeId, TypeRef};

/// Runtime type of one position, or null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeMarker {
    Null,
    Type(TypeId),
}

impl TypeMarker {
    pub fn of(ty: Option<&TypeRef>) -> Self {
        match ty {
            Some(ty) => TypeMarker::Type(ty.id()),
            None => TypeMarker::Null,
        }
    }
}

/// Cache key for one resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolutionKey {
    pub operation: Arc<str>,
    pub subject: TypeMarker,
    pub args: Vec<TypeMarker>,
}

impl ResolutionKey {
    pub fn new(operation: &str, subject: Option<&TypeRef>, args: &[Option<&TypeRef>]) -> Self {
        Self {
            operation: Arc::from(operation),
            subject: TypeMarker::of(subject),
            args: args.iter().map(|a| TypeMarker::of(*a)).collect(),
        }
    }
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Read-through cache in front of the dispatcher.
pub struct ResolutionCache {
    entries: RwLock<Entries>,
    config: CacheConfig,
    hits: AtomicU64,
    misses: AtomicU64,
}

/// Stored outcomes plus the number of times they were cleared.
#[derive(Default)]
struct Entries {
    map: FxHashMap<ResolutionKey, ResolutionOutcome>,
    epoch: u64,
}

impl ResolutionCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached outcome for `key`, or compute it with `resolve` and
    /// store it.
    ///
    /// When concurrent misses on the same key compute different outcomes
    /// (a module registered in between), the first stored one is kept and
    /// returned to every caller. An outcome computed across a [`clear`] is
    /// returned but not stored.
    ///
    /// [`clear`]: ResolutionCache::clear
    pub fn get_or_resolve(
        &self,
        key: ResolutionKey,
        resolve: impl FnOnce() -> ResolutionOutcome,
    ) -> ResolutionOutcome {
        if !self.config.enabled {
            return resolve();
        }
        let epoch = {
            let entries = self.entries.read();
            if let Some(hit) = entries.map.get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return hit.clone();
            }
            entries.epoch
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        let outcome = resolve();
        self.store(key, outcome.clone(), Some(epoch)).unwrap_or(outcome)
    }

    pub fn get(&self, key: &ResolutionKey) -> Option<ResolutionOutcome> {
        let hit = self.entries.read().map.get(key).cloned();
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    /// Store an outcome unless the key is already present or the cache is
    /// full. Returns the outcome now held for `key`, `None` if full.
    pub fn insert(&self, key: ResolutionKey, outcome: ResolutionOutcome) -> Option<ResolutionOutcome> {
        self.store(key, outcome, None)
    }

    /// First write wins. With `epoch` set, nothing is stored once the cache
    /// has been cleared since that epoch was read.
    fn store(
        &self,
        key: ResolutionKey,
        outcome: ResolutionOutcome,
        epoch: Option<u64>,
    ) -> Option<ResolutionOutcome> {
        let mut entries = self.entries.write();
        if epoch.is_some_and(|e| e != entries.epoch) {
            return None;
        }
        if let Some(existing) = entries.map.get(&key) {
            return Some(existing.clone());
        }
        if entries.map.len() >= self.config.capacity {
            return None;
        }
        entries.map.insert(key, outcome.clone());
        Some(outcome)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&self) {
        let mut entries = self.entries.write();
        entries.map.clear();
        entries.epoch += 1;
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for ResolutionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::result::UnmatchedReason;
    use crate::types::TypeTable;

    fn unmatched() -> ResolutionOutcome {
        ResolutionOutcome::Unmatched(UnmatchedReason::NoCandidates)
    }

    #[test]
    fn test_null_pattern_is_part_of_key() {
        let table = TypeTable::new();
        let bar = table.declare_class("Bar", None, &[]).unwrap();

        let with_null = ResolutionKey::new("area", Some(&bar), &[None, Some(&bar)]);
        let without = ResolutionKey::new("area", Some(&bar), &[Some(&bar), Some(&bar)]);
        let swapped = ResolutionKey::new("area", Some(&bar), &[Some(&bar), None]);

        assert_ne!(with_null, without);
        assert_ne!(with_null, swapped);
        assert_eq!(with_null, ResolutionKey::new("area", Some(&bar), &[None, Some(&bar)]));
    }

    #[test]
    fn test_read_through() {
        let cache = ResolutionCache::new(CacheConfig::default());
        let key = ResolutionKey::new("area", None, &[]);
        let mut calls = 0;

        for _ in 0..3 {
            let outcome = cache.get_or_resolve(key.clone(), || {
                calls += 1;
                unmatched()
            });
            assert_eq!(outcome, unmatched());
        }

        assert_eq!(calls, 1);
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 2,
                misses: 1
            }
        );
    }

    #[test]
    fn test_disabled_cache_always_resolves() {
        let cache = ResolutionCache::new(CacheConfig {
            enabled: false,
            capacity: 16,
        });
        let key = ResolutionKey::new("area", None, &[]);
        let mut calls = 0;
        for _ in 0..2 {
            cache.get_or_resolve(key.clone(), || {
                calls += 1;
                unmatched()
            });
        }
        assert_eq!(calls, 2);
        assert!(cache.is_empty());
    }

    fn none_applicable() -> ResolutionOutcome {
        ResolutionOutcome::Unmatched(UnmatchedReason::NoneApplicable)
    }

    #[test]
    fn test_capacity_bound() {
        let cache = ResolutionCache::new(CacheConfig {
            enabled: true,
            capacity: 1,
        });
        let a = ResolutionKey::new("a", None, &[]);
        assert_eq!(cache.insert(a.clone(), unmatched()), Some(unmatched()));
        assert_eq!(cache.insert(ResolutionKey::new("b", None, &[]), unmatched()), None);
        assert_eq!(cache.insert(a.clone(), none_applicable()), Some(unmatched()));
        assert_eq!(cache.get(&a), Some(unmatched()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_first_stored_outcome_is_kept() {
        let cache = ResolutionCache::new(CacheConfig::default());
        let key = ResolutionKey::new("area", None, &[]);

        // A second caller misses and stores while the first is still resolving.
        let mut inner = None;
        let outer = cache.get_or_resolve(key.clone(), || {
            inner = Some(cache.get_or_resolve(key.clone(), none_applicable));
            unmatched()
        });

        assert_eq!(inner, Some(none_applicable()));
        assert_eq!(outer, none_applicable());
        assert_eq!(cache.get(&key), Some(none_applicable()));
    }

    #[test]
    fn test_outcome_resolved_across_clear_is_not_stored() {
        let cache = ResolutionCache::new(CacheConfig::default());
        let key = ResolutionKey::new("area", None, &[]);

        let outcome = cache.get_or_resolve(key.clone(), || {
            cache.clear();
            unmatched()
        });

        assert_eq!(outcome, unmatched());
        assert!(cache.is_empty());
        cache.get_or_resolve(key.clone(), unmatched);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_clear() {
        let cache = ResolutionCache::new(CacheConfig::default());
        cache.get_or_resolve(ResolutionKey::new("a", None, &[]), unmatched);
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
