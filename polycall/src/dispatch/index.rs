//! Append-only candidate table keyed by operation name and arity.
//!
//! ```text
//! ┌──────────────────────────┬──────────────────────────────────────┐
//! │ (operation, arity)       │ candidates                           │
//! ├──────────────────────────┼──────────────────────────────────────┤
//! │ ("area", 4)              │ [area(Bar, double, double, double),  │
//! │                          │  area(IElement2D, double, ...), ...] │
//! │ ("length", 1)            │ [length(Bar)]                        │
//! └──────────────────────────┴──────────────────────────────────────┘
//! ```
//!
//! Buckets are published copy-on-write: readers take an `Arc` snapshot and
//! never observe a half-built descriptor.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use super::candidate::CandidateDescriptor;

type Bucket = Arc<[Arc<CandidateDescriptor>]>;

/// Multimap from `(operation, arity)` to registered candidates.
#[derive(Default)]
pub struct CandidateIndex {
    buckets: RwLock<FxHashMap<Arc<str>, FxHashMap<usize, Bucket>>>,
}

impl CandidateIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a fully built descriptor.
    pub fn add(&self, descriptor: Arc<CandidateDescriptor>) {
        self.add_all(std::iter::once(descriptor));
    }

    /// Publish several descriptors under a single write lock.
    pub fn add_all(&self, descriptors: impl IntoIterator<Item = Arc<CandidateDescriptor>>) {
        let mut grouped: FxHashMap<(Arc<str>, usize), Vec<Arc<CandidateDescriptor>>> =
            FxHashMap::default();
        for d in descriptors {
            grouped
                .entry((d.operation_key().clone(), d.arity()))
                .or_default()
                .push(d);
        }
        if grouped.is_empty() {
            return;
        }

        let mut buckets = self.buckets.write();
        for ((operation, arity), added) in grouped {
            let bucket = buckets
                .entry(operation)
                .or_default()
                .entry(arity)
                .or_insert_with(|| Arc::from(Vec::new()));
            let mut next: Vec<Arc<CandidateDescriptor>> = Vec::with_capacity(bucket.len() + added.len());
            next.extend(bucket.iter().cloned());
            next.extend(added);
            *bucket = Arc::from(next);
        }
    }

    /// Snapshot of the candidates for `operation` with exactly `arity`
    /// positions. Order carries no meaning.
    pub fn candidates_for(&self, operation: &str, arity: usize) -> Bucket {
        self.buckets
            .read()
            .get(operation)
            .and_then(|by_arity| by_arity.get(&arity))
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    /// Every candidate named `operation`, across all arities.
    pub fn candidates_named(&self, operation: &str) -> Vec<Arc<CandidateDescriptor>> {
        let buckets = self.buckets.read();
        let mut out: Vec<_> = buckets
            .get(operation)
            .into_iter()
            .flat_map(|by_arity| by_arity.values())
            .flat_map(|bucket| bucket.iter().cloned())
            .collect();
        out.sort_by_key(|c| c.arity());
        out
    }

    /// Total number of registered candidates.
    pub fn len(&self) -> usize {
        self.buckets
            .read()
            .values()
            .flat_map(|by_arity| by_arity.values())
            .map(|b| b.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every candidate. Only used by [`crate::Engine::reset`].
    pub(crate) fn clear(&self) {
        self.buckets.write().clear();
    }
}

impl std::fmt::Debug for CandidateIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateIndex")
            .field("candidates", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TypeTable;
    use crate::value::Value;

    fn candidate(table: &TypeTable, op: &str, params: usize) -> Arc<CandidateDescriptor> {
        let object = table.object();
        Arc::new(
            CandidateDescriptor::builder(op, object.clone())
                .params(std::iter::repeat(object).take(params))
                .build(|s: &Value, _: &[Option<Value>]| Ok(s.clone())),
        )
    }

    #[test]
    fn test_lookup_by_name_and_arity() {
        let table = TypeTable::new();
        let index = CandidateIndex::new();
        index.add(candidate(&table, "area", 0));
        index.add(candidate(&table, "area", 2));
        index.add(candidate(&table, "area", 2));
        index.add(candidate(&table, "length", 0));

        assert_eq!(index.candidates_for("area", 1).len(), 1);
        assert_eq!(index.candidates_for("area", 3).len(), 2);
        assert_eq!(index.candidates_for("area", 2).len(), 0);
        assert_eq!(index.candidates_for("volume", 1).len(), 0);
        assert_eq!(index.candidates_named("area").len(), 3);
        assert_eq!(index.len(), 4);
    }

    #[test]
    fn test_snapshot_is_stable_across_additions() {
        let table = TypeTable::new();
        let index = CandidateIndex::new();
        index.add(candidate(&table, "area", 0));

        let before = index.candidates_for("area", 1);
        index.add(candidate(&table, "area", 0));

        assert_eq!(before.len(), 1);
        assert_eq!(index.candidates_for("area", 1).len(), 2);
    }

    #[test]
    fn test_clear() {
        let table = TypeTable::new();
        let index = CandidateIndex::new();
        index.add_all([candidate(&table, "a", 0), candidate(&table, "b", 1)]);
        assert_eq!(index.len(), 2);
        index.clear();
        assert!(index.is_empty());
    }
}
