//! Derivation cache (spec.md §4.5.4): a physical cache of derived-edge rows
//! keyed on `(startNode, type)`, with `eager | lazy | manual` recomputation
//! policy and type-scoped invalidation. Entry shape and TTL-free
//! access-tracking are grounded on the teacher crate's `cache.rs` `LruCache`.

pub use codegraph_core::CachePolicy;

use dashmap::DashMap;

/// One derived-edge row cached by the engine (spec.md §4.5.4 attributes:
/// `edgePath`, `depth`, plus the start/end/type that key it).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationEntry {
    pub start: String,
    pub end: String,
    pub edge_type: String,
    pub edge_path: Vec<String>,
    pub depth: usize,
}

struct CacheSlot {
    entries: Vec<DerivationEntry>,
    computed_at: u64,
}

/// Keyed on `(startNode, type)`. `computed_at` is a logical write-counter
/// rather than a wall-clock timestamp (this core never calls wall-clock
/// functions in derivation code, keeping it deterministic for replay).
pub struct DerivationCache {
    policy: CachePolicy,
    slots: DashMap<(String, String), CacheSlot>,
    write_counter: std::sync::atomic::AtomicU64,
    last_write_by_type: DashMap<String, u64>,
}

impl DerivationCache {
    pub fn new(policy: CachePolicy) -> Self {
        Self {
            policy,
            slots: DashMap::new(),
            write_counter: std::sync::atomic::AtomicU64::new(0),
            last_write_by_type: DashMap::new(),
        }
    }

    /// Returns cached entries for `(start, edge_type)` unless the policy
    /// requires a fresh computation: `eager` entries are always considered
    /// fresh (invalidation happens at write time), `lazy` entries are
    /// fresh only if no relevant write has happened since `computed_at`,
    /// and `manual` entries are fresh until explicitly invalidated.
    pub fn get(&self, start: &str, edge_type: &str) -> Option<Vec<DerivationEntry>> {
        let slot = self.slots.get(&(start.to_string(), edge_type.to_string()))?;
        match self.policy {
            CachePolicy::Eager | CachePolicy::Manual => Some(slot.entries.clone()),
            CachePolicy::Lazy => {
                let last_write = self
                    .last_write_by_type
                    .get(edge_type)
                    .map(|w| *w.value())
                    .unwrap_or(0);
                if last_write > slot.computed_at {
                    tracing::debug!(edge_type, start, "cache stale, recomputing");
                    None
                } else {
                    Some(slot.entries.clone())
                }
            }
        }
    }

    pub fn put(&self, start: &str, edge_type: &str, entries: Vec<DerivationEntry>) {
        let computed_at = self.write_counter.load(std::sync::atomic::Ordering::SeqCst);
        self.slots.insert(
            (start.to_string(), edge_type.to_string()),
            CacheSlot { entries, computed_at },
        );
    }

    /// Invalidates derived entries whose `edgePath` touches any edge of a
    /// type in `touched_types` (the written type or any of its
    /// descendants), per §4.5.4's invalidation rule. Under `eager`, this
    /// also evicts immediately; under `lazy`, it bumps the write counter so
    /// the next `get` observes staleness; under `manual`, only an explicit
    /// call to this method (e.g. from a caller-triggered revalidation) has
    /// any effect.
    pub fn invalidate_types(&self, touched_types: &[String]) {
        let next = self.write_counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        for t in touched_types {
            self.last_write_by_type.insert(t.clone(), next);
        }
        if matches!(self.policy, CachePolicy::Eager) {
            self.slots
                .retain(|(_, edge_type), _| !touched_types.contains(edge_type));
        }
    }

    pub fn manual_invalidate(&self, start: &str, edge_type: &str) {
        self.slots.remove(&(start.to_string(), edge_type.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> DerivationEntry {
        DerivationEntry {
            start: "a".into(),
            end: "b".into(),
            edge_type: "depends_on".into(),
            edge_path: vec!["a".into(), "b".into()],
            depth: 2,
        }
    }

    #[test]
    fn lazy_cache_serves_until_relevant_write() {
        let cache = DerivationCache::new(CachePolicy::Lazy);
        cache.put("a", "depends_on", vec![entry()]);
        assert!(cache.get("a", "depends_on").is_some());

        cache.invalidate_types(&["depends_on".to_string()]);
        assert!(cache.get("a", "depends_on").is_none());
    }

    #[test]
    fn eager_cache_evicts_immediately_on_invalidate() {
        let cache = DerivationCache::new(CachePolicy::Eager);
        cache.put("a", "depends_on", vec![entry()]);
        cache.invalidate_types(&["depends_on".to_string()]);
        assert!(cache.get("a", "depends_on").is_none());
    }

    #[test]
    fn manual_cache_survives_invalidate_types_but_not_explicit_invalidation() {
        let cache = DerivationCache::new(CachePolicy::Manual);
        cache.put("a", "depends_on", vec![entry()]);
        cache.invalidate_types(&["depends_on".to_string()]);
        assert!(cache.get("a", "depends_on").is_some());

        cache.manual_invalidate("a", "depends_on");
        assert!(cache.get("a", "depends_on").is_none());
    }
}
