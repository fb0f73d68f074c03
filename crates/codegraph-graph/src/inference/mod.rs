//! The Inference Engine (spec.md §4.5): hierarchical read-time expansion,
//! transitive closure, inheritable derivation, the derivation cache, and
//! conflict resolution. Reads and writes happen only through the
//! `GraphStore` interface, per the design note in spec.md §9 ("a portable
//! core should express inference as a traversal over the `GraphStore`
//! interface") — grounded on the teacher crate's `cache.rs` entry/TTL shape
//! and `traversal.rs`'s depth-bounded, visited-set traversal.

mod cache;

pub use cache::{CachePolicy, DerivationCache, DerivationEntry};

use std::sync::Arc;

use codegraph_core::{
    CachePolicy as ConfigCachePolicy, ConflictPolicy, Edge, EdgeFilter, GraphStore, Identifier,
    RecursiveQuery, Result, TypeRegistry,
};
use tracing::debug;

/// Result of `validate()` (spec.md §4.5.6).
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub validated_count: usize,
}

/// Drives inference over a `GraphStore`, backed by a `TypeRegistry` and a
/// `DerivationCache`.
pub struct InferenceEngine<S: GraphStore> {
    store: Arc<S>,
    registry: Arc<TypeRegistry>,
    cache: DerivationCache,
    max_path_length: usize,
    max_inheritance_depth: Option<usize>,
}

impl<S: GraphStore> InferenceEngine<S> {
    pub fn new(
        store: Arc<S>,
        registry: Arc<TypeRegistry>,
        policy: ConfigCachePolicy,
        max_path_length: usize,
        max_inheritance_depth: Option<usize>,
    ) -> Self {
        Self {
            store,
            registry,
            cache: DerivationCache::new(policy),
            max_path_length,
            max_inheritance_depth,
        }
    }

    /// §4.5.1: union `edge_type` with its descendants and return edges of
    /// any of those types, relabeled to the requested parent type.
    pub async fn hierarchical_query(&self, edge_type: &str) -> Result<Vec<Edge>> {
        let mut types = vec![edge_type.to_string()];
        types.extend(self.registry.descendants(edge_type));
        let mut edges = self.store.find_edges(EdgeFilter {
            types: Some(types),
            ..Default::default()
        }).await?;
        for edge in &mut edges {
            edge.edge_type = edge_type.to_string();
        }
        Ok(edges)
    }

    /// §4.5.2: reachability closure from `start` along `edge_type`, only
    /// valid when the type is flagged `isTransitive`. Result edges have
    /// `depth > 1` (the direct edge is excluded — it already exists).
    pub async fn transitive_closure(&self, start: &Identifier, edge_type: &str) -> Result<Vec<Edge>> {
        let def = self.registry.get(edge_type);
        if !def.map(|d| d.is_transitive).unwrap_or(false) {
            return Ok(Vec::new());
        }

        if let Some(cached) = self.cache.get(start.as_str(), edge_type) {
            debug!(edge_type, node = %start, "derivation cache hit");
            return self.rows_to_edges(start, edge_type, cached);
        }

        let rows = self
            .store
            .run_recursive(RecursiveQuery::TransitiveClosure {
                start: start.clone(),
                edge_type: edge_type.to_string(),
                max_depth: self.max_path_length,
            })
            .await?;

        let entries: Vec<DerivationEntry> = rows
            .iter()
            .filter(|r| r.depth > 1)
            .map(|r| DerivationEntry {
                start: start.as_str().to_string(),
                end: r.node.as_str().to_string(),
                edge_type: edge_type.to_string(),
                edge_path: r.path.iter().map(|p| p.as_str().to_string()).collect(),
                depth: r.depth,
            })
            .collect();
        self.cache.put(start.as_str(), edge_type, entries.clone());
        self.rows_to_edges(start, edge_type, entries)
    }

    fn rows_to_edges(&self, start: &Identifier, edge_type: &str, entries: Vec<DerivationEntry>) -> Result<Vec<Edge>> {
        entries
            .into_iter()
            .map(|entry| -> Result<Edge> {
                let to = Identifier::new(entry.end)?;
                let mut edge = Edge::new(start.clone(), to, edge_type.to_string(), "<derived>").derived();
                edge.attributes.set_extra("edgePath", entry.edge_path);
                edge.attributes.set_extra("depth", entry.depth as u64);
                Ok(edge)
            })
            .collect()
    }

    /// §4.5.3: if `parent contains child` and `child defines target`, derive
    /// `parent defines target`, extended to any depth up to
    /// `maxInheritanceDepth`.
    pub async fn inheritable_derivation(
        &self,
        start: &Identifier,
        parent_type: &str,
        child_type: &str,
    ) -> Result<Vec<Edge>> {
        let def = self.registry.get(parent_type);
        if !def.map(|d| d.is_inheritable).unwrap_or(false) {
            return Ok(Vec::new());
        }
        let max_depth = self.max_inheritance_depth.unwrap_or(usize::MAX);

        let rows = self
            .store
            .run_recursive(RecursiveQuery::InheritableDerivation {
                start: start.clone(),
                parent_type: parent_type.to_string(),
                child_type: child_type.to_string(),
                max_depth: max_depth.min(self.max_path_length.max(1) * 64),
            })
            .await?;

        rows.into_iter()
            .map(|row| -> Result<Edge> {
                let mut edge = Edge::new(start.clone(), row.node, child_type.to_string(), "<derived>").derived();
                let path: Vec<String> = row.path.iter().map(|p| p.as_str().to_string()).collect();
                edge.attributes.set_extra("edgePath", path);
                edge.attributes.set_extra("depth", row.depth as u64);
                Ok(edge)
            })
            .collect()
    }

    /// §4.5.5: when multiple derived edges target the same `(from, to)`
    /// pair with the requested type, resolve per the type's
    /// `conflictPolicy`.
    pub fn resolve_conflicts(&self, edge_type: &str, mut candidates: Vec<Edge>) -> Vec<Edge> {
        let Some(def) = self.registry.get(edge_type) else {
            return candidates;
        };
        match def.conflict_policy {
            ConflictPolicy::PriorityBased => {
                candidates.sort_by_key(|_| std::cmp::Reverse(def.priority));
                dedup_by_pair(candidates, |_, keep| keep)
            }
            ConflictPolicy::MergeAttributes => {
                let mut merged: Vec<Edge> = Vec::new();
                'outer: for edge in candidates {
                    for existing in merged.iter_mut() {
                        if existing.from.as_str() == edge.from.as_str() && existing.to.as_str() == edge.to.as_str() {
                            existing.attributes.merge(&edge.attributes);
                            continue 'outer;
                        }
                    }
                    merged.push(edge);
                }
                merged
            }
            ConflictPolicy::KeepExisting => dedup_by_pair(candidates, |existing, _incoming| existing),
            ConflictPolicy::ReplaceNew => dedup_by_pair(candidates, |_existing, incoming| incoming),
        }
    }

    /// §4.5.6: forest-shape, no runaway transitive cycles under current
    /// depth bounds, and every derived edge's `edgePath` resolves to extant
    /// direct edges.
    pub async fn validate(&self) -> Result<ValidationReport> {
        let mut errors = Vec::new();
        let warnings = Vec::new();
        let hierarchy = self.registry.validate_hierarchy();
        if !hierarchy.ok {
            errors.extend(hierarchy.errors);
        }

        let derived = self
            .store
            .find_edges(EdgeFilter::default())
            .await?
            .into_iter()
            .filter(|e| e.is_derived)
            .collect::<Vec<_>>();

        let mut validated_count = 0;
        for edge in &derived {
            let Some(path_value) = edge.attributes.get_extra("edgePath") else {
                errors.push(format!(
                    "derived edge {}->{} ({}) has no edgePath",
                    edge.from, edge.to, edge.edge_type
                ));
                continue;
            };
            let path: Vec<String> = match serde_json::from_value(path_value.clone()) {
                Ok(p) => p,
                Err(_) => {
                    errors.push(format!("derived edge {}->{} has malformed edgePath", edge.from, edge.to));
                    continue;
                }
            };
            for window in path.windows(2) {
                let (from, to) = (&window[0], &window[1]);
                let from_id = match Identifier::new(from.clone()) {
                    Ok(id) => id,
                    Err(_) => {
                        errors.push(format!("edgePath segment is not a valid identifier: {from}"));
                        continue;
                    }
                };
                let to_id = match Identifier::new(to.clone()) {
                    Ok(id) => id,
                    Err(_) => {
                        errors.push(format!("edgePath segment is not a valid identifier: {to}"));
                        continue;
                    }
                };
                let direct = self
                    .store
                    .find_edges(EdgeFilter {
                        from: Some(from_id),
                        to: Some(to_id),
                        ..Default::default()
                    })
                    .await?;
                if direct.iter().all(|e| e.is_derived) {
                    errors.push(format!(
                        "derivation path for {}->{} does not resolve to a direct edge between {from} and {to}",
                        edge.from, edge.to
                    ));
                }
            }
            validated_count += 1;
        }

        Ok(ValidationReport {
            valid: errors.is_empty(),
            errors,
            warnings,
            validated_count,
        })
    }

    /// Invalidate cached derivations touched by a write to `edge_type` (or
    /// any of its descendants), per §4.5.4's invalidation rule.
    pub fn invalidate_for_write(&self, edge_type: &str) {
        let mut touched = vec![edge_type.to_string()];
        touched.extend(self.registry.descendants(edge_type));
        self.cache.invalidate_types(&touched);
    }
}

fn dedup_by_pair(edges: Vec<Edge>, pick: impl Fn(Edge, Edge) -> Edge) -> Vec<Edge> {
    let mut out: Vec<Edge> = Vec::new();
    'outer: for edge in edges {
        for slot in out.iter_mut() {
            if slot.from.as_str() == edge.from.as_str() && slot.to.as_str() == edge.to.as_str() {
                let existing = slot.clone();
                *slot = pick(existing, edge);
                continue 'outer;
            }
        }
        out.push(edge);
    }
    out
}
