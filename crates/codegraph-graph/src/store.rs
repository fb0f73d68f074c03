//! `InMemoryGraphStore`: the reference `GraphStore` implementation
//! (spec.md §4.2). Backs nodes and edges with `DashMap`s and keeps secondary
//! indices by identifier, `sourceFile`, `kind`/`type`, and `(from, to, type)`
//! for upsert dedup, following the teacher crate's `InMemoryEdgeStore`
//! copy-on-write index pattern generalized from UUID node ids to the string
//! `Identifier` type.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use codegraph_core::{
    Direction, Edge, EdgeFilter, GraphStore, Identifier, Node, NodeFilter, RecursiveQuery,
    RecursiveRow, Result,
};
use dashmap::DashMap;

fn insert_index<T: Clone + PartialEq>(map: &DashMap<String, Arc<Vec<T>>>, key: String, value: T) {
    if let Some(mut entry) = map.get_mut(&key) {
        let mut v: Vec<T> = entry.value().as_ref().clone();
        if !v.contains(&value) {
            v.push(value);
            *entry = Arc::new(v);
        }
        return;
    }
    map.insert(key, Arc::new(vec![value]));
}

fn remove_index<T: Clone + PartialEq>(map: &DashMap<String, Arc<Vec<T>>>, key: &str, value: &T) {
    if let Some(mut entry) = map.get_mut(key) {
        let v = entry.value();
        if v.len() == 1 && &v[0] == value {
            drop(entry);
            map.remove(key);
        } else {
            let mut nv = v.as_ref().clone();
            if let Some(pos) = nv.iter().position(|e| e == value) {
                nv.swap_remove(pos);
            }
            *entry = Arc::new(nv);
        }
    }
}

/// In-memory store with lock-free read concurrency using `DashMap` and
/// copy-on-write secondary indices, matching the teacher crate's
/// `InMemoryEdgeStore` design (spec.md §4.2 "Reference implementation").
#[derive(Default)]
pub struct InMemoryGraphStore {
    nodes: DashMap<String, Node>,
    edges: DashMap<(String, String, String), Edge>,

    by_source_file_nodes: DashMap<String, Arc<Vec<String>>>,
    by_kind: DashMap<String, Arc<Vec<String>>>,

    by_source_file_edges: DashMap<String, Arc<Vec<(String, String, String)>>>,
    by_type: DashMap<String, Arc<Vec<(String, String, String)>>>,
    by_from: DashMap<String, Arc<Vec<(String, String, String)>>>,
    by_to: DashMap<String, Arc<Vec<(String, String, String)>>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn node_source_file(node: &Node) -> Option<String> {
        node.location.as_ref().map(|l| l.source_path.clone())
    }

    fn index_node(&self, node: &Node) {
        let id = node.identifier.as_str().to_string();
        insert_index(&self.by_kind, node.kind.to_string(), id.clone());
        if let Some(file) = Self::node_source_file(node) {
            insert_index(&self.by_source_file_nodes, file, id);
        }
    }

    fn deindex_node(&self, node: &Node) {
        let id = node.identifier.as_str().to_string();
        remove_index(&self.by_kind, &node.kind.to_string(), &id);
        if let Some(file) = Self::node_source_file(node) {
            remove_index(&self.by_source_file_nodes, &file, &id);
        }
    }

    fn index_edge(&self, key: &(String, String, String), edge: &Edge) {
        insert_index(&self.by_source_file_edges, edge.source_file.clone(), key.clone());
        insert_index(&self.by_type, edge.edge_type.clone(), key.clone());
        insert_index(&self.by_from, edge.from.as_str().to_string(), key.clone());
        insert_index(&self.by_to, edge.to.as_str().to_string(), key.clone());
    }

    fn deindex_edge(&self, key: &(String, String, String), edge: &Edge) {
        remove_index(&self.by_source_file_edges, &edge.source_file, key);
        remove_index(&self.by_type, &edge.edge_type, key);
        remove_index(&self.by_from, edge.from.as_str(), key);
        remove_index(&self.by_to, edge.to.as_str(), key);
    }

    fn edges_from(&self, node: &str) -> Vec<Edge> {
        self.by_from
            .get(node)
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| self.edges.get(k).map(|e| e.value().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn edges_to(&self, node: &str) -> Vec<Edge> {
        self.by_to
            .get(node)
            .map(|keys| {
                keys.iter()
                    .filter_map(|k| self.edges.get(k).map(|e| e.value().clone()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn upsert_node(&self, node: Node) -> Result<Identifier> {
        let id = node.identifier.clone();
        let key = id.as_str().to_string();
        if let Some(mut existing) = self.nodes.get_mut(&key) {
            let old = existing.value().clone();
            existing.merge_from(&node);
            let merged = existing.value().clone();
            drop(existing);
            self.deindex_node(&old);
            self.index_node(&merged);
        } else {
            self.nodes.insert(key, node.clone());
            self.index_node(&node);
        }
        Ok(id)
    }

    async fn upsert_edge(&self, edge: Edge) -> Result<()> {
        let key = edge.upsert_key();
        if let Some(old) = self.edges.insert(key.clone(), edge.clone()) {
            self.deindex_edge(&key, &old);
        }
        self.index_edge(&key, &edge);
        Ok(())
    }

    async fn find_nodes(&self, filter: NodeFilter) -> Result<Vec<Node>> {
        let mut candidates: Vec<Node> = if let Some(kind) = &filter.kind {
            self.by_kind
                .get(kind)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| self.nodes.get(id).map(|n| n.value().clone()))
                        .collect()
                })
                .unwrap_or_default()
        } else if let Some(file) = &filter.source_file {
            self.by_source_file_nodes
                .get(file)
                .map(|ids| {
                    ids.iter()
                        .filter_map(|id| self.nodes.get(id).map(|n| n.value().clone()))
                        .collect()
                })
                .unwrap_or_default()
        } else {
            self.nodes.iter().map(|e| e.value().clone()).collect()
        };

        if let Some(file) = &filter.source_file {
            candidates.retain(|n| Self::node_source_file(n).as_deref() == Some(file.as_str()));
        }
        if let Some(language) = filter.language {
            candidates.retain(|n| n.language == language);
        }
        candidates.sort_by(|a, b| a.identifier.as_str().cmp(b.identifier.as_str()));

        let offset = filter.offset.unwrap_or(0);
        let candidates: Vec<Node> = candidates.into_iter().skip(offset).collect();
        Ok(match filter.limit {
            Some(limit) => candidates.into_iter().take(limit).collect(),
            None => candidates,
        })
    }

    async fn find_edges(&self, filter: EdgeFilter) -> Result<Vec<Edge>> {
        let mut candidates: Vec<Edge> = if let Some(file) = &filter.source_file {
            self.by_source_file_edges
                .get(file)
                .map(|keys| {
                    keys.iter()
                        .filter_map(|k| self.edges.get(k).map(|e| e.value().clone()))
                        .collect()
                })
                .unwrap_or_default()
        } else if let Some(from) = &filter.from {
            self.edges_from(from.as_str())
        } else {
            self.edges.iter().map(|e| e.value().clone()).collect()
        };

        if let Some(types) = &filter.types {
            candidates.retain(|e| types.contains(&e.edge_type));
        }
        if let Some(from) = &filter.from {
            candidates.retain(|e| e.from.as_str() == from.as_str());
        }
        if let Some(to) = &filter.to {
            candidates.retain(|e| e.to.as_str() == to.as_str());
        }
        Ok(candidates)
    }

    async fn neighbors(
        &self,
        node: &Identifier,
        direction: Direction,
        types: Option<&[String]>,
    ) -> Result<Vec<Node>> {
        let edges = match direction {
            Direction::Out => self.edges_from(node.as_str()),
            Direction::In => self.edges_to(node.as_str()),
        };
        let mut out = Vec::new();
        for edge in edges {
            if let Some(types) = types {
                if !types.contains(&edge.edge_type) {
                    continue;
                }
            }
            let other = match direction {
                Direction::Out => edge.to,
                Direction::In => edge.from,
            };
            if let Some(n) = self.nodes.get(other.as_str()) {
                out.push(n.value().clone());
            }
        }
        Ok(out)
    }

    async fn delete_node(&self, id: &Identifier) -> Result<()> {
        if let Some((_, node)) = self.nodes.remove(id.as_str()) {
            self.deindex_node(&node);
        }
        let incident: Vec<(String, String, String)> = self
            .edges
            .iter()
            .filter(|e| e.from.as_str() == id.as_str() || e.to.as_str() == id.as_str())
            .map(|e| e.key().clone())
            .collect();
        for key in incident {
            if let Some((_, edge)) = self.edges.remove(&key) {
                self.deindex_edge(&key, &edge);
            }
        }
        Ok(())
    }

    async fn delete_edges_where(&self, filter: EdgeFilter) -> Result<usize> {
        let matches = self.find_edges(filter).await?;
        let mut count = 0;
        for edge in matches {
            let key = edge.upsert_key();
            if let Some((_, removed)) = self.edges.remove(&key) {
                self.deindex_edge(&key, &removed);
                count += 1;
            }
        }
        Ok(count)
    }

    async fn shortest_path(
        &self,
        from: &Identifier,
        to: &Identifier,
        max_depth: usize,
    ) -> Result<Option<codegraph_core::graphstore::Path>> {
        if from.as_str() == to.as_str() {
            return Ok(Some(codegraph_core::graphstore::Path {
                nodes: vec![from.clone()],
            }));
        }
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<(String, Vec<String>)> = VecDeque::new();
        queue.push_back((from.as_str().to_string(), vec![from.as_str().to_string()]));
        visited.insert(from.as_str().to_string());

        let mut depth = 0;
        let mut frontier_size = queue.len();
        while !queue.is_empty() && depth < max_depth {
            let mut next_frontier_size = 0;
            for _ in 0..frontier_size {
                let (current, path) = queue.pop_front().unwrap();
                for edge in self.edges_from(&current) {
                    let next = edge.to.as_str().to_string();
                    if next == to.as_str() {
                        let mut full_path = path.clone();
                        full_path.push(next);
                        let nodes = full_path
                            .into_iter()
                            .map(Identifier::new)
                            .collect::<Result<Vec<_>>>()?;
                        return Ok(Some(codegraph_core::graphstore::Path { nodes }));
                    }
                    if visited.insert(next.clone()) {
                        let mut next_path = path.clone();
                        next_path.push(next.clone());
                        next_frontier_size += 1;
                        queue.push_back((next, next_path));
                    }
                }
            }
            frontier_size = next_frontier_size;
            depth += 1;
        }
        Ok(None)
    }

    async fn find_cycles(&self, types: Option<&[String]>, max_depth: usize) -> Result<Vec<Vec<Identifier>>> {
        let mut cycles = Vec::new();
        let all_nodes: Vec<String> = self.nodes.iter().map(|n| n.key().clone()).collect();

        for start in &all_nodes {
            let mut stack: Vec<(String, Vec<String>)> = vec![(start.clone(), vec![start.clone()])];
            while let Some((current, path)) = stack.pop() {
                if path.len() as u32 > max_depth as u32 {
                    continue;
                }
                for edge in self.edges_from(&current) {
                    if let Some(types) = types {
                        if !types.contains(&edge.edge_type) {
                            continue;
                        }
                    }
                    let next = edge.to.as_str().to_string();
                    if next == *start && path.len() > 1 {
                        let nodes = path
                            .iter()
                            .cloned()
                            .map(Identifier::new)
                            .collect::<Result<Vec<_>>>()?;
                        cycles.push(nodes);
                    } else if !path.contains(&next) {
                        let mut next_path = path.clone();
                        next_path.push(next.clone());
                        stack.push((next, next_path));
                    }
                }
            }
        }
        Ok(cycles)
    }

    async fn run_recursive(&self, query: RecursiveQuery) -> Result<Vec<RecursiveRow>> {
        match query {
            RecursiveQuery::TransitiveClosure {
                start,
                edge_type,
                max_depth,
            } => {
                let mut rows = Vec::new();
                let mut visited: HashSet<String> = HashSet::new();
                visited.insert(start.as_str().to_string());
                let mut frontier = vec![(start.as_str().to_string(), vec![start.clone()])];
                let mut depth = 1;
                while !frontier.is_empty() && depth <= max_depth {
                    let mut next_frontier = Vec::new();
                    for (current, path) in &frontier {
                        for edge in self.edges_from(current) {
                            if edge.edge_type != edge_type {
                                continue;
                            }
                            let next = edge.to.as_str().to_string();
                            if visited.contains(&next) {
                                continue;
                            }
                            visited.insert(next.clone());
                            let mut next_path = path.clone();
                            next_path.push(edge.to.clone());
                            rows.push(RecursiveRow {
                                node: edge.to.clone(),
                                depth,
                                path: next_path.clone(),
                            });
                            next_frontier.push((next, next_path));
                        }
                    }
                    frontier = next_frontier;
                    depth += 1;
                }
                Ok(rows)
            }
            RecursiveQuery::InheritableDerivation {
                start,
                parent_type,
                child_type,
                max_depth,
            } => {
                let mut rows = Vec::new();
                let mut visited: HashSet<String> = HashSet::new();
                visited.insert(start.as_str().to_string());
                let mut frontier = vec![(start.as_str().to_string(), vec![start.clone()])];
                let mut depth = 1;
                while !frontier.is_empty() && depth <= max_depth {
                    let mut next_frontier = Vec::new();
                    for (current, path) in &frontier {
                        for parent_edge in self.edges_from(current) {
                            if parent_edge.edge_type != parent_type {
                                continue;
                            }
                            let child = parent_edge.to.as_str().to_string();
                            for child_edge in self.edges_from(&child) {
                                if child_edge.edge_type != child_type {
                                    continue;
                                }
                                let mut derived_path = path.clone();
                                derived_path.push(parent_edge.to.clone());
                                derived_path.push(child_edge.to.clone());
                                rows.push(RecursiveRow {
                                    node: child_edge.to.clone(),
                                    depth,
                                    path: derived_path,
                                });
                            }
                            if visited.insert(child.clone()) {
                                let mut next_path = path.clone();
                                next_path.push(parent_edge.to.clone());
                                next_frontier.push((child, next_path));
                            }
                        }
                    }
                    frontier = next_frontier;
                    depth += 1;
                }
                Ok(rows)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codegraph_core::{build, IdentifierContext, Kind, Language};

    fn node(project: &str, path: &str, kind: Kind, name: &str) -> Node {
        let ctx = IdentifierContext::new(project, path);
        let id = build(kind.clone(), Some(name), &ctx).unwrap();
        Node::new(id, kind, name, Language::TypeScript)
    }

    fn file_node(project: &str, path: &str) -> Node {
        let ctx = IdentifierContext::new(project, path);
        let id = build(Kind::File, None, &ctx).unwrap();
        Node::new(id, Kind::File, path, Language::TypeScript)
    }

    #[tokio::test]
    async fn upsert_and_find_by_kind() {
        let store = InMemoryGraphStore::new();
        let n = node("proj", "src/a.ts", Kind::Class, "Widget");
        store.upsert_node(n.clone()).await.unwrap();

        let found = store
            .find_nodes(NodeFilter {
                kind: Some("Class".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].identifier, n.identifier);
    }

    #[tokio::test]
    async fn upsert_edge_dedups_on_from_to_type() {
        let store = InMemoryGraphStore::new();
        let a = node("proj", "src/a.ts", Kind::Class, "A");
        let b = node("proj", "src/a.ts", Kind::Class, "B");
        store.upsert_node(a.clone()).await.unwrap();
        store.upsert_node(b.clone()).await.unwrap();

        let e1 = Edge::new(a.identifier.clone(), b.identifier.clone(), "calls", "src/a.ts").with_weight(1.0);
        let e2 = Edge::new(a.identifier.clone(), b.identifier.clone(), "calls", "src/a.ts").with_weight(2.0);
        store.upsert_edge(e1).await.unwrap();
        store.upsert_edge(e2).await.unwrap();

        let edges = store.find_edges(EdgeFilter::default()).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].weight, 2.0);
    }

    #[tokio::test]
    async fn delete_edges_where_is_scoped_to_file_and_types() {
        let store = InMemoryGraphStore::new();
        let a = node("proj", "src/a.ts", Kind::Class, "A");
        let b = node("proj", "src/a.ts", Kind::Class, "B");
        store.upsert_node(a.clone()).await.unwrap();
        store.upsert_node(b.clone()).await.unwrap();

        let owned = Edge::new(a.identifier.clone(), b.identifier.clone(), "calls-method", "src/a.ts");
        let other = Edge::new(a.identifier.clone(), b.identifier.clone(), "uses", "src/a.ts");
        store.upsert_edge(owned).await.unwrap();
        store.upsert_edge(other).await.unwrap();

        let deleted = store
            .delete_edges_where(EdgeFilter {
                source_file: Some("src/a.ts".to_string()),
                types: Some(vec!["calls-method".to_string()]),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let remaining = store.find_edges(EdgeFilter::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].edge_type, "uses");
    }

    #[tokio::test]
    async fn shortest_path_bfs() {
        let store = InMemoryGraphStore::new();
        let a = node("proj", "src/a.ts", Kind::Class, "A");
        let b = node("proj", "src/a.ts", Kind::Class, "B");
        let c = node("proj", "src/a.ts", Kind::Class, "C");
        for n in [&a, &b, &c] {
            store.upsert_node(n.clone()).await.unwrap();
        }
        store
            .upsert_edge(Edge::new(a.identifier.clone(), b.identifier.clone(), "calls", "src/a.ts"))
            .await
            .unwrap();
        store
            .upsert_edge(Edge::new(b.identifier.clone(), c.identifier.clone(), "calls", "src/a.ts"))
            .await
            .unwrap();

        let path = store
            .shortest_path(&a.identifier, &c.identifier, 5)
            .await
            .unwrap()
            .expect("path should exist");
        assert_eq!(path.nodes.len(), 3);
    }

    #[tokio::test]
    async fn delete_node_cascades_to_incident_edges() {
        let store = InMemoryGraphStore::new();
        let a = node("proj", "src/a.ts", Kind::Class, "A");
        let b = node("proj", "src/a.ts", Kind::Class, "B");
        store.upsert_node(a.clone()).await.unwrap();
        store.upsert_node(b.clone()).await.unwrap();
        store
            .upsert_edge(Edge::new(a.identifier.clone(), b.identifier.clone(), "calls", "src/a.ts"))
            .await
            .unwrap();

        store.delete_node(&a.identifier).await.unwrap();
        let edges = store.find_edges(EdgeFilter::default()).await.unwrap();
        assert!(edges.is_empty());
    }

    #[tokio::test]
    async fn run_recursive_transitive_closure_respects_max_depth() {
        let store = InMemoryGraphStore::new();
        let file = file_node("proj", "src/a.ts");
        let a = node("proj", "src/a.ts", Kind::Class, "A");
        let b = node("proj", "src/a.ts", Kind::Class, "B");
        let c = node("proj", "src/a.ts", Kind::Class, "C");
        for n in [&file, &a, &b, &c] {
            store.upsert_node(n.clone()).await.unwrap();
        }
        store
            .upsert_edge(Edge::new(a.identifier.clone(), b.identifier.clone(), "depends_on", "src/a.ts"))
            .await
            .unwrap();
        store
            .upsert_edge(Edge::new(b.identifier.clone(), c.identifier.clone(), "depends_on", "src/a.ts"))
            .await
            .unwrap();

        let rows = store
            .run_recursive(RecursiveQuery::TransitiveClosure {
                start: a.identifier.clone(),
                edge_type: "depends_on".to_string(),
                max_depth: 1,
            })
            .await
            .unwrap();
        assert_eq!(rows.len(), 1, "max_depth=1 must not reach C");

        let rows = store
            .run_recursive(RecursiveQuery::TransitiveClosure {
                start: a.identifier.clone(),
                edge_type: "depends_on".to_string(),
                max_depth: 2,
            })
            .await
            .unwrap();
        assert_eq!(rows.len(), 2, "max_depth=2 reaches B and C");
        assert!(rows.iter().any(|r| r.node == c.identifier && r.depth == 2));
    }
}
