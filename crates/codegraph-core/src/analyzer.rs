//! The `Analyzer` trait and its shared context (spec.md §4.3).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::identifier::Language;
use crate::node::{Edge, Node};

/// A semantic tag attached to a node by an analyzer (§4.4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemanticTag {
    pub node_identifier: String,
    pub tag: String,
    /// Set when the tag was produced by a best-effort heuristic rather than
    /// a syntactic guarantee (e.g. `pure-function`, §4.4.3).
    pub heuristic: bool,
}

impl SemanticTag {
    pub fn new(node_identifier: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            node_identifier: node_identifier.into(),
            tag: tag.into(),
            heuristic: false,
        }
    }

    pub fn heuristic(mut self) -> Self {
        self.heuristic = true;
        self
    }
}

/// A diagnostic raised during analysis that is not a failure: an import that
/// could not be resolved to a file on disk (§4.4.1, §7 "User-visible
/// behavior").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingLink {
    pub file_path: String,
    pub import_specifier: String,
    pub attempted_paths: Vec<String>,
    pub expected_extensions: Vec<String>,
    pub suggestion: String,
}

/// What a single `analyze` call produces. The framework performs all writes
/// after a successful return; an analyzer never touches the store directly
/// (§4.3).
#[derive(Debug, Clone, Default)]
pub struct AnalyzerResult {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub semantic_tags: Vec<SemanticTag>,
    pub missing_links: Vec<MissingLink>,
}

impl AnalyzerResult {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Deduplicate nodes by identifier and edges by `(from, to, type)`, then
    /// sort deterministically by identifier, then edge type (§4.4.4).
    pub fn finalize(mut self) -> Self {
        let mut seen_nodes = std::collections::HashSet::new();
        self.nodes
            .retain(|n| seen_nodes.insert(n.identifier.as_str().to_string()));
        self.nodes
            .sort_by(|a, b| a.identifier.as_str().cmp(b.identifier.as_str()));

        let mut seen_edges = std::collections::HashSet::new();
        self.edges.retain(|e| seen_edges.insert(e.upsert_key()));
        self.edges.sort_by(|a, b| {
            a.from
                .as_str()
                .cmp(b.from.as_str())
                .then(a.edge_type.cmp(&b.edge_type))
                .then(a.to.as_str().cmp(b.to.as_str()))
        });

        self
    }
}

/// Grouping of everything the Type Registry currently knows, handed to
/// analyzers read-only via `AnalysisContext` (§4.3).
#[derive(Debug, Clone, Default)]
pub struct TypeCollection {
    pub node_kinds: Vec<String>,
    pub edge_types: Vec<String>,
    pub semantic_tags: Vec<String>,
}

/// Per-run, read-only context handed to every analyzer (§4.3).
#[derive(Clone)]
pub struct AnalysisContext {
    pub file_path: String,
    pub source_code: Arc<str>,
    pub language: Language,
    /// The parsed tree-sitter tree for `source_code`, boxed as `Any` so this
    /// crate does not depend on `tree-sitter` directly; the analyzer that
    /// declares `supportedLanguages` for a tree-sitter grammar downcasts it.
    pub parse_result: Option<Arc<dyn std::any::Any + Send + Sync>>,
    pub shared_data: Arc<dashmap::DashMap<String, Value>>,
    pub previous_results: Arc<HashMap<String, AnalyzerResult>>,
    pub type_collection: Arc<TypeCollection>,
    /// Cancellation signal for this file's run (§5 "Cancellation &
    /// timeouts"). Analyzers with distinct import/symbol/method phases must
    /// check `is_cancelled` between them and return early with whatever
    /// result has accumulated so far.
    pub cancelled: Arc<std::sync::atomic::AtomicBool>,
}

impl AnalysisContext {
    pub fn previous_result(&self, analyzer_id: &str) -> Option<&AnalyzerResult> {
        self.previous_results.get(analyzer_id)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(std::sync::atomic::Ordering::Relaxed)
    }
}

/// An analyzer's identity and declared dependencies, independent of any
/// single run (§4.3's `extends` list, §4.4's `OwnedEdgeTypes`).
pub trait AnalyzerDecl {
    fn id(&self) -> &str;

    /// Analyzer ids this one must run after.
    fn extends(&self) -> &[String] {
        &[]
    }

    /// Edge types this analyzer owns; cleanup isolation scopes
    /// `deleteEdgesWhere` to exactly this set before each re-run (§4.3).
    fn owned_edge_types(&self) -> &[String];

    /// Languages this analyzer has worked semantics for; other languages
    /// get an empty `AnalyzerResult` (§4.3 "Language gating").
    fn supported_languages(&self) -> &[Language];
}

#[async_trait]
pub trait Analyzer: AnalyzerDecl + Send + Sync {
    async fn analyze(&self, context: &AnalysisContext) -> Result<AnalyzerResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{build, IdentifierContext, Kind};

    fn node(symbol: &str) -> Node {
        let ctx = IdentifierContext::new("proj", "src/a.ts");
        let id = build(Kind::Class, Some(symbol), &ctx).unwrap();
        Node::new(id, Kind::Class, symbol, Language::TypeScript)
    }

    #[test]
    fn finalize_dedups_and_sorts_nodes() {
        let result = AnalyzerResult {
            nodes: vec![node("B"), node("A"), node("B")],
            ..Default::default()
        };
        let result = result.finalize();
        let names: Vec<_> = result.nodes.iter().map(|n| n.name.clone()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }
}
