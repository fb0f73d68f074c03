//! The `GraphStore` contract (spec.md §4.2). Analyzers and the Inference
//! Engine touch the graph only through this trait; `codegraph-graph` ships
//! the in-memory reference implementation.

use async_trait::async_trait;

use crate::error::Result;
use crate::identifier::Identifier;
use crate::node::{Edge, Node};

/// Traversal direction for `neighbors`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Out,
    In,
}

/// Filter for `findNodes` (spec.md §4.2).
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    pub kind: Option<String>,
    pub source_file: Option<String>,
    pub language: Option<crate::identifier::Language>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Filter for `findEdges` and `deleteEdgesWhere` (spec.md §4.2, §4.3).
#[derive(Debug, Clone, Default)]
pub struct EdgeFilter {
    pub source_file: Option<String>,
    pub types: Option<Vec<String>>,
    pub from: Option<Identifier>,
    pub to: Option<Identifier>,
}

/// A path returned by `shortestPath`: nodes in order, start to end inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub nodes: Vec<Identifier>,
}

/// A recursive-traversal request for `runRecursive` (spec.md §4.2, §4.5).
/// The in-memory store walks these in-process rather than compiling them to
/// a query language, carrying an explicit `visited` set for cycle-avoidance.
#[derive(Debug, Clone)]
pub enum RecursiveQuery {
    /// Reachability closure along edges of `edge_type` (and its registered
    /// descendants) starting from `start`, for transitive edge types (§4.5
    /// "Transitive closure").
    TransitiveClosure {
        start: Identifier,
        edge_type: String,
        max_depth: usize,
    },
    /// Inheritable derivation: extend `start` along `parent_type` edges up to
    /// `max_depth`, then at each step check for a `child_type` edge to derive
    /// from (§4.5 "Inheritable derivation").
    InheritableDerivation {
        start: Identifier,
        parent_type: String,
        child_type: String,
        max_depth: usize,
    },
}

/// One row of a `runRecursive` result: the reached node, its depth from the
/// query's start node, and the path taken to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveRow {
    pub node: Identifier,
    pub depth: usize,
    pub path: Vec<Identifier>,
}

/// The store contract (spec.md §4.2). Transactional per operation; the core
/// does not require cross-operation transactions.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Upsert keyed on identifier; merges attributes and updates position
    /// when the node already exists (spec.md §3.5).
    async fn upsert_node(&self, node: Node) -> Result<Identifier>;

    /// Upsert keyed on `(from, to, type)`.
    async fn upsert_edge(&self, edge: Edge) -> Result<()>;

    async fn find_nodes(&self, filter: NodeFilter) -> Result<Vec<Node>>;

    async fn find_edges(&self, filter: EdgeFilter) -> Result<Vec<Edge>>;

    async fn neighbors(
        &self,
        node: &Identifier,
        direction: Direction,
        types: Option<&[String]>,
    ) -> Result<Vec<Node>>;

    /// Cascades to incident edges (spec.md §3.4 invariant 2).
    async fn delete_node(&self, id: &Identifier) -> Result<()>;

    /// The only path by which the analyzer framework removes direct edges;
    /// MUST match exactly the rows inserted by the corresponding analyzer
    /// run for the same `(sourceFile, types)` (spec.md §4.2).
    async fn delete_edges_where(&self, filter: EdgeFilter) -> Result<usize>;

    /// BFS in the edge graph, `None` if unreachable within `max_depth`.
    async fn shortest_path(
        &self,
        from: &Identifier,
        to: &Identifier,
        max_depth: usize,
    ) -> Result<Option<Path>>;

    async fn find_cycles(&self, types: Option<&[String]>, max_depth: usize) -> Result<Vec<Vec<Identifier>>>;

    async fn run_recursive(&self, query: RecursiveQuery) -> Result<Vec<RecursiveRow>>;
}
