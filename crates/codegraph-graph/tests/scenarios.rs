//! End-to-end scenarios spanning the reference `GraphStore`, the
//! `AnalyzerFramework`, and the `InferenceEngine` together.

use std::sync::Arc;

use async_trait::async_trait;
use codegraph_core::{
    build, Analyzer, AnalysisContext, AnalyzerDecl, AnalyzerFramework, AnalyzerResult,
    CachePolicy, EdgeFilter, EngineConfig, FileTask, GraphStore, Identifier, IdentifierContext,
    Kind, Language, Node, Result, TypeRegistry,
};
use codegraph_graph::{InMemoryGraphStore, InferenceEngine};

fn file_node(id: Identifier, name: &str) -> Node {
    Node::new(id, Kind::File, name, Language::TypeScript)
}

#[tokio::test]
async fn hierarchical_query_returns_both_children() {
    let store = Arc::new(InMemoryGraphStore::new());
    let registry = Arc::new(TypeRegistry::seeded());

    let app_ctx = IdentifierContext::new("proj", "src/app.ts");
    let app_id = build(Kind::File, None, &app_ctx).unwrap();
    let util_ctx = IdentifierContext::new("proj", "src/util.ts");
    let util_id = build(Kind::File, None, &util_ctx).unwrap();
    let lib_id = build(Kind::Library, Some("lodash"), &app_ctx).unwrap();

    store.upsert_node(file_node(app_id.clone(), "app.ts")).await.unwrap();
    store.upsert_node(file_node(util_id.clone(), "util.ts")).await.unwrap();
    store
        .upsert_node(Node::new(lib_id.clone(), Kind::Library, "lodash", Language::External))
        .await
        .unwrap();

    store
        .upsert_edge(codegraph_core::Edge::new(app_id.clone(), util_id.clone(), "imports_file", "src/app.ts"))
        .await
        .unwrap();
    store
        .upsert_edge(codegraph_core::Edge::new(app_id.clone(), lib_id.clone(), "imports_library", "src/app.ts"))
        .await
        .unwrap();

    let engine = InferenceEngine::new(store.clone(), registry, CachePolicy::Lazy, 10, None);
    let mut edges = engine.hierarchical_query("imports").await.unwrap();
    edges.sort_by(|a, b| a.to.as_str().cmp(b.to.as_str()));

    assert_eq!(edges.len(), 2);
    assert!(edges.iter().all(|e| e.edge_type == "imports"));
}

#[tokio::test]
async fn transitive_closure_stops_at_max_path_length() {
    let store = Arc::new(InMemoryGraphStore::new());
    let registry = Arc::new(TypeRegistry::seeded());

    let ctx = IdentifierContext::new("proj", "src/a.ts");
    let a = build(Kind::File, Some("A"), &ctx).unwrap();
    let b = build(Kind::File, Some("B"), &ctx).unwrap();
    let c = build(Kind::File, Some("C"), &ctx).unwrap();
    let d = build(Kind::File, Some("D"), &ctx).unwrap();

    for (id, name) in [(&a, "A"), (&b, "B"), (&c, "C"), (&d, "D")] {
        store.upsert_node(file_node(id.clone(), name)).await.unwrap();
    }
    store.upsert_edge(codegraph_core::Edge::new(a.clone(), b.clone(), "depends_on", "src/a.ts")).await.unwrap();
    store.upsert_edge(codegraph_core::Edge::new(b.clone(), c.clone(), "depends_on", "src/a.ts")).await.unwrap();
    store.upsert_edge(codegraph_core::Edge::new(c.clone(), d.clone(), "depends_on", "src/a.ts")).await.unwrap();

    let engine = InferenceEngine::new(store.clone(), registry, CachePolicy::Lazy, 2, None);
    let derived = engine.transitive_closure(&a, "depends_on").await.unwrap();

    let targets: Vec<&str> = derived.iter().map(|e| e.to.as_str()).collect();
    assert!(targets.contains(&c.as_str()));
    assert!(!targets.contains(&d.as_str()), "A->D is depth 3, beyond maxPathLength=2");
    assert!(derived.iter().all(|e| e.is_derived));
}

struct ImportsAnalyzer {
    owned: Vec<String>,
    languages: Vec<Language>,
}

impl ImportsAnalyzer {
    fn new() -> Self {
        Self {
            owned: vec!["imports_file".to_string()],
            languages: vec![Language::TypeScript],
        }
    }
}

#[async_trait]
impl Analyzer for ImportsAnalyzer {
    async fn analyze(&self, context: &AnalysisContext) -> Result<AnalyzerResult> {
        let ctx = IdentifierContext::new("proj", context.file_path.clone());
        let target_ctx = IdentifierContext::new("proj", "src/util.ts");
        let file_id = build(Kind::File, None, &ctx).unwrap();
        let target_id = build(Kind::File, None, &target_ctx).unwrap();
        let mut result = AnalyzerResult::empty();
        result.nodes.push(file_node(target_id.clone(), "util.ts"));
        result
            .edges
            .push(codegraph_core::Edge::new(file_id, target_id, "imports_file", context.file_path.clone()));
        Ok(result.finalize())
    }
}

impl AnalyzerDecl for ImportsAnalyzer {
    fn id(&self) -> &str {
        "imports-analyzer"
    }
    fn owned_edge_types(&self) -> &[String] {
        &self.owned
    }
    fn supported_languages(&self) -> &[Language] {
        &self.languages
    }
}

struct CallsAnalyzer {
    owned: Vec<String>,
    languages: Vec<Language>,
}

impl CallsAnalyzer {
    fn new() -> Self {
        Self {
            owned: vec!["calls-method".to_string()],
            languages: vec![Language::TypeScript],
        }
    }
}

#[async_trait]
impl Analyzer for CallsAnalyzer {
    async fn analyze(&self, context: &AnalysisContext) -> Result<AnalyzerResult> {
        let ctx = IdentifierContext::new("proj", context.file_path.clone());
        let caller = build(Kind::Method, Some("Foo.bar"), &ctx).unwrap();
        let callee = build(Kind::Unknown, Some("baz"), &ctx).unwrap();
        let mut result = AnalyzerResult::empty();
        result.nodes.push(Node::new(callee.clone(), Kind::Unknown, "baz", Language::Unknown));
        result
            .edges
            .push(codegraph_core::Edge::new(caller, callee, "calls-method", context.file_path.clone()));
        Ok(result.finalize())
    }
}

impl AnalyzerDecl for CallsAnalyzer {
    fn id(&self) -> &str {
        "calls-analyzer"
    }
    fn owned_edge_types(&self) -> &[String] {
        &self.owned
    }
    fn supported_languages(&self) -> &[Language] {
        &self.languages
    }
}

#[tokio::test]
async fn cleanup_isolation_preserves_other_analyzers_edges() {
    let store = Arc::new(InMemoryGraphStore::new());
    let analyzers: Vec<Arc<dyn Analyzer>> = vec![Arc::new(ImportsAnalyzer::new()), Arc::new(CallsAnalyzer::new())];
    let framework = Arc::new(AnalyzerFramework::new(store.clone(), analyzers, EngineConfig::default()).unwrap());

    let task = FileTask {
        file_path: "src/app.ts".to_string(),
        source_code: Arc::from(""),
        language: Language::TypeScript,
        parse_result: None,
    };

    framework.analyze_file(&task).await.unwrap();
    framework.analyze_file(&task).await.unwrap();

    let imports_edges = store
        .find_edges(EdgeFilter {
            source_file: Some("src/app.ts".to_string()),
            types: Some(vec!["imports_file".to_string()]),
            ..Default::default()
        })
        .await
        .unwrap();
    let calls_edges = store
        .find_edges(EdgeFilter {
            source_file: Some("src/app.ts".to_string()),
            types: Some(vec!["calls-method".to_string()]),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(imports_edges.len(), 1, "re-running imports analyzer should not duplicate its own edge");
    assert_eq!(calls_edges.len(), 1, "calls-method edges from the other analyzer must survive the imports re-run");
}
