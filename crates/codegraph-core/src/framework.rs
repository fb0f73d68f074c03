//! The Analyzer Framework: ownership-scoped cleanup, `extends`-topological
//! execution order, and the bounded-concurrency batch runner (spec.md §4.3,
//! §5).

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{info_span, warn, Instrument};

use crate::analyzer::{Analyzer, AnalysisContext, AnalyzerResult, MissingLink, TypeCollection};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::graphstore::{EdgeFilter, GraphStore};
use crate::identifier::Language;

/// Per-file outcome of a batch run (spec.md §4.3 "Batch runner", §7
/// "User-visible behavior").
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub file_path: String,
    pub succeeded: bool,
    pub nodes_written: usize,
    pub edges_written: usize,
    pub missing_links: Vec<MissingLink>,
    pub error: Option<String>,
}

/// Aggregate result of `analyze_batch` (spec.md §4.3, §7).
#[derive(Debug, Clone, Default)]
pub struct BatchResult {
    pub files: Vec<FileOutcome>,
}

impl BatchResult {
    pub fn succeeded_count(&self) -> usize {
        self.files.iter().filter(|f| f.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.files.iter().filter(|f| !f.succeeded).count()
    }
}

/// One file queued for analysis (spec.md §4.3).
pub struct FileTask {
    pub file_path: String,
    pub source_code: Arc<str>,
    pub language: Language,
    pub parse_result: Option<Arc<dyn std::any::Any + Send + Sync>>,
}

/// Orders registered analyzers by `extends` and runs them per file, either
/// one at a time (`analyze_file`) or across a batch with bounded concurrency
/// (`analyze_batch`).
pub struct AnalyzerFramework<S: GraphStore> {
    store: Arc<S>,
    order: Vec<Arc<dyn Analyzer>>,
    config: EngineConfig,
}

impl<S: GraphStore + 'static> AnalyzerFramework<S> {
    /// Registers `analyzers`, resolving `extends` into a topological order.
    /// Fails if two analyzers declare a dependency cycle (§4.3).
    pub fn new(store: Arc<S>, analyzers: Vec<Arc<dyn Analyzer>>, config: EngineConfig) -> Result<Self> {
        let order = topological_order(&analyzers)?;
        Ok(Self { store, order, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every registered analyzer over one file, in `extends` order,
    /// then performs cleanup + writes for the whole file atomically from the
    /// caller's point of view (spec.md §4.3).
    pub async fn analyze_file(&self, task: &FileTask) -> Result<FileOutcome> {
        let span = info_span!("analyze_file", file = %task.file_path);
        async {
            let shared_data = Arc::new(dashmap::DashMap::new());
            let mut previous_results: HashMap<String, AnalyzerResult> = HashMap::new();
            let type_collection = Arc::new(TypeCollection::default());

            let mut all_missing_links = Vec::new();
            let mut total_nodes = 0usize;
            let mut total_edges = 0usize;

            for analyzer in &self.order {
                let owned_types = analyzer.owned_edge_types().to_vec();

                let in_scope = analyzer.supported_languages().contains(&task.language);
                let result = if in_scope {
                    let cancelled = Arc::new(std::sync::atomic::AtomicBool::new(false));
                    let ctx = AnalysisContext {
                        file_path: task.file_path.clone(),
                        source_code: task.source_code.clone(),
                        language: task.language,
                        parse_result: task.parse_result.clone(),
                        shared_data: shared_data.clone(),
                        previous_results: Arc::new(previous_results.clone()),
                        type_collection: type_collection.clone(),
                        cancelled: cancelled.clone(),
                    };
                    let timeout = self.config.analyzer_timeout;
                    let analysis = analyzer.analyze(&ctx);
                    tokio::pin!(analysis);
                    match tokio::time::timeout(timeout, &mut analysis).await {
                        Ok(Ok(result)) => result.finalize(),
                        Ok(Err(e)) => {
                            warn!(file = %task.file_path, analyzer = analyzer.id(), error = %e, "analyzer failed");
                            return Ok(FileOutcome {
                                file_path: task.file_path.clone(),
                                succeeded: false,
                                nodes_written: 0,
                                edges_written: 0,
                                missing_links: Vec::new(),
                                error: Some(e.to_string()),
                            });
                        }
                        Err(_) => {
                            // The deadline lapsed; flip the shared signal so
                            // an analyzer mid-phase observes it at its next
                            // phase boundary and returns promptly instead of
                            // being silently dropped (§5 "Cancellation &
                            // timeouts").
                            cancelled.store(true, std::sync::atomic::Ordering::Relaxed);
                            warn!(file = %task.file_path, analyzer = analyzer.id(), ?timeout, "analyzer timed out");
                            return Ok(FileOutcome {
                                file_path: task.file_path.clone(),
                                succeeded: false,
                                nodes_written: 0,
                                edges_written: 0,
                                missing_links: Vec::new(),
                                error: Some(EngineError::AnalyzerTimeout(timeout).to_string()),
                            });
                        }
                    }
                } else {
                    AnalyzerResult::empty()
                };

                // Cleanup isolation: only this analyzer's owned edge types
                // are ever touched for this file (§4.3).
                self.store
                    .delete_edges_where(EdgeFilter {
                        source_file: Some(task.file_path.clone()),
                        types: Some(owned_types),
                        from: None,
                        to: None,
                    })
                    .await?;

                all_missing_links.extend(result.missing_links.clone());
                total_nodes += result.nodes.len();
                total_edges += result.edges.len();

                for node in result.nodes.clone() {
                    self.store.upsert_node(node).await?;
                }
                for edge in result.edges.clone() {
                    self.store.upsert_edge(edge).await?;
                }

                previous_results.insert(analyzer.id().to_string(), result);
            }

            Ok(FileOutcome {
                file_path: task.file_path.clone(),
                succeeded: true,
                nodes_written: total_nodes,
                edges_written: total_edges,
                missing_links: all_missing_links,
                error: None,
            })
        }
        .instrument(span)
        .await
    }

    /// Analyzes every file in `tasks`, bounded by
    /// `EngineConfig::max_concurrency` (a `tokio::sync::Semaphore`-gated
    /// task set, mirroring the teacher crate's async-task style). Analyzers
    /// for a single file always run sequentially in `extends` order on
    /// whichever worker owns that file (spec.md §4.3, §5).
    pub async fn analyze_batch(self: &Arc<Self>, tasks: Vec<FileTask>) -> BatchResult {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency.max(1)));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let framework = self.clone();
            let semaphore = semaphore.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
                let file_path = task.file_path.clone();
                match framework.analyze_file(&task).await {
                    Ok(outcome) => outcome,
                    Err(e) => FileOutcome {
                        file_path,
                        succeeded: false,
                        nodes_written: 0,
                        edges_written: 0,
                        missing_links: Vec::new(),
                        error: Some(e.to_string()),
                    },
                }
            }));
        }

        let mut result = BatchResult::default();
        for handle in handles {
            match handle.await {
                Ok(outcome) => result.files.push(outcome),
                Err(join_err) => result.files.push(FileOutcome {
                    file_path: "<unknown>".to_string(),
                    succeeded: false,
                    nodes_written: 0,
                    edges_written: 0,
                    missing_links: Vec::new(),
                    error: Some(join_err.to_string()),
                }),
            }
        }
        result
    }
}

/// Resolves `extends` into an execution order; fails on an unknown
/// dependency or a cycle (§4.3).
fn topological_order(analyzers: &[Arc<dyn Analyzer>]) -> Result<Vec<Arc<dyn Analyzer>>> {
    let by_id: HashMap<&str, &Arc<dyn Analyzer>> = analyzers.iter().map(|a| (a.id(), a)).collect();

    let mut order = Vec::with_capacity(analyzers.len());
    let mut visited: HashSet<&str> = HashSet::new();
    let mut in_progress: HashSet<&str> = HashSet::new();

    fn visit<'a>(
        id: &'a str,
        by_id: &HashMap<&'a str, &'a Arc<dyn Analyzer>>,
        visited: &mut HashSet<&'a str>,
        in_progress: &mut HashSet<&'a str>,
        order: &mut Vec<Arc<dyn Analyzer>>,
    ) -> Result<()> {
        if visited.contains(id) {
            return Ok(());
        }
        if !in_progress.insert(id) {
            return Err(EngineError::StoreError(format!(
                "analyzer dependency cycle detected at {id}"
            )));
        }
        let analyzer = *by_id
            .get(id)
            .ok_or_else(|| EngineError::StoreError(format!("unknown analyzer in extends: {id}")))?;
        for dep in analyzer.extends() {
            visit(dep.as_str(), by_id, visited, in_progress, order)?;
        }
        in_progress.remove(id);
        visited.insert(id);
        order.push((*analyzer).clone());
        Ok(())
    }

    for analyzer in analyzers {
        visit(analyzer.id(), &by_id, &mut visited, &mut in_progress, &mut order)?;
    }
    Ok(order)
}
