use thiserror::Error;

/// The error taxonomy of the graph-analysis core.
///
/// `MissingLink` and `CacheStale` are deliberately not variants here: the
/// former is analysis data (attached to a `BatchResult`), the latter is a
/// telemetry signal emitted as a `tracing` event. Neither is a failure.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("identifier invalid: {0}")]
    IdentifierInvalid(String),

    #[error("edge type unknown: {0}")]
    EdgeTypeUnknown(String),

    #[error("edge type already registered: {0}")]
    EdgeTypeDuplicate(String),

    #[error("edge type cycle: registering {0:?} under {1} would create a cycle")]
    EdgeTypeCycle(String, String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("parse failure in {file}: {reason}")]
    ParseFailure { file: String, reason: String },

    #[error("analyzer timed out after {0:?}")]
    AnalyzerTimeout(std::time::Duration),

    #[error("store error: {0}")]
    StoreError(String),

    #[error("inference depth exceeded: {kind} traversal hit {limit}")]
    InferenceDepthExceeded { kind: String, limit: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
