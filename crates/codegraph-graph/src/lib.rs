pub mod inference;
pub mod store;

pub use inference::{DerivationCache, DerivationEntry, InferenceEngine, ValidationReport};
pub use store::InMemoryGraphStore;
