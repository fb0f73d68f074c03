//! Layered configuration (spec.md §10.3), loaded via the `config` crate from
//! TOML plus environment overrides (`CODEGRAPH_*`), mirroring the teacher
//! crate's `config.rs` pattern scoped to this core's actual knobs.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Derivation-cache recomputation policy (spec.md §4.5.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CachePolicy {
    Eager,
    Lazy,
    Manual,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Lazy
    }
}

/// Resource bounds for a batch run (spec.md §5, §4.5, §10.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_concurrency: usize,
    pub per_file_memory_ceiling_bytes: Option<u64>,
    pub cache_size_ceiling: Option<usize>,
    #[serde(with = "humantime_secs")]
    pub analyzer_timeout: std::time::Duration,
    pub max_path_length: usize,
    pub max_inheritance_depth: Option<usize>,
    pub cache_policy: CachePolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            per_file_memory_ceiling_bytes: None,
            cache_size_ceiling: None,
            analyzer_timeout: std::time::Duration::from_secs(30),
            max_path_length: 10,
            max_inheritance_depth: None,
            cache_policy: CachePolicy::Lazy,
        }
    }
}

impl EngineConfig {
    /// Load from `CodeGraph.toml` (if present) overlaid with `CODEGRAPH__*`
    /// environment variables, falling back to defaults for anything unset.
    pub fn load() -> Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("CodeGraph").required(false))
            .add_source(config::Environment::with_prefix("CODEGRAPH").separator("__"));
        let cfg = builder
            .build()
            .map_err(|e| EngineError::Configuration(e.to_string()))?;
        match cfg.try_deserialize::<PartialEngineConfig>() {
            Ok(partial) => Ok(partial.into_config()),
            Err(e) => Err(EngineError::Configuration(e.to_string())),
        }
    }
}

/// Mirrors `EngineConfig` with every field optional, so a config file that
/// only overrides one knob still deserializes.
#[derive(Debug, Clone, Default, Deserialize)]
struct PartialEngineConfig {
    max_concurrency: Option<usize>,
    per_file_memory_ceiling_bytes: Option<u64>,
    cache_size_ceiling: Option<usize>,
    analyzer_timeout_secs: Option<u64>,
    max_path_length: Option<usize>,
    max_inheritance_depth: Option<usize>,
    cache_policy: Option<CachePolicy>,
}

impl PartialEngineConfig {
    fn into_config(self) -> EngineConfig {
        let default = EngineConfig::default();
        EngineConfig {
            max_concurrency: self.max_concurrency.unwrap_or(default.max_concurrency),
            per_file_memory_ceiling_bytes: self.per_file_memory_ceiling_bytes,
            cache_size_ceiling: self.cache_size_ceiling,
            analyzer_timeout: self
                .analyzer_timeout_secs
                .map(std::time::Duration::from_secs)
                .unwrap_or(default.analyzer_timeout),
            max_path_length: self.max_path_length.unwrap_or(default.max_path_length),
            max_inheritance_depth: self.max_inheritance_depth,
            cache_policy: self.cache_policy.unwrap_or(default.cache_policy),
        }
    }
}

mod humantime_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = EngineConfig::default();
        assert_eq!(cfg.max_concurrency, 4);
        assert_eq!(cfg.analyzer_timeout, std::time::Duration::from_secs(30));
        assert_eq!(cfg.max_path_length, 10);
        assert_eq!(cfg.max_inheritance_depth, None);
        assert_eq!(cfg.cache_policy, CachePolicy::Lazy);
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let partial = PartialEngineConfig {
            max_concurrency: Some(8),
            ..Default::default()
        };
        let cfg = partial.into_config();
        assert_eq!(cfg.max_concurrency, 8);
        assert_eq!(cfg.max_path_length, 10);
    }

    // Serialized via a lock since `load()` reads process-wide environment
    // state; running alongside another test that mutates `CODEGRAPH__*` vars
    // would race.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    #[test]
    fn load_applies_env_override_over_defaults() {
        let _guard = ENV_LOCK.lock().unwrap();
        std::env::set_var("CODEGRAPH__MAX_CONCURRENCY", "16");
        std::env::set_var("CODEGRAPH__CACHE_POLICY", "eager");
        let cfg = EngineConfig::load().expect("load should succeed with no CodeGraph.toml present");
        std::env::remove_var("CODEGRAPH__MAX_CONCURRENCY");
        std::env::remove_var("CODEGRAPH__CACHE_POLICY");

        assert_eq!(cfg.max_concurrency, 16);
        assert_eq!(cfg.cache_policy, CachePolicy::Eager);
        // Untouched knobs keep their defaults.
        assert_eq!(cfg.max_path_length, 10);
    }
}
