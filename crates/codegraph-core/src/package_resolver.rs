//! `PackageResolver`: the external package-manager collaborator an import
//! analyzer consults for library metadata (spec.md §4.4.1). Package-manager
//! integration itself is out of scope for this core, so the default
//! implementation always returns `None`.

use async_trait::async_trait;

/// Metadata about a resolved external library, as reported by a package
/// manager integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryMetadata {
    pub name: String,
    pub version: Option<String>,
}

#[async_trait]
pub trait PackageResolver: Send + Sync {
    async fn resolve(&self, package_name: &str) -> Option<LibraryMetadata>;
}

/// Always returns `None`; the engine upserts library nodes with only a name
/// when no resolver (or this default) supplies richer metadata.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPackageResolver;

#[async_trait]
impl PackageResolver for NullPackageResolver {
    async fn resolve(&self, _package_name: &str) -> Option<LibraryMetadata> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_resolver_always_returns_none() {
        let resolver = NullPackageResolver;
        assert_eq!(resolver.resolve("lodash").await, None);
    }
}
