//! The edge-type hierarchy (spec.md §3.3, §4.1): a forest of registered edge
//! types with transitive/inheritable flags and conflict-resolution metadata.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Tie-break rule when the Inference Engine derives an edge that collides
/// with an existing one (spec.md §3.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    PriorityBased,
    MergeAttributes,
    KeepExisting,
    ReplaceNew,
}

/// Registered metadata for a single edge type (spec.md §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeTypeDef {
    pub name: String,
    pub parent_type: Option<String>,
    pub is_transitive: bool,
    pub is_inheritable: bool,
    pub is_directed: bool,
    pub priority: i32,
    pub conflict_policy: ConflictPolicy,
}

impl EdgeTypeDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent_type: None,
            is_transitive: false,
            is_inheritable: false,
            is_directed: true,
            priority: 0,
            conflict_policy: ConflictPolicy::PriorityBased,
        }
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_type = Some(parent.into());
        self
    }

    pub fn transitive(mut self) -> Self {
        self.is_transitive = true;
        self
    }

    pub fn inheritable(mut self) -> Self {
        self.is_inheritable = true;
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.conflict_policy = policy;
        self
    }
}

impl fmt::Display for EdgeTypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Result of `validateHierarchy()` (spec.md §4.1).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HierarchyValidation {
    pub ok: bool,
    pub errors: Vec<String>,
}

/// Forest of edge-type definitions, seeded at construction with the
/// edge types of spec.md §3.3 and otherwise mutated only through `register`.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    defs: HashMap<String, EdgeTypeDef>,
    children: HashMap<String, Vec<String>>,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::seeded()
    }
}

impl TypeRegistry {
    /// An empty registry with no definitions.
    pub fn empty() -> Self {
        Self {
            defs: HashMap::new(),
            children: HashMap::new(),
        }
    }

    /// Seeded with the initial edge-type set of §3.3.
    pub fn seeded() -> Self {
        let mut reg = Self::empty();
        let defs = [
            EdgeTypeDef::new("imports"),
            EdgeTypeDef::new("imports_file").parent("imports"),
            EdgeTypeDef::new("imports_library").parent("imports"),
            EdgeTypeDef::new("contains").inheritable(),
            EdgeTypeDef::new("contains-method").parent("contains").inheritable(),
            EdgeTypeDef::new("contains-field").parent("contains").inheritable(),
            EdgeTypeDef::new("defines").parent("contains").inheritable(),
            EdgeTypeDef::new("depends_on").transitive().inheritable(),
            EdgeTypeDef::new("depends_on_file").parent("depends_on").transitive().inheritable(),
            EdgeTypeDef::new("calls"),
            EdgeTypeDef::new("calls-method").parent("calls"),
            EdgeTypeDef::new("calls-function").parent("calls"),
            EdgeTypeDef::new("aliasOf"),
            EdgeTypeDef::new("accesses-field"),
            EdgeTypeDef::new("uses"),
            EdgeTypeDef::new("uses-type").parent("uses"),
            EdgeTypeDef::new("overrides-method"),
            EdgeTypeDef::new("throws"),
            EdgeTypeDef::new("equivalence").conflict_policy(ConflictPolicy::MergeAttributes),
        ];
        for def in defs {
            reg.register(def).expect("seeded edge-type hierarchy must be well-formed");
        }
        reg
    }

    /// `register(def)` — fails with `EdgeTypeCycle` or `EdgeTypeDuplicate`.
    pub fn register(&mut self, def: EdgeTypeDef) -> Result<()> {
        if self.defs.contains_key(&def.name) {
            return Err(EngineError::EdgeTypeDuplicate(def.name.clone()));
        }
        if let Some(parent) = &def.parent_type {
            if !self.defs.contains_key(parent) {
                return Err(EngineError::EdgeTypeUnknown(parent.clone()));
            }
            // A forest has no cycles; since `def.name` is new, the only way
            // to introduce one is if `parent` already descends from `def.name`,
            // which is impossible for a not-yet-registered name. The check
            // below instead guards self-parenting and is kept for clarity
            // and to protect future `re-register` extensions.
            if parent == &def.name {
                return Err(EngineError::EdgeTypeCycle(def.name.clone(), parent.clone()));
            }
        }
        if let Some(parent) = &def.parent_type {
            self.children.entry(parent.clone()).or_default().push(def.name.clone());
        }
        self.defs.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn get(&self, type_name: &str) -> Option<&EdgeTypeDef> {
        self.defs.get(type_name)
    }

    /// Direct children of `type_name`.
    pub fn children(&self, type_name: &str) -> Vec<&str> {
        self.children
            .get(type_name)
            .map(|c| c.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Transitive closure of children (`type_name` itself is excluded).
    pub fn descendants(&self, type_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<String> = self.children(type_name).into_iter().map(String::from).collect();
        while let Some(child) = stack.pop() {
            if !out.contains(&child) {
                stack.extend(self.children(&child).into_iter().map(String::from));
                out.push(child);
            }
        }
        out
    }

    /// Direct and indirect ancestors of `type_name`, nearest first.
    pub fn ancestors(&self, type_name: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut current = self.defs.get(type_name).and_then(|d| d.parent_type.clone());
        while let Some(parent) = current {
            current = self.defs.get(&parent).and_then(|d| d.parent_type.clone());
            out.push(parent.clone());
        }
        out
    }

    /// Path from the forest root down to `type_name`, inclusive.
    pub fn hierarchy_path(&self, type_name: &str) -> Vec<String> {
        let mut path = self.ancestors(type_name);
        path.reverse();
        path.push(type_name.to_string());
        path
    }

    /// Asserts forest-shape (no cycles) and referential integrity of
    /// `parentType` across every registered definition.
    pub fn validate_hierarchy(&self) -> HierarchyValidation {
        let mut errors = Vec::new();
        for (name, def) in &self.defs {
            if let Some(parent) = &def.parent_type {
                if !self.defs.contains_key(parent) {
                    errors.push(format!("{name}: parentType {parent} is not registered"));
                    continue;
                }
                // cycle check: walking ancestors from `name` must never
                // revisit `name` itself.
                let mut seen = std::collections::HashSet::new();
                let mut current = Some(name.clone());
                while let Some(cur) = current {
                    if !seen.insert(cur.clone()) {
                        errors.push(format!("{name}: cycle detected in parentType chain"));
                        break;
                    }
                    current = self.defs.get(&cur).and_then(|d| d.parent_type.clone());
                }
            }
        }
        HierarchyValidation {
            ok: errors.is_empty(),
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_registry_is_well_formed() {
        let reg = TypeRegistry::seeded();
        let result = reg.validate_hierarchy();
        assert!(result.ok, "errors: {:?}", result.errors);
    }

    #[test]
    fn children_and_descendants() {
        let reg = TypeRegistry::seeded();
        let mut children = reg.children("contains");
        children.sort();
        assert_eq!(children, vec!["contains-field", "contains-method", "defines"]);

        let mut descendants = reg.descendants("imports");
        descendants.sort();
        assert_eq!(descendants, vec!["imports_file", "imports_library"]);
    }

    #[test]
    fn ancestors_and_hierarchy_path() {
        let reg = TypeRegistry::seeded();
        assert_eq!(reg.ancestors("contains-method"), vec!["contains".to_string()]);
        assert_eq!(
            reg.hierarchy_path("contains-method"),
            vec!["contains".to_string(), "contains-method".to_string()]
        );
    }

    #[test]
    fn register_rejects_unknown_parent() {
        let mut reg = TypeRegistry::seeded();
        let err = reg.register(EdgeTypeDef::new("weird").parent("no-such-type"));
        assert!(err.is_err());
    }

    #[test]
    fn register_rejects_duplicate_name() {
        let mut reg = TypeRegistry::seeded();
        let err = reg.register(EdgeTypeDef::new("calls"));
        assert!(err.is_err());
    }

    #[test]
    fn register_new_type_under_existing_parent() {
        let mut reg = TypeRegistry::seeded();
        reg.register(EdgeTypeDef::new("shadows").parent("aliasOf")).unwrap();
        assert_eq!(reg.children("aliasOf"), vec!["shadows"]);
        assert!(reg.validate_hierarchy().ok);
    }

    #[test]
    fn transitive_and_inheritable_flags_seeded_correctly() {
        let reg = TypeRegistry::seeded();
        assert!(reg.get("depends_on").unwrap().is_transitive);
        assert!(reg.get("contains").unwrap().is_inheritable);
        assert!(!reg.get("calls").unwrap().is_transitive);
    }
}
