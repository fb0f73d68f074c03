//! Node and edge entities (spec.md §3.1) and the attribute map that carries
//! both strongly-typed known fields and an opaque pass-through bag (§9,
//! "Reflection / dynamic attribute maps").

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifier::{Identifier, Kind, Language};

/// Visibility of a declared symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Protected,
}

/// A single parameter in a callable's signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_annotation: Option<String>,
}

/// Strongly-typed known fields plus an opaque pass-through map, per the
/// "typed attribute union with opaque map" design note (spec.md §9).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Attributes {
    pub visibility: Option<Visibility>,
    pub is_static: Option<bool>,
    pub is_async: Option<bool>,
    pub has_initializer: Option<bool>,
    pub parameters: Option<Vec<Parameter>>,
    pub return_type: Option<String>,
    pub type_annotation: Option<String>,
    pub cyclomatic_complexity: Option<u32>,
    pub imported_items: Option<Vec<String>>,
    /// Forward-compatible bag for any attribute not promoted to a typed
    /// field above.
    #[serde(default)]
    pub extra: HashMap<String, Value>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }

    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Merge `other` into `self`, `other`'s typed fields winning when set,
    /// and opaque entries unioned (`other` wins on key collision). Used by
    /// node upsert-merge (§3.4) and `mergeAttributes` conflict resolution
    /// (§3.1).
    pub fn merge(&mut self, other: &Attributes) {
        macro_rules! merge_field {
            ($field:ident) => {
                if other.$field.is_some() {
                    self.$field = other.$field.clone();
                }
            };
        }
        merge_field!(visibility);
        merge_field!(is_static);
        merge_field!(is_async);
        merge_field!(has_initializer);
        merge_field!(parameters);
        merge_field!(return_type);
        merge_field!(type_annotation);
        merge_field!(cyclomatic_complexity);
        merge_field!(imported_items);
        for (k, v) in &other.extra {
            self.extra.insert(k.clone(), v.clone());
        }
    }
}

/// A point or span in a source file, 1-indexed like the teacher's position
/// reporting from tree-sitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub source_path: String,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// A code artifact (spec.md §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub identifier: Identifier,
    pub kind: Kind,
    pub name: String,
    pub location: Option<SourceLocation>,
    pub language: Language,
    pub attributes: Attributes,
}

impl Node {
    pub fn new(identifier: Identifier, kind: Kind, name: impl Into<String>, language: Language) -> Self {
        Self {
            identifier,
            kind,
            name: name.into(),
            location: None,
            language,
            attributes: Attributes::new(),
        }
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Upsert-merge: attributes merge, location updates to the incoming
    /// value when present (spec.md §3.5 — "re-analyzing a file upserts").
    pub fn merge_from(&mut self, incoming: &Node) {
        self.name = incoming.name.clone();
        self.kind = incoming.kind.clone();
        self.language = incoming.language;
        if incoming.location.is_some() {
            self.location = incoming.location;
        }
        self.attributes.merge(&incoming.attributes);
    }
}

/// A typed, directed relation between two nodes (spec.md §3.1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from: Identifier,
    pub to: Identifier,
    pub edge_type: String,
    pub label: Option<String>,
    pub weight: f64,
    /// The file whose analysis produced this edge; required for cleanup
    /// isolation (spec.md §3.4 invariant 3).
    pub source_file: String,
    pub attributes: Attributes,
    /// Whether this edge was produced by the Inference Engine rather than
    /// direct extraction (spec.md §3.1).
    pub is_derived: bool,
}

impl Edge {
    pub fn new(
        from: Identifier,
        to: Identifier,
        edge_type: impl Into<String>,
        source_file: impl Into<String>,
    ) -> Self {
        Self {
            from,
            to,
            edge_type: edge_type.into(),
            label: None,
            weight: 1.0,
            source_file: source_file.into(),
            attributes: Attributes::new(),
            is_derived: false,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn derived(mut self) -> Self {
        self.is_derived = true;
        self
    }

    /// Upsert key: edges are unique on `(from, to, type)` (spec.md §4.2).
    pub fn upsert_key(&self) -> (String, String, String) {
        (
            self.from.as_str().to_string(),
            self.to.as_str().to_string(),
            self.edge_type.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::{build, IdentifierContext};

    fn id(symbol: &str) -> Identifier {
        let ctx = IdentifierContext::new("proj", "src/a.ts");
        build(Kind::Class, Some(symbol), &ctx).unwrap()
    }

    #[test]
    fn attributes_merge_prefers_incoming_typed_fields() {
        let mut base = Attributes::new();
        base.is_static = Some(false);
        base.set_extra("note", "keep-me");

        let mut incoming = Attributes::new();
        incoming.is_static = Some(true);
        incoming.set_extra("note", "overwritten");

        base.merge(&incoming);
        assert_eq!(base.is_static, Some(true));
        assert_eq!(base.get_extra("note").unwrap(), "overwritten");
    }

    #[test]
    fn node_merge_from_updates_location_and_attributes() {
        let mut existing = Node::new(id("A"), Kind::Class, "A", Language::TypeScript);
        let loc = SourceLocation {
            source_path: "src/a.ts".into(),
            start_line: 1,
            start_column: 0,
            end_line: 4,
            end_column: 1,
        };
        let mut incoming = Node::new(id("A"), Kind::Class, "A", Language::TypeScript).with_location(loc);
        incoming.attributes.visibility = Some(Visibility::Public);
        existing.merge_from(&incoming);
        assert_eq!(existing.location, Some(loc));
        assert_eq!(existing.attributes.visibility, Some(Visibility::Public));
    }

    #[test]
    fn edge_upsert_key_is_from_to_type() {
        let e = Edge::new(id("A"), id("B"), "calls", "src/a.ts");
        assert_eq!(
            e.upsert_key(),
            (
                "proj/src/a.ts#Class:A".to_string(),
                "proj/src/a.ts#Class:B".to_string(),
                "calls".to_string()
            )
        );
    }
}
