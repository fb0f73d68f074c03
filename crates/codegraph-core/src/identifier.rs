//! Canonical RDF-style identifiers (spec.md §3.2, §6.1).
//!
//! ```text
//! identifier  := library-id | file-id | symbol-id
//! library-id  := "library#" name ( "@" version )?
//! file-id     := project-name "/" rel-path
//! symbol-id   := file-id "#" kind ":" symbol-name
//! rel-path    := segment ( "/" segment )*         ; never leading "/"
//! symbol-name := name ( "." name )*
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, Result};

/// `Kind` of a node, per spec.md §3.1 and the `kind` production of §6.1.
/// Extensible via `Other` to mirror the teacher's `NodeType::Other(String)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Kind {
    File,
    Library,
    Class,
    Interface,
    Method,
    Function,
    Field,
    Heading,
    Unknown,
    Other(String),
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::File => "File",
            Kind::Library => "Library",
            Kind::Class => "Class",
            Kind::Interface => "Interface",
            Kind::Method => "Method",
            Kind::Function => "Function",
            Kind::Field => "Field",
            Kind::Heading => "Heading",
            Kind::Unknown => "Unknown",
            Kind::Other(s) => s.as_str(),
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for Kind {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "File" => Kind::File,
            "Library" => Kind::Library,
            "Class" => Kind::Class,
            "Interface" => Kind::Interface,
            "Method" => Kind::Method,
            "Function" => Kind::Function,
            "Field" => Kind::Field,
            "Heading" => Kind::Heading,
            "Unknown" => Kind::Unknown,
            other => Kind::Other(other.to_string()),
        })
    }
}

/// Source language of a node, per spec.md §6.4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    TypeScript,
    Tsx,
    JavaScript,
    Jsx,
    Python,
    Go,
    Java,
    Markdown,
    External,
    Unknown,
}

impl Language {
    /// Detect by file extension, falling back to `Unknown` (content-based
    /// heuristics are left to callers that have the file content in hand).
    pub fn from_extension(ext: &str) -> Language {
        match ext {
            "ts" | "d.ts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "js" | "mjs" | "cjs" => Language::JavaScript,
            "jsx" => Language::Jsx,
            "py" | "pyi" => Language::Python,
            "go" => Language::Go,
            "java" => Language::Java,
            "md" | "markdown" => Language::Markdown,
            _ => Language::Unknown,
        }
    }
}

/// Context supplied to `build` (spec.md §4.1).
#[derive(Debug, Clone)]
pub struct IdentifierContext {
    pub project_name: String,
    /// Relative path from the project root. Backslashes are normalized to
    /// forward slashes per the identifier invariants (spec.md §3.2).
    pub relative_path: String,
    pub language: Option<Language>,
}

impl IdentifierContext {
    pub fn new(project_name: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            relative_path: normalize_path(&relative_path.into()),
            language: None,
        }
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }
}

fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// A canonical identifier string, validated against the §6.1 grammar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap a raw string, validating it against the grammar first.
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if validate(&raw) {
            Ok(Identifier(raw))
        } else {
            Err(EngineError::IdentifierInvalid(raw))
        }
    }
}

static NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^#:/\s]+$").unwrap());
static PROJECT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_\-]+$").unwrap());

fn is_valid_name(s: &str) -> bool {
    !s.is_empty() && NAME_RE.is_match(s)
}

fn is_valid_project_name(s: &str) -> bool {
    !s.is_empty() && PROJECT_RE.is_match(s)
}

fn is_valid_rel_path(s: &str) -> bool {
    if s.is_empty() || s.starts_with('/') {
        return false;
    }
    s.split('/').all(is_valid_name)
}

fn is_valid_symbol_name(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    s.split('.').all(is_valid_name)
}

/// Parsed shape of an identifier, returned by `parse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedIdentifier {
    Library {
        name: String,
        version: Option<String>,
    },
    File {
        project_name: String,
        relative_path: String,
    },
    Symbol {
        project_name: String,
        relative_path: String,
        kind: Kind,
        symbol_name: String,
    },
}

/// `build(kind, symbolName, context) → Identifier` (spec.md §4.1).
///
/// `kind = Kind::Library` produces a `library#name[@version]` identifier;
/// `symbol_name` is read as `name[@version]` in that case. `kind = Kind::File`
/// produces a bare file identifier, ignoring `symbol_name`. Any other kind
/// produces a symbol identifier scoped to the file named by `context`.
pub fn build(kind: Kind, symbol_name: Option<&str>, context: &IdentifierContext) -> Result<Identifier> {
    match kind {
        Kind::Library => {
            let spec = symbol_name.ok_or_else(|| {
                EngineError::IdentifierInvalid("library identifier requires a name".into())
            })?;
            let (name, version) = match spec.split_once('@') {
                Some((n, v)) => (n, Some(v)),
                None => (spec, None),
            };
            if !is_valid_name(name) {
                return Err(EngineError::IdentifierInvalid(format!(
                    "invalid library name: {name}"
                )));
            }
            let raw = match version {
                Some(v) => format!("library#{name}@{v}"),
                None => format!("library#{name}"),
            };
            Identifier::new(raw)
        }
        Kind::File => {
            if !is_valid_project_name(&context.project_name) {
                return Err(EngineError::IdentifierInvalid(format!(
                    "invalid project name: {}",
                    context.project_name
                )));
            }
            if !is_valid_rel_path(&context.relative_path) {
                return Err(EngineError::IdentifierInvalid(format!(
                    "invalid relative path: {}",
                    context.relative_path
                )));
            }
            Identifier::new(format!("{}/{}", context.project_name, context.relative_path))
        }
        other => {
            let name = symbol_name.ok_or_else(|| {
                EngineError::IdentifierInvalid("symbol identifier requires a name".into())
            })?;
            if !is_valid_project_name(&context.project_name) {
                return Err(EngineError::IdentifierInvalid(format!(
                    "invalid project name: {}",
                    context.project_name
                )));
            }
            if !is_valid_rel_path(&context.relative_path) {
                return Err(EngineError::IdentifierInvalid(format!(
                    "invalid relative path: {}",
                    context.relative_path
                )));
            }
            if !is_valid_symbol_name(name) {
                return Err(EngineError::IdentifierInvalid(format!(
                    "invalid symbol name: {name}"
                )));
            }
            Identifier::new(format!(
                "{}/{}#{}:{}",
                context.project_name, context.relative_path, other, name
            ))
        }
    }
}

/// `parse(identifier) → {...} | None` (spec.md §4.1). Strict: malformed input
/// returns `None` rather than a best-effort partial parse.
pub fn parse(identifier: &str) -> Option<ParsedIdentifier> {
    if let Some(rest) = identifier.strip_prefix("library#") {
        let (name, version) = match rest.split_once('@') {
            Some((n, v)) => (n, Some(v.to_string())),
            None => (rest, None),
        };
        if !is_valid_name(name) {
            return None;
        }
        return Some(ParsedIdentifier::Library {
            name: name.to_string(),
            version,
        });
    }

    // symbol-id is file-id + "#" kind ":" symbol-name; a plain file-id has no
    // "#" at all (a bare rel-path segment can't contain "#").
    if let Some(hash_pos) = identifier.find('#') {
        let (file_part, symbol_part) = identifier.split_at(hash_pos);
        let symbol_part = &symbol_part[1..]; // drop '#'
        let (project_name, relative_path) = file_part.split_once('/')?;
        if !is_valid_project_name(project_name) || !is_valid_rel_path(relative_path) {
            return None;
        }
        let (kind_str, symbol_name) = symbol_part.split_once(':')?;
        if !is_valid_symbol_name(symbol_name) {
            return None;
        }
        let kind: Kind = kind_str.parse().ok()?;
        return Some(ParsedIdentifier::Symbol {
            project_name: project_name.to_string(),
            relative_path: relative_path.to_string(),
            kind,
            symbol_name: symbol_name.to_string(),
        });
    }

    let (project_name, relative_path) = identifier.split_once('/')?;
    if !is_valid_project_name(project_name) || !is_valid_rel_path(relative_path) {
        return None;
    }
    Some(ParsedIdentifier::File {
        project_name: project_name.to_string(),
        relative_path: relative_path.to_string(),
    })
}

/// `validate(identifier) → bool` — same predicate as `parse` succeeding.
pub fn validate(identifier: &str) -> bool {
    parse(identifier).is_some()
}

/// `areCoLocated(a, b) → bool` — identifiers share the
/// `<projectName>/<relativeFilePath>` prefix (spec.md §3.2).
pub fn are_co_located(a: &str, b: &str) -> bool {
    fn file_prefix(parsed: ParsedIdentifier) -> Option<(String, String)> {
        match parsed {
            ParsedIdentifier::File {
                project_name,
                relative_path,
            } => Some((project_name, relative_path)),
            ParsedIdentifier::Symbol {
                project_name,
                relative_path,
                ..
            } => Some((project_name, relative_path)),
            ParsedIdentifier::Library { .. } => None,
        }
    }
    match (parse(a).and_then(file_prefix), parse(b).and_then(file_prefix)) {
        (Some(pa), Some(pb)) => pa == pb,
        _ => false,
    }
}
