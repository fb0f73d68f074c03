// ABOUTME: Language extractor modules and the common extracted-file shape
// ABOUTME: they all produce for the symbol analyzer to turn into nodes/edges.

pub mod extractor_utils;
pub mod javascript;
pub mod python;

use codegraph_core::{Kind, Parameter, SourceLocation, Visibility};

/// How an import specifier classifies by prefix (§4.4.1 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSourceKind {
    Relative,
    AbsoluteProject,
    Builtin,
    Library,
}

impl ImportSourceKind {
    pub fn classify(specifier: &str) -> Self {
        if specifier.starts_with("./") || specifier.starts_with("../") {
            ImportSourceKind::Relative
        } else if specifier.starts_with("@/") || specifier.starts_with("~/") {
            ImportSourceKind::AbsoluteProject
        } else if matches!(specifier, "fs" | "path" | "os" | "crypto") || specifier.starts_with("node:") {
            ImportSourceKind::Builtin
        } else {
            ImportSourceKind::Library
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractedImportedItem {
    pub name: String,
    pub alias: Option<String>,
}

/// One import statement (§4.4.1).
#[derive(Debug, Clone)]
pub struct ExtractedImport {
    pub specifier: String,
    pub items: Vec<ExtractedImportedItem>,
    pub is_namespace: bool,
    pub namespace_alias: Option<String>,
    pub is_default: bool,
    pub default_alias: Option<String>,
    pub location: SourceLocation,
}

/// A top-level, non-class, non-method declaration (§4.4.2): function,
/// interface, type alias, or exported variable.
#[derive(Debug, Clone)]
pub struct ExtractedSymbol {
    pub kind: Kind,
    pub name: String,
    pub exported: bool,
    pub export_alias: Option<String>,
    pub complexity: Option<u32>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ExtractedClass {
    pub name: String,
    pub extends: Option<String>,
    pub exported: bool,
    pub location: SourceLocation,
}

/// Syntactic form of a call expression (§4.4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallType {
    This,
    Super,
    Direct,
    Static,
}

#[derive(Debug, Clone)]
pub struct ExtractedCall {
    pub callee: String,
    pub call_type: CallType,
}

/// Syntactic form of a field access (§4.4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessType {
    This,
    Super,
    Static,
}

#[derive(Debug, Clone)]
pub struct ExtractedFieldAccess {
    pub field: String,
    pub access_type: AccessType,
    pub is_write: bool,
}

#[derive(Debug, Clone)]
pub struct ExtractedMethod {
    pub class_name: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<String>,
    pub is_static: bool,
    pub is_async: bool,
    pub visibility: Visibility,
    pub is_constructor: bool,
    pub complexity: u32,
    pub calls: Vec<ExtractedCall>,
    pub field_accesses: Vec<ExtractedFieldAccess>,
    pub throws: Vec<String>,
    pub self_recursive: bool,
    pub location: SourceLocation,
}

#[derive(Debug, Clone)]
pub struct ExtractedField {
    pub class_name: String,
    pub name: String,
    pub visibility: Visibility,
    pub has_initializer: bool,
    pub type_annotation: Option<String>,
    pub location: SourceLocation,
}

/// Everything extracted from one file, independent of source language. The
/// symbol analyzer (`crate::symbol_analyzer`) turns this into nodes and
/// edges per the identifier grammar.
#[derive(Debug, Clone, Default)]
pub struct ExtractedFile {
    pub imports: Vec<ExtractedImport>,
    pub classes: Vec<ExtractedClass>,
    pub symbols: Vec<ExtractedSymbol>,
    pub methods: Vec<ExtractedMethod>,
    pub fields: Vec<ExtractedField>,
}

pub trait LanguageExtractor {
    fn extract(tree: &tree_sitter::Tree, content: &str, file_path: &str) -> ExtractedFile;
}

pub use javascript::JavaScriptExtractor;
pub use python::PythonExtractor;
