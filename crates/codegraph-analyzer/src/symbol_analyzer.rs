//! The symbol/method analyzer (spec.md §4.4): the only analyzer required by
//! this core. Walks a tree-sitter parse tree via the language extractors and
//! turns the result into nodes, edges, and semantic tags.
//!
//! Project scoping: `AnalysisContext` carries no notion of a project, so
//! this analyzer is constructed with a fixed `project_name` (defaulting to
//! `"workspace"`) used as the first segment of every identifier it builds.
//!
//! Cross-file resolution: callees, field types, and `overrides-method` are
//! resolved intra-file only. A callee or base class defined in another file
//! falls back to an *unknown* node, matching the general "unresolved
//! callees produce edges to unknown nodes" rule (§4.4.3).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tree_sitter::Tree;

use codegraph_core::{
    build, Analyzer, AnalysisContext, AnalyzerDecl, AnalyzerResult, Attributes, Edge, Identifier,
    IdentifierContext, Kind, Language, MissingLink, Node, NullPackageResolver, PackageResolver,
    Result, SemanticTag,
};

use crate::languages::{
    AccessType, CallType, ExtractedClass, ExtractedFile, ExtractedImport, ExtractedMethod,
    ImportSourceKind, JavaScriptExtractor, LanguageExtractor, PythonExtractor,
};

const OWNED_EDGE_TYPES: &[&str] = &[
    "imports_library",
    "imports_file",
    "uses",
    "aliasOf",
    "defines",
    "contains-method",
    "contains-field",
    "calls-method",
    "accesses-field",
    "overrides-method",
    "uses-type",
    "throws",
];

const SUPPORTED_LANGUAGES: &[Language] = &[
    Language::TypeScript,
    Language::Tsx,
    Language::JavaScript,
    Language::Jsx,
    Language::Python,
];

pub struct SymbolAnalyzer {
    project_name: String,
    package_resolver: Arc<dyn PackageResolver>,
    owned_edge_types: Vec<String>,
    supported_languages: Vec<Language>,
}

impl SymbolAnalyzer {
    pub fn new(project_name: impl Into<String>, package_resolver: Arc<dyn PackageResolver>) -> Self {
        Self {
            project_name: project_name.into(),
            package_resolver,
            owned_edge_types: OWNED_EDGE_TYPES.iter().map(|s| s.to_string()).collect(),
            supported_languages: SUPPORTED_LANGUAGES.to_vec(),
        }
    }
}

impl Default for SymbolAnalyzer {
    fn default() -> Self {
        Self::new("workspace", Arc::new(NullPackageResolver))
    }
}

impl AnalyzerDecl for SymbolAnalyzer {
    fn id(&self) -> &str {
        "symbol-analyzer"
    }

    fn owned_edge_types(&self) -> &[String] {
        &self.owned_edge_types
    }

    fn supported_languages(&self) -> &[Language] {
        &self.supported_languages
    }
}

#[async_trait]
impl Analyzer for SymbolAnalyzer {
    async fn analyze(&self, context: &AnalysisContext) -> Result<AnalyzerResult> {
        if !self.supported_languages.contains(&context.language) {
            return Ok(AnalyzerResult::empty());
        }
        let Some(tree) = context.parse_result.as_ref().and_then(|p| p.downcast_ref::<Tree>()) else {
            return Ok(AnalyzerResult::empty());
        };

        let extracted = if context.language == Language::Python {
            PythonExtractor::extract(tree, &context.source_code, &context.file_path)
        } else {
            JavaScriptExtractor::extract(tree, &context.source_code, &context.file_path)
        };

        let file_ctx =
            IdentifierContext::new(self.project_name.clone(), context.file_path.clone()).with_language(context.language);
        let file_id = build(Kind::File, None, &file_ctx)?;

        let mut result = AnalyzerResult::empty();
        result.nodes.push(Node::new(
            file_id.clone(),
            Kind::File,
            file_name(&context.file_path),
            context.language,
        ));

        self.emit_imports(&extracted.imports, &file_ctx, &file_id, context.language, &mut result)
            .await?;

        // Yield so a framework-level timeout between phases can actually
        // preempt this analyzer rather than only being able to drop it after
        // the whole (otherwise fully synchronous) call returns (§5).
        tokio::task::yield_now().await;
        if context.is_cancelled() {
            return Ok(result.finalize());
        }

        emit_symbols(&extracted, &file_ctx, &file_id, context.language, &mut result)?;

        tokio::task::yield_now().await;
        if context.is_cancelled() {
            return Ok(result.finalize());
        }

        emit_classes_and_members(&extracted, &file_ctx, &file_id, context.language, &mut result)?;

        Ok(result.finalize())
    }
}

impl SymbolAnalyzer {
    async fn emit_imports(
        &self,
        imports: &[ExtractedImport],
        file_ctx: &IdentifierContext,
        file_id: &Identifier,
        language: Language,
        result: &mut AnalyzerResult,
    ) -> Result<()> {
        for import in imports {
            let source_kind = ImportSourceKind::classify(&import.specifier);
            let imported_item_count = import.items.len() + usize::from(import.is_default);

            match source_kind {
                ImportSourceKind::Relative | ImportSourceKind::AbsoluteProject => {
                    let extensions = expected_extensions(language);
                    let (candidate, attempted, found) = resolve_file_import(
                        &file_ctx.relative_path,
                        &import.specifier,
                        source_kind,
                        &extensions,
                    )
                    .await;
                    let bonus = if source_kind == ImportSourceKind::Relative { 2.0 } else { 1.5 };
                    let weight = import_weight(imported_item_count, bonus, import.is_default);

                    if found {
                        let target_ctx = IdentifierContext::new(self.project_name.clone(), candidate.clone());
                        let target_id = build(Kind::File, None, &target_ctx)?;
                        result.nodes.push(Node::new(target_id.clone(), Kind::File, file_name(&candidate), language));
                        result.edges.push(
                            Edge::new(file_id.clone(), target_id.clone(), "imports_file", file_ctx.relative_path.clone())
                                .with_weight(weight),
                        );
                        emit_imported_symbols(import, file_ctx, file_id, &target_ctx, result)?;
                    } else {
                        result.missing_links.push(MissingLink {
                            file_path: file_ctx.relative_path.clone(),
                            import_specifier: import.specifier.clone(),
                            attempted_paths: attempted,
                            expected_extensions: extensions,
                            suggestion: format!(
                                "no file resolves import '{}' from '{}'",
                                import.specifier, file_ctx.relative_path
                            ),
                        });
                    }
                }
                ImportSourceKind::Builtin | ImportSourceKind::Library => {
                    let bonus = if source_kind == ImportSourceKind::Builtin { 0.1 } else { 0.5 };
                    let weight = import_weight(imported_item_count, bonus, import.is_default);
                    let metadata = self.package_resolver.resolve(&import.specifier).await;
                    let lib_spec = match &metadata {
                        Some(m) => match &m.version {
                            Some(v) => format!("{}@{}", m.name, v),
                            None => m.name.clone(),
                        },
                        None => import.specifier.clone(),
                    };
                    let lib_id = build(Kind::Library, Some(&lib_spec), file_ctx)?;
                    result.nodes.push(Node::new(
                        lib_id.clone(),
                        Kind::Library,
                        import.specifier.clone(),
                        Language::External,
                    ));
                    result.edges.push(
                        Edge::new(file_id.clone(), lib_id, "imports_library", file_ctx.relative_path.clone())
                            .with_weight(weight),
                    );
                }
            }
        }
        Ok(())
    }
}

fn import_weight(imported_items: usize, type_bonus: f64, has_default: bool) -> f64 {
    let default_bonus = if has_default { 0.5 } else { 0.0 };
    let raw = 1.0 + 0.1 * imported_items as f64 + type_bonus + default_bonus;
    (raw * 10.0).round() / 10.0
}

fn expected_extensions(language: Language) -> Vec<String> {
    match language {
        Language::TypeScript | Language::Tsx => vec!["ts".into(), "tsx".into(), "d.ts".into()],
        Language::JavaScript | Language::Jsx => vec!["js".into(), "mjs".into(), "jsx".into(), "cjs".into()],
        Language::Python => vec!["py".into()],
        _ => Vec::new(),
    }
}

async fn resolve_file_import(
    current_file: &str,
    specifier: &str,
    source_kind: ImportSourceKind,
    extensions: &[String],
) -> (String, Vec<String>, bool) {
    // Absolute-project specifiers (`@/…`, `~/…`) resolve against the project
    // root with the alias prefix stripped; relative specifiers resolve
    // against the importing file's own directory.
    let (base_dir, rest) = match source_kind {
        ImportSourceKind::AbsoluteProject => (
            Path::new(""),
            specifier
                .strip_prefix("@/")
                .or_else(|| specifier.strip_prefix("~/"))
                .unwrap_or(specifier),
        ),
        _ => (
            Path::new(current_file).parent().unwrap_or_else(|| Path::new("")),
            specifier,
        ),
    };
    let candidate = normalize_rel(base_dir.join(rest));
    let mut attempted = Vec::new();

    if Path::new(&candidate).extension().is_some() {
        attempted.push(candidate.clone());
        if file_exists(&candidate).await {
            return (candidate, attempted, true);
        }
    }
    for ext in extensions {
        let with_ext = format!("{candidate}.{ext}");
        attempted.push(with_ext.clone());
        if file_exists(&with_ext).await {
            return (with_ext, attempted, true);
        }
    }
    for ext in extensions {
        let index = format!("{candidate}/index.{ext}");
        attempted.push(index.clone());
        if file_exists(&index).await {
            return (index, attempted, true);
        }
    }
    (candidate, attempted, false)
}

async fn file_exists(path: &str) -> bool {
    tokio::fs::metadata(path).await.is_ok()
}

fn normalize_rel(path: PathBuf) -> String {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            std::path::Component::ParentDir => {
                parts.pop();
            }
            std::path::Component::CurDir => {}
            std::path::Component::Normal(s) => parts.push(s.to_string_lossy().into_owned()),
            _ => {}
        }
    }
    parts.join("/")
}

fn emit_imported_symbols(
    import: &ExtractedImport,
    file_ctx: &IdentifierContext,
    file_id: &Identifier,
    target_ctx: &IdentifierContext,
    result: &mut AnalyzerResult,
) -> Result<()> {
    if import.is_namespace {
        return Ok(());
    }
    if let Some(alias) = &import.default_alias {
        emit_one_imported_symbol(alias, None, file_ctx, file_id, target_ctx, result)?;
    }
    for item in &import.items {
        emit_one_imported_symbol(&item.name, item.alias.as_deref(), file_ctx, file_id, target_ctx, result)?;
    }
    Ok(())
}

fn emit_one_imported_symbol(
    name: &str,
    alias: Option<&str>,
    file_ctx: &IdentifierContext,
    file_id: &Identifier,
    target_ctx: &IdentifierContext,
    result: &mut AnalyzerResult,
) -> Result<()> {
    let target_unknown = build(Kind::Unknown, Some(name), target_ctx)?;
    result.nodes.push(Node::new(target_unknown.clone(), Kind::Unknown, name, Language::Unknown));

    match alias {
        None => {
            result
                .edges
                .push(Edge::new(file_id.clone(), target_unknown, "uses", file_ctx.relative_path.clone()));
        }
        Some(alias_name) => {
            let alias_unknown = build(Kind::Unknown, Some(alias_name), file_ctx)?;
            result
                .nodes
                .push(Node::new(alias_unknown.clone(), Kind::Unknown, alias_name, Language::Unknown));
            result.edges.push(Edge::new(
                alias_unknown.clone(),
                target_unknown,
                "aliasOf",
                file_ctx.relative_path.clone(),
            ));
            let mut attrs = Attributes::new();
            attrs.set_extra("importedAs", alias_name);
            result.edges.push(
                Edge::new(file_id.clone(), alias_unknown, "uses", file_ctx.relative_path.clone())
                    .with_attributes(attrs),
            );
        }
    }
    Ok(())
}

fn emit_symbols(
    extracted: &ExtractedFile,
    file_ctx: &IdentifierContext,
    file_id: &Identifier,
    language: Language,
    result: &mut AnalyzerResult,
) -> Result<()> {
    for symbol in &extracted.symbols {
        if let Kind::Other(label) = &symbol.kind {
            if label == "Export" {
                let original_id = build(Kind::Unknown, Some(&symbol.name), file_ctx)?;
                let alias_name = symbol.export_alias.as_deref().unwrap_or(&symbol.name);
                let alias_id = build(Kind::Unknown, Some(alias_name), file_ctx)?;
                result.nodes.push(Node::new(alias_id.clone(), Kind::Unknown, alias_name, language));
                result
                    .edges
                    .push(Edge::new(alias_id.clone(), original_id, "aliasOf", file_ctx.relative_path.clone()));
                result
                    .edges
                    .push(Edge::new(file_id.clone(), alias_id, "defines", file_ctx.relative_path.clone()));
                continue;
            }
        }

        let symbol_id = build(symbol.kind.clone(), Some(&symbol.name), file_ctx)?;
        let mut attrs = Attributes::new();
        attrs.cyclomatic_complexity = symbol.complexity;
        let node = Node::new(symbol_id.clone(), symbol.kind.clone(), symbol.name.clone(), language)
            .with_location(symbol.location)
            .with_attributes(attrs);
        result.nodes.push(node);
        result
            .edges
            .push(Edge::new(file_id.clone(), symbol_id, "defines", file_ctx.relative_path.clone()));
    }
    Ok(())
}

fn emit_classes_and_members(
    extracted: &ExtractedFile,
    file_ctx: &IdentifierContext,
    file_id: &Identifier,
    language: Language,
    result: &mut AnalyzerResult,
) -> Result<()> {
    for class in &extracted.classes {
        emit_class(class, file_ctx, file_id, language, result)?;
    }

    for method in &extracted.methods {
        emit_method(method, extracted, file_ctx, file_id, language, result)?;
    }

    for field in &extracted.fields {
        let class_id = build(Kind::Class, Some(&field.class_name), file_ctx)?;
        let field_symbol = format!("{}.{}", field.class_name, field.name);
        let field_id = build(Kind::Field, Some(&field_symbol), file_ctx)?;

        let mut attrs = Attributes::new();
        attrs.visibility = Some(field.visibility);
        attrs.has_initializer = Some(field.has_initializer);
        attrs.type_annotation = field.type_annotation.clone();

        result.nodes.push(
            Node::new(field_id.clone(), Kind::Field, field.name.clone(), language)
                .with_location(field.location)
                .with_attributes(attrs),
        );
        result
            .edges
            .push(Edge::new(file_id.clone(), field_id.clone(), "defines", file_ctx.relative_path.clone()));
        result
            .edges
            .push(Edge::new(class_id, field_id.clone(), "contains-field", file_ctx.relative_path.clone()));

        if let Some(type_name) = &field.type_annotation {
            emit_uses_type(&[type_name.as_str()], extracted, file_ctx, &field_id, result)?;
        }
    }

    Ok(())
}

fn emit_class(
    class: &ExtractedClass,
    file_ctx: &IdentifierContext,
    file_id: &Identifier,
    language: Language,
    result: &mut AnalyzerResult,
) -> Result<()> {
    let class_id = build(Kind::Class, Some(&class.name), file_ctx)?;
    result.nodes.push(
        Node::new(class_id.clone(), Kind::Class, class.name.clone(), language).with_location(class.location),
    );
    result
        .edges
        .push(Edge::new(file_id.clone(), class_id, "defines", file_ctx.relative_path.clone()));
    Ok(())
}

fn emit_method(
    method: &ExtractedMethod,
    extracted: &ExtractedFile,
    file_ctx: &IdentifierContext,
    file_id: &Identifier,
    language: Language,
    result: &mut AnalyzerResult,
) -> Result<()> {
    let class_id = build(Kind::Class, Some(&method.class_name), file_ctx)?;
    let method_symbol = format!("{}.{}", method.class_name, method.name);
    let method_id = build(Kind::Method, Some(&method_symbol), file_ctx)?;

    let mut attrs = Attributes::new();
    attrs.parameters = Some(method.parameters.clone());
    attrs.return_type = method.return_type.clone();
    attrs.is_static = Some(method.is_static);
    attrs.is_async = Some(method.is_async);
    attrs.visibility = Some(method.visibility);
    attrs.cyclomatic_complexity = Some(method.complexity);

    result.nodes.push(
        Node::new(method_id.clone(), Kind::Method, method_symbol.clone(), language)
            .with_location(method.location)
            .with_attributes(attrs),
    );
    result
        .edges
        .push(Edge::new(file_id.clone(), method_id.clone(), "defines", file_ctx.relative_path.clone()));
    result
        .edges
        .push(Edge::new(class_id, method_id.clone(), "contains-method", file_ctx.relative_path.clone()));

    emit_semantic_tags(method, &method_id, result);
    emit_calls(method, extracted, file_ctx, &method_id, result)?;
    emit_field_accesses(method, file_ctx, &method_id, result)?;
    emit_throws(method, file_ctx, &method_id, result)?;
    emit_overrides(method, extracted, file_ctx, &method_id, result)?;

    let mut referenced_types: Vec<&str> = method.parameters.iter().filter_map(|p| p.type_annotation.as_deref()).collect();
    if let Some(rt) = &method.return_type {
        referenced_types.push(rt.as_str());
    }
    emit_uses_type(&referenced_types, extracted, file_ctx, &method_id, result)?;

    Ok(())
}

/// Emits `uses-type` edges for type annotations that resolve to a class
/// declared in the same file (§4.4, owned edge type list). Cross-file type
/// references are not resolved here and produce no edge, matching the
/// method analyzer's intra-file-first resolution policy used for calls.
fn emit_uses_type(
    referenced_types: &[&str],
    extracted: &ExtractedFile,
    file_ctx: &IdentifierContext,
    from_id: &Identifier,
    result: &mut AnalyzerResult,
) -> Result<()> {
    for type_name in referenced_types {
        let bare = type_name.trim().trim_end_matches("[]").trim_end_matches('?');
        if extracted.classes.iter().any(|c| c.name == bare) {
            let type_id = build(Kind::Class, Some(bare), file_ctx)?;
            result
                .edges
                .push(Edge::new(from_id.clone(), type_id, "uses-type", file_ctx.relative_path.clone()));
        }
    }
    Ok(())
}

fn emit_semantic_tags(method: &ExtractedMethod, method_id: &Identifier, result: &mut AnalyzerResult) {
    let id = method_id.as_str();
    if method.is_constructor {
        result.semantic_tags.push(SemanticTag::new(id, "constructor"));
    }
    if method.is_static {
        result.semantic_tags.push(SemanticTag::new(id, "static-method"));
    }
    if method.is_async {
        result.semantic_tags.push(SemanticTag::new(id, "async-method"));
    }
    if is_accessor(&method.name, method.parameters.len()) {
        result.semantic_tags.push(SemanticTag::new(id, "accessor"));
    }
    if method.complexity > 10 {
        result.semantic_tags.push(SemanticTag::new(id, "high-complexity"));
    }
    if method.self_recursive {
        result.semantic_tags.push(SemanticTag::new(id, "recursive"));
    }
    if is_pure_heuristic(method) {
        result.semantic_tags.push(SemanticTag::new(id, "pure-function").heuristic());
    }
}

fn is_accessor(name: &str, arity: usize) -> bool {
    (name.starts_with("get") && arity == 0) || (name.starts_with("set") && arity == 1)
}

/// Best-effort `pure-function` check (§4.4.3): no writes to `this`/`self`
/// fields and no calls at all (a call might be to an impure method or
/// builtin I/O; without whole-program impurity analysis, any call is
/// treated conservatively as disqualifying).
fn is_pure_heuristic(method: &ExtractedMethod) -> bool {
    !method.field_accesses.iter().any(|a| a.is_write) && method.calls.is_empty()
}

fn emit_calls(
    method: &ExtractedMethod,
    extracted: &ExtractedFile,
    file_ctx: &IdentifierContext,
    method_id: &Identifier,
    result: &mut AnalyzerResult,
) -> Result<()> {
    for call in &method.calls {
        let call_type = match call.call_type {
            CallType::This => "this",
            CallType::Super => "super",
            CallType::Direct => "direct",
            CallType::Static => "static",
        };

        let callee_class = match call.call_type {
            CallType::This | CallType::Static => Some(method.class_name.as_str()),
            CallType::Super => extracted
                .classes
                .iter()
                .find(|c| c.name == method.class_name)
                .and_then(|c| c.extends.as_deref()),
            CallType::Direct => None,
        };

        let resolved = callee_class
            .and_then(|class_name| extracted.methods.iter().find(|m| m.class_name == class_name && m.name == call.callee));

        let callee_id = match resolved {
            Some(resolved) => build(Kind::Method, Some(&format!("{}.{}", resolved.class_name, resolved.name)), file_ctx)?,
            None => {
                let unknown_id = build(Kind::Unknown, Some(&call.callee), file_ctx)?;
                result
                    .nodes
                    .push(Node::new(unknown_id.clone(), Kind::Unknown, call.callee.clone(), Language::Unknown));
                unknown_id
            }
        };

        let mut attrs = Attributes::new();
        attrs.set_extra("callType", call_type);
        result.edges.push(
            Edge::new(method_id.clone(), callee_id, "calls-method", file_ctx.relative_path.clone())
                .with_attributes(attrs),
        );
    }
    Ok(())
}

fn emit_field_accesses(
    method: &ExtractedMethod,
    file_ctx: &IdentifierContext,
    method_id: &Identifier,
    result: &mut AnalyzerResult,
) -> Result<()> {
    for access in &method.field_accesses {
        let access_type = match access.access_type {
            AccessType::This => "this",
            AccessType::Super => "super",
            AccessType::Static => "static",
        };
        let field_symbol = format!("{}.{}", method.class_name, access.field);
        let field_id = build(Kind::Field, Some(&field_symbol), file_ctx)?;

        let mut attrs = Attributes::new();
        attrs.set_extra("accessType", access_type);
        attrs.set_extra("isWrite", access.is_write);
        result.edges.push(
            Edge::new(method_id.clone(), field_id, "accesses-field", file_ctx.relative_path.clone())
                .with_attributes(attrs),
        );
    }
    Ok(())
}

fn emit_throws(
    method: &ExtractedMethod,
    file_ctx: &IdentifierContext,
    method_id: &Identifier,
    result: &mut AnalyzerResult,
) -> Result<()> {
    for error_type in &method.throws {
        let error_id = build(Kind::Unknown, Some(error_type), file_ctx)?;
        result
            .nodes
            .push(Node::new(error_id.clone(), Kind::Unknown, error_type.clone(), Language::Unknown));
        result
            .edges
            .push(Edge::new(method_id.clone(), error_id, "throws", file_ctx.relative_path.clone()));
    }
    Ok(())
}

fn emit_overrides(
    method: &ExtractedMethod,
    extracted: &ExtractedFile,
    file_ctx: &IdentifierContext,
    method_id: &Identifier,
    result: &mut AnalyzerResult,
) -> Result<()> {
    let Some(base_class) = extracted
        .classes
        .iter()
        .find(|c| c.name == method.class_name)
        .and_then(|c| c.extends.as_deref())
    else {
        return Ok(());
    };

    if let Some(base_method) = extracted
        .methods
        .iter()
        .find(|m| m.class_name == base_class && m.name == method.name && m.parameters.len() == method.parameters.len())
    {
        let base_symbol = format!("{}.{}", base_method.class_name, base_method.name);
        let base_id = build(Kind::Method, Some(&base_symbol), file_ctx)?;
        result
            .edges
            .push(Edge::new(method_id.clone(), base_id, "overrides-method", file_ctx.relative_path.clone()));
    }
    Ok(())
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absolute_project_import_resolves_against_project_root() {
        // The importing file lives several directories deep; an `@/…`
        // specifier must resolve against the project root (here, the crate
        // root under `cargo test`), not against the importing file's own
        // directory.
        let extensions = vec!["ts".to_string()];
        let (candidate, _attempted, found) = resolve_file_import(
            "tests/fixtures/import_resolution/src/deep/app.ts",
            "@/tests/fixtures/import_resolution/lib/helper",
            ImportSourceKind::AbsoluteProject,
            &extensions,
        )
        .await;
        assert!(found, "expected @/… to resolve from the project root");
        assert_eq!(candidate, "tests/fixtures/import_resolution/lib/helper.ts");
    }

    #[tokio::test]
    async fn tilde_prefixed_import_resolves_against_project_root() {
        let extensions = vec!["ts".to_string()];
        let (candidate, _attempted, found) = resolve_file_import(
            "tests/fixtures/import_resolution/src/deep/app.ts",
            "~/tests/fixtures/import_resolution/lib/helper",
            ImportSourceKind::AbsoluteProject,
            &extensions,
        )
        .await;
        assert!(found, "expected ~/… to resolve from the project root");
        assert_eq!(candidate, "tests/fixtures/import_resolution/lib/helper.ts");
    }

    #[tokio::test]
    async fn relative_import_still_resolves_against_importing_dir() {
        let extensions = vec!["ts".to_string()];
        let (candidate, _attempted, found) = resolve_file_import(
            "tests/fixtures/import_resolution/app.ts",
            "./util",
            ImportSourceKind::Relative,
            &extensions,
        )
        .await;
        assert!(found);
        assert_eq!(candidate, "tests/fixtures/import_resolution/util.ts");
    }
}
