// ABOUTME: Extracts imports, classes, symbols, methods and fields from
// ABOUTME: TypeScript/TSX/JavaScript/JSX source via a tree-sitter AST walk.

use codegraph_core::{Kind, Parameter, Visibility};
use tree_sitter::{Node, Tree};

use super::extractor_utils::{child_by_kind, child_text_by_field, location_for, node_text};
use super::{
    AccessType, CallType, ExtractedCall, ExtractedClass, ExtractedField, ExtractedFieldAccess,
    ExtractedFile, ExtractedImport, ExtractedImportedItem, ExtractedMethod, ExtractedSymbol,
    LanguageExtractor,
};
use crate::complexity::calculate_cyclomatic_complexity;

pub struct JavaScriptExtractor;

impl LanguageExtractor for JavaScriptExtractor {
    fn extract(tree: &Tree, content: &str, file_path: &str) -> ExtractedFile {
        let mut file = ExtractedFile::default();
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            walk_top_level(child, content, file_path, false, &mut file);
        }
        file
    }
}

fn walk_top_level(node: Node, content: &str, file_path: &str, exported: bool, file: &mut ExtractedFile) {
    match node.kind() {
        "import_statement" => extract_import(node, content, file_path, file),
        "export_statement" => extract_export(node, content, file_path, file),
        "class_declaration" | "abstract_class_declaration" => {
            extract_class(node, content, file_path, exported, file)
        }
        "function_declaration" | "generator_function_declaration" => {
            extract_function_symbol(node, content, file_path, exported, file)
        }
        "interface_declaration" => {
            extract_simple_symbol(node, content, file_path, Kind::Interface, exported, file)
        }
        "type_alias_declaration" => extract_simple_symbol(
            node,
            content,
            file_path,
            Kind::Other("TypeAlias".to_string()),
            exported,
            file,
        ),
        "lexical_declaration" | "variable_declaration" if exported => {
            extract_variable_symbols(node, content, file_path, file)
        }
        _ => {}
    }
}

fn extract_import(node: Node, content: &str, file_path: &str, file: &mut ExtractedFile) {
    let Some(source_node) = node.child_by_field_name("source") else {
        return;
    };
    let specifier = node_text(&source_node, content).trim_matches(|c| c == '"' || c == '\'').to_string();

    let mut items = Vec::new();
    let mut is_namespace = false;
    let mut namespace_alias = None;
    let mut is_default = false;
    let mut default_alias = None;

    if let Some(clause) = node.child_by_field_name("import_clause") {
        let mut cursor = clause.walk();
        for part in clause.children(&mut cursor) {
            match part.kind() {
                "identifier" => {
                    is_default = true;
                    default_alias = Some(node_text(&part, content).to_string());
                }
                "namespace_import" => {
                    is_namespace = true;
                    namespace_alias = child_by_kind(&part, "identifier").map(|n| node_text(&n, content).to_string());
                }
                "named_imports" => {
                    let mut spec_cursor = part.walk();
                    for spec in part.children(&mut spec_cursor) {
                        if spec.kind() == "import_specifier" {
                            let name = child_text_by_field(&spec, "name", content).unwrap_or_default();
                            let alias = child_text_by_field(&spec, "alias", content);
                            items.push(ExtractedImportedItem { name, alias });
                        }
                    }
                }
                _ => {}
            }
        }
    }

    file.imports.push(ExtractedImport {
        specifier,
        items,
        is_namespace,
        namespace_alias,
        is_default,
        default_alias,
        location: location_for(&node, file_path),
    });
}

fn extract_export(node: Node, content: &str, file_path: &str, file: &mut ExtractedFile) {
    if let Some(decl) = node.child_by_field_name("declaration") {
        walk_top_level(decl, content, file_path, true, file);
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "export_clause" {
            let mut spec_cursor = child.walk();
            for spec in child.children(&mut spec_cursor) {
                if spec.kind() == "export_specifier" {
                    let name = child_text_by_field(&spec, "name", content).unwrap_or_default();
                    let alias = child_text_by_field(&spec, "alias", content);
                    file.symbols.push(ExtractedSymbol {
                        kind: Kind::Other("Export".to_string()),
                        name,
                        exported: true,
                        export_alias: alias,
                        complexity: None,
                        location: location_for(&spec, file_path),
                    });
                }
            }
        }
    }
}

fn extract_class(node: Node, content: &str, file_path: &str, exported: bool, file: &mut ExtractedFile) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let class_name = node_text(&name_node, content).to_string();

    let extends = child_by_kind(&node, "class_heritage").and_then(|heritage| {
        child_by_kind(&heritage, "extends_clause")
            .and_then(|clause| clause.child_by_field_name("value"))
            .map(|value| node_text(&value, content).to_string())
    });

    file.classes.push(ExtractedClass {
        name: class_name.clone(),
        extends,
        exported,
        location: location_for(&node, file_path),
    });

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            match member.kind() {
                "method_definition" => extract_method(member, content, file_path, &class_name, file),
                "public_field_definition" | "field_definition" => {
                    extract_field(member, content, file_path, &class_name, file)
                }
                _ => {}
            }
        }
    }
}

fn extract_method(node: Node, content: &str, file_path: &str, class_name: &str, file: &mut ExtractedFile) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let method_name = node_text(&name_node, content).to_string();

    let mut is_static = false;
    let mut is_async = false;
    let mut visibility = Visibility::Public;
    let mut cursor = node.walk();
    for modifier in node.children(&mut cursor) {
        match modifier.kind() {
            "static" => is_static = true,
            "async" => is_async = true,
            "accessibility_modifier" => {
                visibility = match node_text(&modifier, content) {
                    "private" => Visibility::Private,
                    "protected" => Visibility::Protected,
                    _ => Visibility::Public,
                };
            }
            _ => {}
        }
    }

    let parameters = node
        .child_by_field_name("parameters")
        .map(|params| extract_parameters(params, content))
        .unwrap_or_default();
    let return_type = node
        .child_by_field_name("return_type")
        .map(|rt| node_text(&rt, content).trim_start_matches(':').trim().to_string());

    let is_constructor = method_name == "constructor";

    let mut calls = Vec::new();
    let mut field_accesses = Vec::new();
    let mut self_recursive = false;
    let mut complexity = 0;
    let mut throws = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        complexity = calculate_cyclomatic_complexity(&body, content);
        walk_expr(
            body,
            content,
            class_name,
            &method_name,
            &mut calls,
            &mut field_accesses,
            &mut self_recursive,
        );
        collect_throws(body, content, &mut throws);
    }

    file.methods.push(ExtractedMethod {
        class_name: class_name.to_string(),
        name: method_name,
        parameters,
        return_type,
        is_static,
        is_async,
        visibility,
        is_constructor,
        complexity,
        calls,
        field_accesses,
        throws,
        self_recursive,
        location: location_for(&node, file_path),
    });
}

fn collect_throws(node: Node, content: &str, out: &mut Vec<String>) {
    if node.kind() == "throw_statement" {
        if let Some(arg) = node.named_child(0) {
            if arg.kind() == "new_expression" {
                if let Some(ctor) = arg.child_by_field_name("constructor") {
                    out.push(node_text(&ctor, content).to_string());
                }
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_throws(child, content, out);
    }
}

fn extract_field(node: Node, content: &str, file_path: &str, class_name: &str, file: &mut ExtractedFile) {
    let Some(name_node) = node.child_by_field_name("property") else {
        return;
    };
    let name = node_text(&name_node, content).to_string();

    let mut visibility = Visibility::Public;
    let mut cursor = node.walk();
    for modifier in node.children(&mut cursor) {
        if modifier.kind() == "accessibility_modifier" {
            visibility = match node_text(&modifier, content) {
                "private" => Visibility::Private,
                "protected" => Visibility::Protected,
                _ => Visibility::Public,
            };
        }
    }

    let has_initializer = node.child_by_field_name("value").is_some();
    let type_annotation = node
        .child_by_field_name("type")
        .map(|t| node_text(&t, content).trim_start_matches(':').trim().to_string());

    file.fields.push(ExtractedField {
        class_name: class_name.to_string(),
        name,
        visibility,
        has_initializer,
        type_annotation,
        location: location_for(&node, file_path),
    });
}

fn extract_function_symbol(node: Node, content: &str, file_path: &str, exported: bool, file: &mut ExtractedFile) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, content).to_string();
    let complexity = node.child_by_field_name("body").map(|b| calculate_cyclomatic_complexity(&b, content));

    file.symbols.push(ExtractedSymbol {
        kind: Kind::Function,
        name,
        exported,
        export_alias: None,
        complexity,
        location: location_for(&node, file_path),
    });
}

fn extract_simple_symbol(
    node: Node,
    content: &str,
    file_path: &str,
    kind: Kind,
    exported: bool,
    file: &mut ExtractedFile,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    file.symbols.push(ExtractedSymbol {
        kind,
        name: node_text(&name_node, content).to_string(),
        exported,
        export_alias: None,
        complexity: None,
        location: location_for(&node, file_path),
    });
}

fn extract_variable_symbols(node: Node, content: &str, file_path: &str, file: &mut ExtractedFile) {
    let mut cursor = node.walk();
    for declarator in node.children(&mut cursor) {
        if declarator.kind() == "variable_declarator" {
            if let Some(name_node) = declarator.child_by_field_name("name") {
                file.symbols.push(ExtractedSymbol {
                    kind: Kind::Other("Variable".to_string()),
                    name: node_text(&name_node, content).to_string(),
                    exported: true,
                    export_alias: None,
                    complexity: None,
                    location: location_for(&declarator, file_path),
                });
            }
        }
    }
}

fn extract_parameters(params_node: Node, content: &str) -> Vec<Parameter> {
    let mut out = Vec::new();
    let mut cursor = params_node.walk();
    for param in params_node.children(&mut cursor) {
        let target = match param.kind() {
            "required_parameter" | "optional_parameter" => param.child_by_field_name("pattern").unwrap_or(param),
            "identifier" => param,
            _ => continue,
        };
        if target.kind() != "identifier" {
            continue;
        }
        let name = node_text(&target, content).to_string();
        let type_annotation = param
            .child_by_field_name("type")
            .map(|t| node_text(&t, content).trim_start_matches(':').trim().to_string());
        out.push(Parameter { name, type_annotation });
    }
    out
}

fn classify_call(func: &Node, content: &str, class_name: &str) -> (String, CallType) {
    match func.kind() {
        "member_expression" => {
            let object = func.child_by_field_name("object");
            let property = func.child_by_field_name("property");
            let prop_text = property.map(|p| node_text(&p, content).to_string()).unwrap_or_default();
            match object {
                Some(obj) if obj.kind() == "this" => (prop_text, CallType::This),
                Some(obj) if obj.kind() == "super" => (prop_text, CallType::Super),
                Some(obj) if node_text(&obj, content) == class_name => (prop_text, CallType::Static),
                Some(obj) => (format!("{}.{}", node_text(&obj, content), prop_text), CallType::Direct),
                None => (prop_text, CallType::Direct),
            }
        }
        _ => (node_text(func, content).to_string(), CallType::Direct),
    }
}

fn classify_access(node: &Node, content: &str, class_name: &str, is_write: bool) -> Option<ExtractedFieldAccess> {
    let object = node.child_by_field_name("object")?;
    let property = node.child_by_field_name("property")?;
    let field = node_text(&property, content).to_string();
    let access_type = match object.kind() {
        "this" => AccessType::This,
        "super" => AccessType::Super,
        _ if node_text(&object, content) == class_name => AccessType::Static,
        _ => return None,
    };
    Some(ExtractedFieldAccess { field, access_type, is_write })
}

#[allow(clippy::too_many_arguments)]
fn walk_expr(
    node: Node,
    content: &str,
    class_name: &str,
    method_name: &str,
    calls: &mut Vec<ExtractedCall>,
    accesses: &mut Vec<ExtractedFieldAccess>,
    self_recursive: &mut bool,
) {
    match node.kind() {
        "call_expression" => {
            if let Some(func) = node.child_by_field_name("function") {
                let (callee, call_type) = classify_call(&func, content, class_name);
                if call_type == CallType::This && callee == method_name {
                    *self_recursive = true;
                }
                calls.push(ExtractedCall { callee, call_type });
                // The callee's object may itself be a call (`a().b()`);
                // walk into it so chained/fluent calls aren't dropped. Only
                // the object, not `func` itself, to avoid reclassifying the
                // callee as a field access.
                if func.kind() == "member_expression" {
                    if let Some(object) = func.child_by_field_name("object") {
                        walk_expr(object, content, class_name, method_name, calls, accesses, self_recursive);
                    }
                }
            }
            if let Some(args) = node.child_by_field_name("arguments") {
                walk_expr(args, content, class_name, method_name, calls, accesses, self_recursive);
            }
            return;
        }
        "assignment_expression" | "augmented_assignment_expression" => {
            if let Some(left) = node.child_by_field_name("left") {
                if left.kind() == "member_expression" {
                    if let Some(access) = classify_access(&left, content, class_name, true) {
                        accesses.push(access);
                    }
                } else {
                    walk_expr(left, content, class_name, method_name, calls, accesses, self_recursive);
                }
            }
            if let Some(right) = node.child_by_field_name("right") {
                walk_expr(right, content, class_name, method_name, calls, accesses, self_recursive);
            }
            return;
        }
        "member_expression" => {
            if let Some(access) = classify_access(&node, content, class_name, false) {
                accesses.push(access);
            }
            return;
        }
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        walk_expr(child, content, class_name, method_name, calls, accesses, self_recursive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tree_sitter::Parser;

    fn parse(content: &str) -> Tree {
        let mut parser = Parser::new();
        parser.set_language(&tree_sitter_javascript::LANGUAGE.into()).unwrap();
        parser.parse(content, None).unwrap()
    }

    #[test]
    fn extracts_named_and_default_imports() {
        let src = "import Foo, { bar, baz as qux } from './utils';";
        let tree = parse(src);
        let file = JavaScriptExtractor::extract(&tree, src, "a.js");
        assert_eq!(file.imports.len(), 1);
        let import = &file.imports[0];
        assert_eq!(import.specifier, "./utils");
        assert!(import.is_default);
        assert_eq!(import.default_alias.as_deref(), Some("Foo"));
        assert_eq!(import.items.len(), 2);
        assert_eq!(import.items[1].alias.as_deref(), Some("qux"));
    }

    #[test]
    fn extracts_class_with_method_calls_and_field_access() {
        let src = r#"
            class Widget extends Base {
                count = 0;
                render() {
                    this.count = this.count + 1;
                    return this.helper();
                }
                helper() {
                    return 1;
                }
            }
        "#;
        let tree = parse(src);
        let file = JavaScriptExtractor::extract(&tree, src, "a.js");
        assert_eq!(file.classes.len(), 1);
        assert_eq!(file.classes[0].extends.as_deref(), Some("Base"));
        assert_eq!(file.fields.len(), 1);
        assert_eq!(file.methods.len(), 2);
        let render = file.methods.iter().find(|m| m.name == "render").unwrap();
        assert!(render.field_accesses.iter().any(|a| a.field == "count" && a.is_write));
        assert!(render.calls.iter().any(|c| c.callee == "helper" && c.call_type == CallType::This));
    }

    #[test]
    fn compound_assignment_is_a_write_access() {
        let src = r#"
            class Counter {
                bump() {
                    this.count += 1;
                }
            }
        "#;
        let tree = parse(src);
        let file = JavaScriptExtractor::extract(&tree, src, "a.js");
        let bump = file.methods.iter().find(|m| m.name == "bump").unwrap();
        assert!(bump.field_accesses.iter().any(|a| a.field == "count" && a.is_write));
    }

    #[test]
    fn chained_call_captures_both_calls() {
        let src = r#"
            class Widget {
                render() {
                    return this.getChild().render();
                }
                getChild() {
                    return null;
                }
            }
        "#;
        let tree = parse(src);
        let file = JavaScriptExtractor::extract(&tree, src, "a.js");
        let render = file.methods.iter().find(|m| m.name == "render").unwrap();
        assert_eq!(render.calls.len(), 2);
        assert!(render.calls.iter().any(|c| c.callee == "getChild" && c.call_type == CallType::This));
        assert!(render.calls.iter().any(|c| c.callee.ends_with("render")));
        assert!(!render.field_accesses.iter().any(|a| a.field == "getChild"));
    }

    #[test]
    fn detects_self_recursive_method() {
        let src = r#"
            class Tree {
                sum(n) {
                    if (n <= 0) return 0;
                    return n + this.sum(n - 1);
                }
            }
        "#;
        let tree = parse(src);
        let file = JavaScriptExtractor::extract(&tree, src, "a.js");
        let sum = file.methods.iter().find(|m| m.name == "sum").unwrap();
        assert!(sum.self_recursive);
        assert!(sum.complexity >= 2);
    }
}
