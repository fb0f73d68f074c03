// ABOUTME: Extracts imports, classes, symbols, methods and fields from
// ABOUTME: Python source via a tree-sitter AST walk.

use codegraph_core::{Kind, Parameter, Visibility};
use tree_sitter::{Node, Tree};

use super::extractor_utils::{location_for, node_text};
use super::{
    AccessType, CallType, ExtractedCall, ExtractedClass, ExtractedField, ExtractedFieldAccess,
    ExtractedFile, ExtractedImport, ExtractedImportedItem, ExtractedMethod, ExtractedSymbol,
    LanguageExtractor,
};
use crate::complexity::calculate_cyclomatic_complexity;

pub struct PythonExtractor;

impl LanguageExtractor for PythonExtractor {
    fn extract(tree: &Tree, content: &str, file_path: &str) -> ExtractedFile {
        let mut file = ExtractedFile::default();
        let root = tree.root_node();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            walk_top_level(child, content, file_path, &[], &mut file);
        }
        file
    }
}

fn walk_top_level(node: Node, content: &str, file_path: &str, decorators: &[String], file: &mut ExtractedFile) {
    match node.kind() {
        "import_statement" => extract_import(node, content, file_path, file),
        "import_from_statement" => extract_import_from(node, content, file_path, file),
        "class_definition" => extract_class(node, content, file_path, file),
        "function_definition" => extract_function_symbol(node, content, file_path, decorators, file),
        "decorated_definition" => {
            let names = decorator_names(node, content);
            if let Some(inner) = node.child_by_field_name("definition") {
                walk_top_level(inner, content, file_path, &names, file);
            }
        }
        _ => {}
    }
}

fn decorator_names(node: Node, content: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if child.kind() == "decorator" {
            if let Some(expr) = child.named_child(0) {
                names.push(node_text(&expr, content).to_string());
            }
        }
    }
    names
}

fn extract_import(node: Node, content: &str, file_path: &str, file: &mut ExtractedFile) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" => {
                let specifier = node_text(&child, content).to_string();
                file.imports.push(ExtractedImport {
                    specifier,
                    items: Vec::new(),
                    is_namespace: false,
                    namespace_alias: None,
                    is_default: false,
                    default_alias: None,
                    location: location_for(&node, file_path),
                });
            }
            "aliased_import" => {
                let Some(name_node) = child.child_by_field_name("name") else { continue };
                let specifier = node_text(&name_node, content).to_string();
                let alias = child.child_by_field_name("alias").map(|a| node_text(&a, content).to_string());
                file.imports.push(ExtractedImport {
                    specifier,
                    items: Vec::new(),
                    is_namespace: false,
                    namespace_alias: alias.clone(),
                    is_default: alias.is_some(),
                    default_alias: alias,
                    location: location_for(&node, file_path),
                });
            }
            _ => {}
        }
    }
}

fn extract_import_from(node: Node, content: &str, file_path: &str, file: &mut ExtractedFile) {
    let module = node
        .child_by_field_name("module_name")
        .map(|m| node_text(&m, content).to_string())
        .unwrap_or_else(|| ".".to_string());

    let mut items = Vec::new();
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "dotted_name" if child.id() != node.child_by_field_name("module_name").map(|m| m.id()).unwrap_or(0) => {
                items.push(ExtractedImportedItem { name: node_text(&child, content).to_string(), alias: None });
            }
            "aliased_import" => {
                let Some(name_node) = child.child_by_field_name("name") else { continue };
                let alias = child.child_by_field_name("alias").map(|a| node_text(&a, content).to_string());
                items.push(ExtractedImportedItem { name: node_text(&name_node, content).to_string(), alias });
            }
            _ => {}
        }
    }

    file.imports.push(ExtractedImport {
        specifier: module,
        items,
        is_namespace: false,
        namespace_alias: None,
        is_default: false,
        default_alias: None,
        location: location_for(&node, file_path),
    });
}

fn extract_class(node: Node, content: &str, file_path: &str, file: &mut ExtractedFile) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let class_name = node_text(&name_node, content).to_string();

    let extends = node.child_by_field_name("superclasses").and_then(|args| {
        let mut cursor = args.walk();
        args.named_children(&mut cursor)
            .find(|c| c.kind() == "identifier")
            .map(|n| node_text(&n, content).to_string())
    });

    file.classes.push(ExtractedClass {
        name: class_name.clone(),
        extends,
        exported: !class_name.starts_with('_'),
        location: location_for(&node, file_path),
    });

    if let Some(body) = node.child_by_field_name("body") {
        let mut cursor = body.walk();
        for member in body.children(&mut cursor) {
            walk_class_member(member, content, file_path, &class_name, &[], file);
        }
    }
}

fn walk_class_member(
    node: Node,
    content: &str,
    file_path: &str,
    class_name: &str,
    decorators: &[String],
    file: &mut ExtractedFile,
) {
    match node.kind() {
        "function_definition" => extract_method(node, content, file_path, class_name, decorators, file),
        "decorated_definition" => {
            let names = decorator_names(node, content);
            if let Some(inner) = node.child_by_field_name("definition") {
                walk_class_member(inner, content, file_path, class_name, &names, file);
            }
        }
        "expression_statement" => {
            if let Some(assignment) = node.named_child(0) {
                if assignment.kind() == "assignment" {
                    extract_field(assignment, content, file_path, class_name, file);
                }
            }
        }
        _ => {}
    }
}

fn extract_field(node: Node, content: &str, file_path: &str, class_name: &str, file: &mut ExtractedFile) {
    let Some(left) = node.child_by_field_name("left") else {
        return;
    };
    if left.kind() != "identifier" {
        return;
    }
    let name = node_text(&left, content).to_string();
    let type_annotation = node.child_by_field_name("type").map(|t| node_text(&t, content).to_string());
    let has_initializer = node.child_by_field_name("right").is_some();

    file.fields.push(ExtractedField {
        class_name: class_name.to_string(),
        name: name.clone(),
        visibility: if name.starts_with('_') { Visibility::Private } else { Visibility::Public },
        has_initializer,
        type_annotation,
        location: location_for(&node, file_path),
    });
}

fn extract_method(
    node: Node,
    content: &str,
    file_path: &str,
    class_name: &str,
    decorators: &[String],
    file: &mut ExtractedFile,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let method_name = node_text(&name_node, content).to_string();

    let is_static = decorators.iter().any(|d| d == "staticmethod" || d == "classmethod");
    let mut modifier_cursor = node.walk();
    let is_async = node.children(&mut modifier_cursor).any(|c| c.kind() == "async");
    let visibility = if method_name.starts_with("__") && method_name.ends_with("__") {
        Visibility::Public
    } else if method_name.starts_with('_') {
        Visibility::Private
    } else {
        Visibility::Public
    };

    let parameters = node
        .child_by_field_name("parameters")
        .map(|params| extract_parameters(params, content))
        .unwrap_or_default();
    let return_type = node.child_by_field_name("return_type").map(|t| node_text(&t, content).to_string());
    let is_constructor = method_name == "__init__";

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
    if node.kind() == "raise_statement" {
        if let Some(arg) = node.named_child(0) {
            let name = match arg.kind() {
                "call" => arg.child_by_field_name("function").map(|f| node_text(&f, content).to_string()),
                "identifier" => Some(node_text(&arg, content).to_string()),
                _ => None,
            };
            if let Some(name) = name {
                out.push(name);
            }
        }
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_throws(child, content, out);
    }
}

fn extract_function_symbol(
    node: Node,
    content: &str,
    file_path: &str,
    _decorators: &[String],
    file: &mut ExtractedFile,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let name = node_text(&name_node, content).to_string();
    let complexity = node.child_by_field_name("body").map(|b| calculate_cyclomatic_complexity(&b, content));

    file.symbols.push(ExtractedSymbol {
        kind: Kind::Function,
        name: name.clone(),
        exported: !name.starts_with('_'),
        export_alias: None,
        complexity,
        location: location_for(&node, file_path),
    });
}

fn extract_parameters(params_node: Node, content: &str) -> Vec<Parameter> {
    let mut out = Vec::new();
    let mut cursor = params_node.walk();
    for param in params_node.children(&mut cursor) {
        let (target, type_annotation) = match param.kind() {
            "identifier" => (Some(param), None),
            "typed_parameter" => (
                param.named_child(0),
                param.child_by_field_name("type").map(|t| node_text(&t, content).to_string()),
            ),
            "default_parameter" | "typed_default_parameter" => (
                param.child_by_field_name("name"),
                param.child_by_field_name("type").map(|t| node_text(&t, content).to_string()),
            ),
            _ => continue,
        };
        let Some(target) = target else { continue };
        if target.kind() != "identifier" {
            continue;
        }
        let name = node_text(&target, content).to_string();
        if name == "self" || name == "cls" {
            continue;
        }
        out.push(Parameter { name, type_annotation });
    }
    out
}

fn classify_call(func: &Node, content: &str, class_name: &str) -> (String, CallType) {
    match func.kind() {
        "attribute" => {
            let object = func.child_by_field_name("object");
            let attribute = func.child_by_field_name("attribute");
            let attr_text = attribute.map(|a| node_text(&a, content).to_string()).unwrap_or_default();
            match object {
                Some(obj) if obj.kind() == "identifier" && node_text(&obj, content) == "self" => {
                    (attr_text, CallType::This)
                }
                Some(obj) if obj.kind() == "identifier" && node_text(&obj, content) == "cls" => {
                    (attr_text, CallType::Static)
                }
                Some(obj) if is_super_call(&obj, content) => (attr_text, CallType::Super),
                Some(obj) if node_text(&obj, content) == class_name => (attr_text, CallType::Static),
                Some(obj) => (format!("{}.{}", node_text(&obj, content), attr_text), CallType::Direct),
                None => (attr_text, CallType::Direct),
            }
        }
        _ => (node_text(func, content).to_string(), CallType::Direct),
    }
}

fn is_super_call(node: &Node, content: &str) -> bool {
    node.kind() == "call" && node.child_by_field_name("function").map(|f| node_text(&f, content)) == Some("super")
}

fn classify_access(node: &Node, content: &str, class_name: &str, is_write: bool) -> Option<ExtractedFieldAccess> {
    let object = node.child_by_field_name("object")?;
    let attribute = node.child_by_field_name("attribute")?;
    let field = node_text(&attribute, content).to_string();
    let access_type = if object.kind() == "identifier" && node_text(&object, content) == "self" {
        AccessType::This
    } else if is_super_call(&object, content) {
        AccessType::Super
    } else if node_text(&object, content) == class_name {
        AccessType::Static
    } else {
        return None;
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
        "call" => {
            if let Some(func) = node.child_by_field_name("function") {
                let (callee, call_type) = classify_call(&func, content, class_name);
                if call_type == CallType::This && callee == method_name {
                    *self_recursive = true;
                }
                calls.push(ExtractedCall { callee, call_type });
                // The callee's object may itself be a call
                // (`self.get_child().render()`); walk into it so
                // chained calls aren't dropped. Only the object, not
                // `func` itself, to avoid reclassifying the callee as
                // an attribute access.
                if func.kind() == "attribute" {
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
        "assignment" => {
            if let Some(left) = node.child_by_field_name("left") {
                if left.kind() == "attribute" {
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
        "attribute" => {
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
        parser.set_language(&tree_sitter_python::LANGUAGE.into()).unwrap();
        parser.parse(content, None).unwrap()
    }

    #[test]
    fn extracts_from_import_with_alias() {
        let src = "from collections import OrderedDict as OD\n";
        let tree = parse(src);
        let file = PythonExtractor::extract(&tree, src, "a.py");
        assert_eq!(file.imports.len(), 1);
        assert_eq!(file.imports[0].specifier, "collections");
        assert_eq!(file.imports[0].items[0].alias.as_deref(), Some("OD"));
    }

    #[test]
    fn extracts_class_with_field_access_and_inheritance() {
        let src = r#"
class Widget(Base):
    def __init__(self):
        self.count = 0

    def bump(self):
        self.count = self.count + 1
        return self.helper()

    def helper(self):
        return 1
"#;
        let tree = parse(src);
        let file = PythonExtractor::extract(&tree, src, "a.py");
        assert_eq!(file.classes.len(), 1);
        assert_eq!(file.classes[0].extends.as_deref(), Some("Base"));
        assert_eq!(file.methods.len(), 3);
        let bump = file.methods.iter().find(|m| m.name == "bump").unwrap();
        assert!(bump.field_accesses.iter().any(|a| a.field == "count" && a.is_write));
        assert!(bump.calls.iter().any(|c| c.callee == "helper" && c.call_type == CallType::This));
    }

    #[test]
    fn chained_call_captures_both_calls() {
        let src = r#"
class Widget:
    def render(self):
        return self.get_child().render()

    def get_child(self):
        return None
"#;
        let tree = parse(src);
        let file = PythonExtractor::extract(&tree, src, "a.py");
        let render = file.methods.iter().find(|m| m.name == "render").unwrap();
        assert_eq!(render.calls.len(), 2);
        assert!(render.calls.iter().any(|c| c.callee == "get_child" && c.call_type == CallType::This));
        assert!(render.calls.iter().any(|c| c.callee.ends_with("render")));
        assert!(!render.field_accesses.iter().any(|a| a.field == "get_child"));
    }

    #[test]
    fn detects_self_recursive_method() {
        let src = r#"
class Tree:
    def sum(self, n):
        if n <= 0:
            return 0
        return n + self.sum(n - 1)
"#;
        let tree = parse(src);
        let file = PythonExtractor::extract(&tree, src, "a.py");
        let sum = file.methods.iter().find(|m| m.name == "sum").unwrap();
        assert!(sum.self_recursive);
        assert!(sum.complexity >= 2);
    }
}
