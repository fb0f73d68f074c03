// ABOUTME: Cyclomatic complexity calculation from tree-sitter AST nodes
// ABOUTME: Single-pass calculation during AST traversal for method/function bodies

use tree_sitter::Node;

/// Calculate cyclomatic complexity from a tree-sitter AST node.
/// Formula: 1 + count(decision_points), per the method/field analysis rule
/// (`if`, `for`, `while`, `do-while`, `case`, `catch`, `&&`, `||`, ternary).
pub fn calculate_cyclomatic_complexity(node: &Node, content: &str) -> u32 {
    1 + count_decision_points(node, content)
}

fn count_decision_points(node: &Node, content: &str) -> u32 {
    let kind = node.kind();
    let mut count = if is_decision_point(kind) { 1 } else { 0 };

    if matches!(kind, "binary_expression" | "boolean_operator") {
        if let Ok(text) = node.utf8_text(content.as_bytes()) {
            let mut cursor = node.walk();
            let mut found_operator_node = false;
            if cursor.goto_first_child() {
                loop {
                    let child = cursor.node();
                    if matches!(child.kind(), "&&" | "||" | "and" | "or") {
                        count += 1;
                        found_operator_node = true;
                    }
                    if !cursor.goto_next_sibling() {
                        break;
                    }
                }
            }
            if !found_operator_node && (text.contains("&&") || text.contains("||")) {
                count += text.matches("&&").count() as u32;
                count += text.matches("||").count() as u32;
            }
        }
    }

    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            count += count_decision_points(&cursor.node(), content);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }

    count
}

/// Check if a node kind represents a decision point (branch in control flow),
/// across the tree-sitter grammars for TypeScript/TSX, JavaScript/JSX, and
/// Python.
fn is_decision_point(kind: &str) -> bool {
    matches!(
        kind,
        "if_statement"
            | "elif_clause"
            | "while_statement"
            | "do_statement"
            | "for_statement"
            | "for_in_statement"
            | "for_of_statement"
            | "switch_case"
            | "switch_default"
            | "ternary_expression"
            | "conditional_expression"
            | "catch_clause"
            | "except_clause"
            | "case_clause"
    )
}
