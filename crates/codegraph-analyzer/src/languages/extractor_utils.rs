// ABOUTME: Shared utilities for language extractors
// ABOUTME: Common helpers to reduce boilerplate across the tree-sitter walkers

use codegraph_core::SourceLocation;
use tree_sitter::Node;

/// Extract text from a tree-sitter node.
#[inline]
pub fn node_text<'a>(node: &Node, content: &'a str) -> &'a str {
    node.utf8_text(content.as_bytes()).unwrap_or("")
}

/// Build a `SourceLocation` from a tree-sitter node, 1-indexed to match the
/// rest of the engine's position reporting.
#[inline]
pub fn location_for(node: &Node, file_path: &str) -> SourceLocation {
    SourceLocation {
        source_path: file_path.to_string(),
        start_line: (node.start_position().row + 1) as u32,
        start_column: (node.start_position().column + 1) as u32,
        end_line: (node.end_position().row + 1) as u32,
        end_column: (node.end_position().column + 1) as u32,
    }
}

/// Find the first child of a specific kind.
pub fn child_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).find(|c| c.kind() == kind)
}

/// Get the text of a child by field name.
pub fn child_text_by_field<'a>(node: &Node, field_name: &str, content: &'a str) -> Option<String> {
    node.child_by_field_name(field_name)
        .map(|child| node_text(&child, content).to_string())
}
