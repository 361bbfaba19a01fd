//! Shared helpers used by every language backend: comment/docline parsing,
//! source-exact parameter list extraction, and blank/whitespace trimming.
//! Kept as one language-agnostic routine per spec §4.1 rather than
//! reimplemented per language.

use tree_sitter::Node;

/// First non-blank line of a leading comment/docstring block immediately
/// above `node`, stripped of comment syntax. Mirrors the teacher's
/// "first non-blank line of the docstring/leading comment" convention.
pub fn leading_doc_line(node: Node, source: &str) -> Option<String> {
    let mut sibling = node.prev_sibling()?;
    let mut lines: Vec<String> = Vec::new();

    loop {
        match sibling.kind() {
            "line_comment" | "comment" => {
                let text = &source[sibling.byte_range()];
                lines.push(strip_comment_prefix(text));
            }
            _ => break,
        }
        match sibling.prev_sibling() {
            Some(s) if s.end_position().row + 1 >= sibling.start_position().row => sibling = s,
            _ => break,
        }
    }

    lines.reverse();
    lines.into_iter().map(|l| l.trim().to_string()).find(|l| !l.is_empty())
}

/// Strips `//`, `///`, `//!`, `#`, `/** */`-style decoration from one
/// comment line, leaving the prose.
fn strip_comment_prefix(text: &str) -> String {
    let trimmed = text.trim();
    let trimmed = trimmed
        .trim_start_matches("///")
        .trim_start_matches("//!")
        .trim_start_matches("//")
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_end_matches("*/")
        .trim_start_matches('*')
        .trim_start_matches('#');
    trimmed.trim().to_string()
}

/// First non-blank line of a Python/Ruby-style string-literal docstring
/// (the statement immediately inside a function/class body).
pub fn first_docstring_line(body: Node, source: &str) -> Option<String> {
    let mut cursor = body.walk();
    let first_stmt = body.named_children(&mut cursor).next()?;
    if first_stmt.kind() != "expression_statement" {
        return None;
    }
    let mut inner = first_stmt.walk();
    let literal = first_stmt.named_children(&mut inner).next()?;
    if !matches!(literal.kind(), "string" | "string_literal") {
        return None;
    }
    let text = &source[literal.byte_range()];
    let cleaned = text.trim_matches(|c| c == '"' || c == '\'' || c == '\n' || c == ' ');
    cleaned.lines().map(str::trim).find(|l| !l.is_empty()).map(str::to_string)
}

/// Collapses a node's source span to one line for use inside a signature
/// (parameter lists, return-type annotations, etc. are always taken
/// source-exact, never reconstructed).
pub fn one_line(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 1-based, inclusive line range from a tree-sitter node (0-based rows).
pub fn line_range(node: Node) -> crate::types::LineRange {
    crate::types::LineRange::new(node.start_position().row as u32 + 1, node.end_position().row as u32 + 1)
}
