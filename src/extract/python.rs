//! Python backend: `tree-sitter-python`. Functions, classes, and methods
//! nested inside a class body (class-qualified as `Class.method`).
//! Doclines come from the first statement's string literal (docstring),
//! not a leading `#` comment, per Python convention.

use super::common::{first_docstring_line, line_range, one_line};
use super::ExtractedFile;
use crate::symbol::Symbol;
use crate::types::{Language, SymbolKind};
use tree_sitter::{Node, Parser};

pub fn extract(path: &str, source: &str) -> ExtractedFile {
    let mut parser = Parser::new();
    if parser.set_language(&tree_sitter_python::LANGUAGE.into()).is_err() {
        return ExtractedFile::default();
    }
    let Some(tree) = parser.parse(source, None) else {
        return ExtractedFile::default();
    };

    let mut out = ExtractedFile::default();
    walk(tree.root_node(), source, path, None, &mut out);
    out
}

fn walk(node: Node, source: &str, path: &str, class_ctx: Option<&str>, out: &mut ExtractedFile) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_statement" | "import_from_statement" => {
                out.imports.push(one_line(&source[child.byte_range()]));
            }
            "decorated_definition" => {
                walk(child, source, path, class_ctx, out);
            }
            "function_definition" => {
                let Some(name_node) = child.child_by_field_name("name") else { continue };
                let short = source[name_node.byte_range()].to_string();
                let qname = match class_ctx {
                    Some(c) => format!("{c}.{short}"),
                    None => short.clone(),
                };
                let kind = if class_ctx.is_some() { SymbolKind::Method } else { SymbolKind::Function };
                let docline = child
                    .child_by_field_name("body")
                    .and_then(|b| first_docstring_line(b, source));
                out.symbols.push(Symbol::new(
                    path,
                    &short,
                    &qname,
                    line_range(child),
                    Language::Python,
                    kind,
                    signature_upto_colon(child, source),
                    docline,
                ));
            }
            "class_definition" => {
                let Some(name_node) = child.child_by_field_name("name") else { continue };
                let short = source[name_node.byte_range()].to_string();
                let docline = child
                    .child_by_field_name("body")
                    .and_then(|b| first_docstring_line(b, source));
                out.symbols.push(Symbol::new(
                    path,
                    &short,
                    &short,
                    line_range(child),
                    Language::Python,
                    SymbolKind::Class,
                    signature_upto_colon(child, source),
                    docline,
                ));
                if let Some(body) = child.child_by_field_name("body") {
                    walk(body, source, path, Some(&short), out);
                }
            }
            _ => {}
        }
    }
}

/// Source-exact text up to the header-terminating `:` at paren/bracket
/// depth 0 (skips annotation colons inside parameter lists).
fn signature_upto_colon(node: Node, source: &str) -> String {
    let text = &source[node.byte_range()];
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ':' if depth <= 0 => return one_line(&text[..i]),
            _ => {}
        }
    }
    one_line(text)
}
