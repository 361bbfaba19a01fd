//! Rust backend: `tree-sitter-rust`. Functions, impl-block methods
//! (class-qualified as `Type::method`), structs/enums/traits (kind
//! `Class`), and modules (kind `Module`, nested qualification joined by
//! `::`).

use super::common::{leading_doc_line, line_range, one_line};
use super::ExtractedFile;
use crate::symbol::Symbol;
use crate::types::{Language, SymbolKind};
use tree_sitter::{Node, Parser};

pub fn extract(path: &str, source: &str) -> ExtractedFile {
    let mut parser = Parser::new();
    if parser.set_language(&tree_sitter_rust::LANGUAGE.into()).is_err() {
        return ExtractedFile::default();
    }
    let Some(tree) = parser.parse(source, None) else {
        return ExtractedFile::default();
    };

    let mut out = ExtractedFile::default();
    walk(tree.root_node(), source, path, &[], &mut out);
    out
}

fn walk(node: Node, source: &str, path: &str, qualifier: &[String], out: &mut ExtractedFile) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "use_declaration" => {
                if let Some(use_tree) = child.child_by_field_name("argument").or_else(|| {
                    child.children(&mut child.walk()).find(|n| n.kind() == "use_tree" || n.kind() == "scoped_identifier" || n.kind() == "identifier")
                }) {
                    out.imports.push(one_line(&source[use_tree.byte_range()]));
                }
            }
            "function_item" => {
                push_function(child, source, path, qualifier, None, out);
            }
            "struct_item" | "enum_item" | "trait_item" | "union_item" => {
                if let Some(name) = child.child_by_field_name("name") {
                    let short = source[name.byte_range()].to_string();
                    let qname = qualify(qualifier, &short);
                    out.symbols.push(Symbol::new(
                        path,
                        &short,
                        &qname,
                        line_range(child),
                        Language::Rust,
                        SymbolKind::Class,
                        signature_upto_brace(child, source),
                        leading_doc_line(child, source),
                    ));
                }
            }
            "mod_item" => {
                if let Some(name) = child.child_by_field_name("name") {
                    let short = source[name.byte_range()].to_string();
                    let qname = qualify(qualifier, &short);
                    out.symbols.push(Symbol::new(
                        path,
                        &short,
                        &qname,
                        line_range(child),
                        Language::Rust,
                        SymbolKind::Module,
                        signature_upto_brace(child, source),
                        leading_doc_line(child, source),
                    ));
                    if let Some(body) = child.child_by_field_name("body") {
                        let mut nested = qualifier.to_vec();
                        nested.push(short);
                        walk(body, source, path, &nested, out);
                    }
                }
            }
            "impl_item" => {
                let type_name = child
                    .child_by_field_name("type")
                    .map(|n| first_identifier(&source[n.byte_range()]));
                if let (Some(type_name), Some(body)) = (type_name, child.child_by_field_name("body")) {
                    let mut inner = body.walk();
                    for item in body.children(&mut inner) {
                        if item.kind() == "function_item" {
                            push_function(item, source, path, qualifier, Some(&type_name), out);
                        }
                    }
                }
            }
            _ => walk(child, source, path, qualifier, out),
        }
    }
}

fn push_function(
    node: Node,
    source: &str,
    path: &str,
    qualifier: &[String],
    owner_type: Option<&str>,
    out: &mut ExtractedFile,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let short = source[name_node.byte_range()].to_string();
    let qname = match owner_type {
        Some(ty) => format!("{ty}::{short}"),
        None => qualify(qualifier, &short),
    };
    let kind = if owner_type.is_some() { SymbolKind::Method } else { SymbolKind::Function };
    out.symbols.push(Symbol::new(
        path,
        &short,
        &qname,
        line_range(node),
        Language::Rust,
        kind,
        signature_upto_brace(node, source),
        leading_doc_line(node, source),
    ));
}

fn qualify(qualifier: &[String], name: &str) -> String {
    if qualifier.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", qualifier.join("::"), name)
    }
}

fn first_identifier(text: &str) -> String {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|s| !s.is_empty())
        .unwrap_or(text)
        .to_string()
}

/// Source-exact text from the item's start to its first `{` or `;`
/// (whichever comes first at depth 0), i.e. everything but the body.
fn signature_upto_brace(node: Node, source: &str) -> String {
    let text = &source[node.byte_range()];
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '<' => depth += 1,
            ')' | ']' | '>' => depth -= 1,
            '{' | ';' if depth <= 0 => return one_line(&text[..i]),
            _ => {}
        }
    }
    one_line(text)
}
