//! JavaScript/TypeScript backend. Shares one walker between
//! `tree-sitter-javascript` and `tree-sitter-typescript` since both
//! grammars use the same node kinds for the constructs this extractor
//! cares about (`function_declaration`, `class_declaration`,
//! `method_definition`, plus named `const fn = (...) => ...` bindings).

use super::common::{leading_doc_line, line_range, one_line};
use super::ExtractedFile;
use crate::symbol::Symbol;
use crate::types::{Language, SymbolKind};
use tree_sitter::{Node, Parser};

pub fn extract(path: &str, source: &str, language: Language) -> ExtractedFile {
    let mut parser = Parser::new();
    let ok = match language {
        Language::TypeScript => parser
            .set_language(&tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into())
            .is_ok(),
        _ => parser.set_language(&tree_sitter_javascript::LANGUAGE.into()).is_ok(),
    };
    if !ok {
        return ExtractedFile::default();
    }
    let Some(tree) = parser.parse(source, None) else {
        return ExtractedFile::default();
    };

    let mut out = ExtractedFile::default();
    walk(tree.root_node(), source, path, None, language, &mut out);
    out
}

fn walk(node: Node, source: &str, path: &str, class_ctx: Option<&str>, language: Language, out: &mut ExtractedFile) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        match child.kind() {
            "import_statement" => {
                out.imports.push(one_line(&source[child.byte_range()]));
            }
            "function_declaration" => {
                push_function(child, source, path, None, language, out);
            }
            "class_declaration" => {
                let Some(name_node) = child.child_by_field_name("name") else { continue };
                let short = source[name_node.byte_range()].to_string();
                out.symbols.push(Symbol::new(
                    path,
                    &short,
                    &short,
                    line_range(child),
                    language,
                    SymbolKind::Class,
                    signature_upto_brace(child, source),
                    leading_doc_line(child, source),
                ));
                if let Some(body) = child.child_by_field_name("body") {
                    let mut inner = body.walk();
                    for member in body.children(&mut inner) {
                        if member.kind() == "method_definition" {
                            push_function(member, source, path, Some(&short), language, out);
                        }
                    }
                }
            }
            "lexical_declaration" | "variable_declaration" => {
                let mut inner = child.walk();
                for decl in child.children(&mut inner) {
                    if decl.kind() != "variable_declarator" {
                        continue;
                    }
                    let Some(name_node) = decl.child_by_field_name("name") else { continue };
                    let Some(value) = decl.child_by_field_name("value") else { continue };
                    if matches!(value.kind(), "arrow_function" | "function_expression") {
                        let short = source[name_node.byte_range()].to_string();
                        out.symbols.push(Symbol::new(
                            path,
                            &short,
                            &short,
                            line_range(child),
                            language,
                            SymbolKind::Function,
                            signature_upto_arrow_or_brace(&child, source),
                            leading_doc_line(child, source),
                        ));
                    }
                }
            }
            _ => walk(child, source, path, class_ctx, language, out),
        }
    }
}

fn push_function(
    node: Node,
    source: &str,
    path: &str,
    owner_class: Option<&str>,
    language: Language,
    out: &mut ExtractedFile,
) {
    let Some(name_node) = node.child_by_field_name("name") else {
        return;
    };
    let short = source[name_node.byte_range()].to_string();
    let qname = match owner_class {
        Some(c) => format!("{c}.{short}"),
        None => short.clone(),
    };
    let kind = if owner_class.is_some() { SymbolKind::Method } else { SymbolKind::Function };
    out.symbols.push(Symbol::new(
        path,
        &short,
        &qname,
        line_range(node),
        language,
        kind,
        signature_upto_brace(node, source),
        leading_doc_line(node, source),
    ));
}

fn signature_upto_brace(node: Node, source: &str) -> String {
    let text = &source[node.byte_range()];
    let mut depth = 0i32;
    for (i, c) in text.char_indices() {
        match c {
            '(' | '[' | '<' => depth += 1,
            ')' | ']' | '>' => depth -= 1,
            '{' if depth <= 0 => return one_line(&text[..i]),
            _ => {}
        }
    }
    one_line(text)
}

fn signature_upto_arrow_or_brace(node: &Node, source: &str) -> String {
    let text = &source[node.byte_range()];
    if let Some(idx) = text.find("=>") {
        return one_line(&text[..idx + 2]);
    }
    signature_upto_brace(*node, source)
}
