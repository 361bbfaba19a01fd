//! Go, Java, C, C++, and Ruby share this consolidated backend: each
//! grammar still produces function/class-shaped nodes, so rather than one
//! bespoke file per language (as the fully-staffed languages above get)
//! these five route through one walker parameterized by a small per-
//! language node-kind table. Grounded in the same tree-sitter traversal
//! style as `rust.rs`/`javascript.rs`, consolidated for this set because
//! their node shapes are close enough to share one recursive walk.

use super::common::{leading_doc_line, line_range, one_line};
use super::ExtractedFile;
use crate::symbol::Symbol;
use crate::types::{Language, SymbolKind};
use tree_sitter::{Node, Parser};

struct NodeKinds {
    function: &'static [&'static str],
    class: &'static [&'static str],
    import: &'static [&'static str],
    /// field name to read a receiver/owner type off a method node, if any
    /// (Go's `method_declaration` has a `receiver` field; others use `None`
    /// and rely on lexical class nesting instead).
    receiver_field: Option<&'static str>,
}

fn kinds_for(language: Language) -> NodeKinds {
    match language {
        Language::Go => NodeKinds {
            function: &["function_declaration", "method_declaration"],
            class: &["type_declaration"],
            import: &["import_spec"],
            receiver_field: Some("receiver"),
        },
        Language::Java => NodeKinds {
            function: &["method_declaration", "constructor_declaration"],
            class: &["class_declaration", "interface_declaration", "enum_declaration"],
            import: &["import_declaration"],
            receiver_field: None,
        },
        Language::C => NodeKinds {
            function: &["function_definition"],
            class: &[],
            import: &["preproc_include"],
            receiver_field: None,
        },
        Language::Cpp => NodeKinds {
            function: &["function_definition"],
            class: &["class_specifier", "struct_specifier"],
            import: &["preproc_include"],
            receiver_field: None,
        },
        Language::Ruby => NodeKinds {
            function: &["method", "singleton_method"],
            class: &["class", "module"],
            import: &["call"], // `require`/`require_relative` are call expressions
            receiver_field: None,
        },
        _ => NodeKinds { function: &[], class: &[], import: &[], receiver_field: None },
    }
}

fn grammar(language: Language) -> Option<tree_sitter::Language> {
    match language {
        Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
        Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
        Language::C => Some(tree_sitter_c::LANGUAGE.into()),
        Language::Cpp => Some(tree_sitter_cpp::LANGUAGE.into()),
        Language::Ruby => Some(tree_sitter_ruby::LANGUAGE.into()),
        _ => None,
    }
}

pub fn extract(path: &str, source: &str, language: Language) -> ExtractedFile {
    let mut out = ExtractedFile::default();
    let Some(grammar) = grammar(language) else {
        return out;
    };
    let mut parser = Parser::new();
    if parser.set_language(&grammar).is_err() {
        return out;
    }
    let Some(tree) = parser.parse(source, None) else {
        return out;
    };
    let kinds = kinds_for(language);
    walk(tree.root_node(), source, path, None, language, &kinds, &mut out);
    out
}

fn walk(
    node: Node,
    source: &str,
    path: &str,
    class_ctx: Option<&str>,
    language: Language,
    kinds: &NodeKinds,
    out: &mut ExtractedFile,
) {
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        let kind = child.kind();
        if kinds.import.contains(&kind) {
            // Ruby: only keep `require`/`require_relative` calls, not every call expression.
            if language == Language::Ruby {
                let text = &source[child.byte_range()];
                if text.starts_with("require") {
                    out.imports.push(one_line(text));
                }
            } else {
                out.imports.push(one_line(&source[child.byte_range()]));
            }
            continue;
        }

        if kinds.class.contains(&kind) {
            if let Some(name_node) = find_name(child) {
                let short = source[name_node.byte_range()].to_string();
                out.symbols.push(Symbol::new(
                    path,
                    &short,
                    &short,
                    line_range(child),
                    language,
                    SymbolKind::Class,
                    brace_signature(child, source),
                    leading_doc_line(child, source),
                ));
                walk(child, source, path, Some(&short), language, kinds, out);
                continue;
            }
        }

        if kinds.function.contains(&kind) {
            if let Some(name_node) = find_name(child) {
                let short = source[name_node.byte_range()].to_string();
                let receiver = kinds
                    .receiver_field
                    .and_then(|f| child.child_by_field_name(f))
                    .map(|n| first_identifier(&source[n.byte_range()]));
                let owner = receiver.as_deref().or(class_ctx);
                let (qname, symbol_kind) = match owner {
                    Some(owner) => (format!("{owner}.{short}"), SymbolKind::Method),
                    None => (short.clone(), SymbolKind::Function),
                };
                out.symbols.push(Symbol::new(
                    path,
                    &short,
                    &qname,
                    line_range(child),
                    language,
                    symbol_kind,
                    brace_signature(child, source),
                    leading_doc_line(child, source),
                ));
            }
            continue;
        }

        walk(child, source, path, class_ctx, language, kinds, out);
    }
}

fn find_name(node: Node) -> Option<Node> {
    node.child_by_field_name("name")
        .or_else(|| node.child_by_field_name("declarator"))
}

fn first_identifier(text: &str) -> String {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .find(|s| !s.is_empty())
        .unwrap_or(text)
        .to_string()
}

fn brace_signature(node: Node, source: &str) -> String {
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
