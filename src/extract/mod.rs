//! Language Extractor (spec §4.1): parses one source file into its symbols
//! and imports. A closed dispatch table routes by `Language`; this is
//! closed polymorphism per spec §9 ("Dynamic dispatch by language") — all
//! languages are known at build time, no plugin loading.

mod common;
mod generic;
mod javascript;
mod python;
mod rust;

use crate::symbol::Symbol;
use crate::types::Language;
use std::panic::{self, AssertUnwindSafe};

/// Result of extracting one file: symbols in source order, plus its import
/// statements in source order.
#[derive(Debug, Default, Clone)]
pub struct ExtractedFile {
    pub symbols: Vec<Symbol>,
    pub imports: Vec<String>,
}

/// Parses `source` (the contents of the file at `rel`, already read by the
/// caller) as `language`. `rel` must already be workspace-relative with `/`
/// separators — spec §3 mints `SymbolId` as `«relative_path»:«qualified_name»`,
/// and every symbol this produces is keyed on `rel` verbatim. Unknown
/// languages return an empty result, never an error (spec §4.1). A parser
/// panic is caught and reported as `ExtractFailed`; the caller (Project
/// Index build) logs and skips the file rather than aborting the whole
/// build.
pub fn extract(rel: &str, language: Language, source: &str) -> Result<ExtractedFile, String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match language {
        Language::Rust => rust::extract(rel, source),
        Language::Python => python::extract(rel, source),
        Language::JavaScript | Language::TypeScript => javascript::extract(rel, source, language),
        Language::Go | Language::Java | Language::C | Language::Cpp | Language::Ruby => {
            generic::extract(rel, source, language)
        }
        Language::Unknown => ExtractedFile::default(),
    }));

    outcome.map_err(|_| format!("parser panicked while extracting {rel}"))
}
