//! The `Symbol` entity: one extracted function, method, class or module.

use crate::types::{Language, LineRange, SymbolId, SymbolKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: Box<str>,
    pub qualified_name: Box<str>,
    pub file: Box<str>,
    pub range: LineRange,
    pub language: Language,
    pub kind: SymbolKind,
    pub signature: Box<str>,
    pub docline: Option<Box<str>>,
}

impl Symbol {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file: &str,
        name: &str,
        qualified_name: &str,
        range: LineRange,
        language: Language,
        kind: SymbolKind,
        signature: impl Into<Box<str>>,
        docline: Option<String>,
    ) -> Self {
        Self {
            id: SymbolId::new(file, qualified_name),
            name: name.into(),
            qualified_name: qualified_name.into(),
            file: file.into(),
            range,
            language,
            kind,
            signature: signature.into(),
            docline: docline.map(Into::into),
        }
    }

    pub fn line_start(&self) -> u32 {
        self.range.start
    }

    pub fn line_end(&self) -> u32 {
        self.range.end
    }
}
