//! Ultracompact serializer (spec §4.8): one line per slice,
//! `«PrefixRef»:«short_name» «signature» @«start»-«end» [«relevance»]«marker»`,
//! with file paths aliased to `P0..Pn` and expanded once in a header.

use crate::index::ProjectIndex;
use crate::pack::ContextPack;
use std::collections::HashMap;
use std::fmt::Write;

pub fn render(pack: &ContextPack, index: &ProjectIndex) -> String {
    let mut aliases: HashMap<&str, String> = HashMap::new();
    let mut header = String::new();

    for slice in &pack.slices {
        let file = slice.id.file();
        if !aliases.contains_key(file) {
            let alias = format!("P{}", aliases.len());
            let _ = writeln!(header, "{alias}={file}");
            aliases.insert(file, alias);
        }
    }

    let mut out = header;
    for slice in &pack.slices {
        let alias = &aliases[slice.id.file()];
        let short_name = index.symbol(&slice.id).map(|s| s.name.as_ref()).unwrap_or_else(|| slice.id.split().1);
        let marker = if pack.unchanged.as_ref().is_some_and(|u| u.contains(&slice.id)) { " [UNCHANGED]" } else { "" };
        let _ = writeln!(
            out,
            "{alias}:{short_name} {} @{}-{} [{}]{marker}",
            slice.signature, slice.lines.0, slice.lines.1, slice.relevance
        );
    }

    while out.ends_with('\n') {
        out.pop();
    }
    out
}
