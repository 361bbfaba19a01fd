//! Progressive code-content shaping per zoom level (spec §4.5 step 1).

use crate::symbol::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zoom {
    Map,
    Index,
    Sketch,
    Windowed,
    Full,
}

use serde::{Deserialize, Serialize};

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "else", "elif", "for", "while", "try", "except", "catch", "finally", "match", "switch",
    "case", "return", "def", "class", "fn", "func", "function", "impl", "struct", "enum", "trait",
];

/// Produces the `code` field for one candidate at a given zoom level.
/// `full_body` is the symbol's source text, line 1 == `symbol.line_start()`.
pub fn shape(zoom: Zoom, symbol: &Symbol, full_body: Option<&str>, diff_lines: &[(u32, u32)]) -> Option<String> {
    match zoom {
        Zoom::Map => None,
        Zoom::Index => symbol.docline.as_ref().map(|d| d.to_string()),
        Zoom::Sketch => full_body.map(sketch),
        Zoom::Windowed => full_body.map(|body| windowed(body, symbol.line_start(), diff_lines)),
        Zoom::Full => full_body.map(str::to_string),
    }
}

/// Keeps lines containing a control-flow/definition keyword or closing
/// delimiters; elides the rest as plain-expression/assignment noise.
fn sketch(body: &str) -> String {
    let mut out = Vec::new();
    let mut elided_run = false;
    for line in body.lines() {
        let trimmed = line.trim();
        let is_structural = trimmed.is_empty()
            || CONTROL_KEYWORDS.iter().any(|kw| {
                trimmed == *kw
                    || trimmed.starts_with(&format!("{kw} "))
                    || trimmed.starts_with(&format!("{kw}("))
                    || trimmed.starts_with(&format!("{kw}:"))
            })
            || trimmed.starts_with('}')
            || trimmed.starts_with(')')
            || trimmed.ends_with('{')
            || trimmed.ends_with(':');

        if is_structural {
            out.push(line.to_string());
            elided_run = false;
        } else if !elided_run {
            out.push(format!("{}...", leading_whitespace(line)));
            elided_run = true;
        }
    }
    out.join("\n")
}

fn leading_whitespace(line: &str) -> String {
    line.chars().take_while(|c| c.is_whitespace()).collect()
}

/// Union of adjacent-line windows around each diff interval, merged with
/// 2-8 lines of context (denser diffs get a tighter window so output
/// doesn't balloon on heavily-touched symbols).
fn windowed(body: &str, symbol_start: u32, diff_lines: &[(u32, u32)]) -> String {
    if diff_lines.is_empty() {
        return body.to_string();
    }
    let lines: Vec<&str> = body.lines().collect();
    let total_diff_lines: u32 = diff_lines.iter().map(|(s, e)| e - s + 1).sum();
    let density = total_diff_lines as f64 / lines.len().max(1) as f64;
    let context = if density > 0.5 {
        2
    } else if density > 0.2 {
        4
    } else {
        8
    };

    let mut windows: Vec<(u32, u32)> = diff_lines
        .iter()
        .map(|(s, e)| {
            let local_s = s.saturating_sub(symbol_start);
            let local_e = e.saturating_sub(symbol_start);
            (local_s.saturating_sub(context), (local_e + context).min(lines.len() as u32 - 1))
        })
        .collect();
    windows.sort_by_key(|w| w.0);

    let mut merged: Vec<(u32, u32)> = Vec::new();
    for (s, e) in windows {
        if let Some(last) = merged.last_mut() {
            if s <= last.1 + 1 {
                last.1 = last.1.max(e);
                continue;
            }
        }
        merged.push((s, e));
    }

    let mut out = Vec::new();
    for (i, (s, e)) in merged.iter().enumerate() {
        if i > 0 {
            let gap = *s - merged[i - 1].1 - 1;
            out.push(format!("# ... ({gap} lines elided)"));
        }
        out.extend(lines[*s as usize..=(*e as usize).min(lines.len() - 1)].iter().map(|l| l.to_string()));
    }
    out.join("\n")
}

/// Strips comments, preserving lines containing `TODO`/`FIXME`/`HACK`.
pub fn strip_comments(code: &str) -> String {
    code.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            let is_comment = trimmed.starts_with("//") || trimmed.starts_with('#') || trimmed.starts_with("/*") || trimmed.starts_with('*');
            !is_comment || trimmed.contains("TODO") || trimmed.contains("FIXME") || trimmed.contains("HACK")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windowed_merges_overlapping_ranges() {
        let body = (1..=30).map(|n| format!("line{n}")).collect::<Vec<_>>().join("\n");
        let out = windowed(&body, 1, &[(5, 6), (8, 9)]);
        assert!(out.contains("line1"));
        assert!(!out.contains("line30"));
    }

    #[test]
    fn strip_comments_preserves_todo() {
        let code = "// plain comment\nlet x = 1;\n// TODO: fix this\n";
        let out = strip_comments(code);
        assert!(!out.contains("plain comment"));
        assert!(out.contains("TODO"));
        assert!(out.contains("let x = 1;"));
    }
}
