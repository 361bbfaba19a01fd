//! Block Compressor (spec §4.6): segments a function body into blocks and
//! picks a relevant subset under a local token budget via 0/1 knapsack.
//! Used when a body is too large to include whole.

use crate::types::Language;

#[derive(Debug, Clone)]
pub struct Block {
    pub text: String,
    pub start_line: u32,
    pub end_line: u32,
}

#[derive(Debug, Clone, Default)]
pub struct CompressHints<'a> {
    pub diff_lines: &'a [(u32, u32)],
    pub call_edge_identifiers: &'a [String],
}

pub struct CompressOutcome {
    pub code: String,
    pub kept_blocks: u32,
    pub dropped_blocks: u32,
}

/// Caps the knapsack DP table width for predictable performance (spec
/// §4.6 step 3: "e.g. 10_000 cells"); over-cap falls back to greedy
/// descending-score selection.
const DP_CELL_CAP: usize = 10_000;

pub fn compress_body(
    code: &str,
    language: Language,
    local_budget: usize,
    hints: &CompressHints,
    estimate: impl Fn(&str) -> u32,
) -> CompressOutcome {
    let blocks = segment(code, language);
    if blocks.is_empty() {
        return CompressOutcome { code: code.to_string(), kept_blocks: 0, dropped_blocks: 0 };
    }

    let weights: Vec<usize> = blocks.iter().map(|b| estimate(&b.text) as usize).collect();
    let scores: Vec<u32> = blocks.iter().map(|b| score_block(b, hints)).collect();

    let keep = if blocks.len() * local_budget.max(1) <= DP_CELL_CAP {
        knapsack(&weights, &scores, local_budget)
    } else {
        greedy(&weights, &scores, local_budget)
    };

    let kept_blocks = keep.iter().filter(|k| **k).count() as u32;
    let dropped_blocks = blocks.len() as u32 - kept_blocks;

    let mut out = Vec::new();
    let mut prev_kept_end: Option<u32> = None;
    for (i, block) in blocks.iter().enumerate() {
        if !keep[i] {
            continue;
        }
        if let Some(prev_end) = prev_kept_end {
            if block.start_line > prev_end + 1 {
                let elided = block.start_line - prev_end - 1;
                out.push(format!("# ... ({elided} lines elided)"));
            }
        }
        out.push(block.text.clone());
        prev_kept_end = Some(block.end_line);
    }

    CompressOutcome { code: out.join("\n"), kept_blocks, dropped_blocks }
}

/// Segments `code` into blocks. AST-aware segmentation would cut at
/// statement boundaries using the language's own parser; absent a cheap
/// way to map a standalone body string back into the extractor's tree
/// (the body here has already been sliced out of its file), this always
/// uses the indent/blank-line fallback from spec §4.6 step 1(b), which is
/// language-agnostic and good enough for knapsack purposes.
fn segment(code: &str, _language: Language) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut start_line = 1u32;
    let mut line_no = 0u32;

    let lines: Vec<&str> = code.lines().collect();
    for (i, line) in lines.iter().enumerate() {
        line_no = i as u32 + 1;
        let is_boundary = line.trim().is_empty()
            || (!current.is_empty() && indent_of(line) < indent_of(current[0]) && !line.trim().is_empty());

        if is_boundary && !current.is_empty() {
            blocks.push(Block { text: current.join("\n"), start_line, end_line: line_no.saturating_sub(1).max(start_line) });
            current.clear();
            start_line = line_no;
        }
        if line.trim().is_empty() {
            start_line = line_no + 1;
            continue;
        }
        current.push(line);
    }
    if !current.is_empty() {
        blocks.push(Block { text: current.join("\n"), start_line, end_line: line_no });
    }
    blocks
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn score_block(block: &Block, hints: &CompressHints) -> u32 {
    let mut score = 0u32;
    if hints.diff_lines.iter().any(|(s, e)| block.start_line <= *e && *s <= block.end_line) {
        score += 3;
    }
    if block.text.contains("return")
        || block.text.contains("if ")
        || block.text.contains("for ")
        || block.text.contains("while ")
    {
        score += 2;
    }
    if hints.call_edge_identifiers.iter().any(|id| block.text.contains(id.as_str())) {
        score += 1;
    }
    score
}

/// 0/1 knapsack maximizing total score subject to total weight ≤ budget.
/// Ties broken by original position (earlier block wins), matching the
/// determinism spec §4.6 requires.
fn knapsack(weights: &[usize], scores: &[u32], budget: usize) -> Vec<bool> {
    let n = weights.len();
    let mut dp = vec![vec![0u32; budget + 1]; n + 1];

    for i in 1..=n {
        for w in 0..=budget {
            dp[i][w] = dp[i - 1][w];
            if weights[i - 1] <= w {
                let candidate = dp[i - 1][w - weights[i - 1]] + scores[i - 1];
                // strictly greater only: ties keep the earlier (already
                // selected-by-default via dp[i-1][w]) choice.
                if candidate > dp[i][w] {
                    dp[i][w] = candidate;
                }
            }
        }
    }

    let mut keep = vec![false; n];
    let mut w = budget;
    for i in (1..=n).rev() {
        if dp[i][w] != dp[i - 1][w] {
            keep[i - 1] = true;
            w -= weights[i - 1];
        }
    }
    keep
}

/// Greedy descending-score fallback for when the DP table would exceed
/// `DP_CELL_CAP`. Ties (equal score) keep original order.
fn greedy(weights: &[usize], scores: &[u32], budget: usize) -> Vec<bool> {
    let mut order: Vec<usize> = (0..weights.len()).collect();
    order.sort_by(|&a, &b| scores[b].cmp(&scores[a]).then(a.cmp(&b)));

    let mut keep = vec![false; weights.len()];
    let mut used = 0usize;
    for i in order {
        if used + weights[i] <= budget {
            keep[i] = true;
            used += weights[i];
        }
    }
    keep
}
