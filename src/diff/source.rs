//! Abstract diff source (spec §6): `list_hunks(base_ref, head_ref)`. The
//! core never talks to git directly (spec §1's out-of-scope list); this is
//! the default, swappable implementation.

use super::Hunk;
use std::process::Command;

pub trait DiffSource: Send + Sync {
    fn list_hunks(&self, base_ref: &str, head_ref: &str) -> Result<Vec<Hunk>, String>;
}

/// Default `DiffSource`: shells out to `git diff --unified=0` and parses
/// unified-diff `@@` headers. No `git2` dependency — this is explicitly a
/// thin, replaceable default, not a git integration layer.
pub struct GitDiffSource {
    pub repo_root: std::path::PathBuf,
}

impl GitDiffSource {
    pub fn new(repo_root: impl Into<std::path::PathBuf>) -> Self {
        Self { repo_root: repo_root.into() }
    }
}

impl DiffSource for GitDiffSource {
    fn list_hunks(&self, base_ref: &str, head_ref: &str) -> Result<Vec<Hunk>, String> {
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .arg("diff")
            .arg("--unified=0")
            .arg(format!("{base_ref}..{head_ref}"))
            .output()
            .map_err(|e| format!("failed to invoke git: {e}"))?;

        if !output.status.success() {
            return Err(format!(
                "git diff exited with status {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            ));
        }

        Ok(parse_unified_diff(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parses the `@@ -old_start,old_count +new_start,new_count @@` headers of
/// a unified diff into `Hunk`s, tracking the current file from the
/// preceding `+++ b/...` line.
fn parse_unified_diff(text: &str) -> Vec<Hunk> {
    let mut hunks = Vec::new();
    let mut current_file = String::new();

    for line in text.lines() {
        if let Some(path) = line.strip_prefix("+++ b/") {
            current_file = path.to_string();
            continue;
        }
        if let Some(rest) = line.strip_prefix("@@ ") {
            if let Some(header) = rest.split(" @@").next() {
                if let Some(hunk) = parse_hunk_header(header, &current_file) {
                    hunks.push(hunk);
                }
            }
        }
    }
    hunks
}

fn parse_hunk_header(header: &str, file: &str) -> Option<Hunk> {
    // header: "-old_start[,old_count] +new_start[,new_count]"
    let mut parts = header.split_whitespace();
    let old = parts.next()?.trim_start_matches('-');
    let new = parts.next()?.trim_start_matches('+');
    let (old_start, old_count) = parse_range(old);
    let (new_start, new_count) = parse_range(new);
    Some(Hunk { file: file.to_string(), old_start, old_count, new_start, new_count })
}

fn parse_range(spec: &str) -> (u32, u32) {
    match spec.split_once(',') {
        Some((start, count)) => (start.parse().unwrap_or(0), count.parse().unwrap_or(1)),
        None => (spec.parse().unwrap_or(0), 1),
    }
}

/// Fixed, caller-supplied hunk list. Used in tests and by callers that
/// already have hunks from elsewhere (e.g. an editor's unsaved-diff view).
pub struct StaticDiffSource {
    pub hunks: Vec<Hunk>,
}

impl StaticDiffSource {
    pub fn new(hunks: Vec<Hunk>) -> Self {
        Self { hunks }
    }
}

impl DiffSource for StaticDiffSource {
    fn list_hunks(&self, _base_ref: &str, _head_ref: &str) -> Result<Vec<Hunk>, String> {
        Ok(self.hunks.clone())
    }
}
