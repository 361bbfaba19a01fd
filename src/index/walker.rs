//! File enumeration for an index build (spec §4.2 step 1): honors
//! `.gitignore`, the built-in exclude list, and a workspace config's
//! `include_patterns`/`exclude_patterns`. Mirrors the teacher's
//! `ignore`-crate-based walker (`src/indexing/walker.rs`), generalized to
//! the spec's per-path include/exclude glob lists.

use crate::config::{IndexingConfig, BUILTIN_EXCLUDES};
use crate::types::Language;
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Enumerates files under `root` with a supported language, sorted by path
/// for build-to-build determinism (spec §4.2: "Order the list by path").
pub fn enumerate(root: &Path, indexing: &IndexingConfig) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .follow_links(false)
        .require_git(false);

    let mut overrides = OverrideBuilder::new(root);
    for pattern in BUILTIN_EXCLUDES {
        let _ = overrides.add(&format!("!{pattern}/**"));
        let _ = overrides.add(&format!("!{pattern}"));
    }
    for pattern in &indexing.exclude_patterns {
        let _ = overrides.add(&format!("!{pattern}"));
    }
    for pattern in &indexing.include_patterns {
        let _ = overrides.add(pattern);
    }
    if let Ok(built) = overrides.build() {
        builder.overrides(built);
    }

    let mut files: Vec<PathBuf> = builder
        .build()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_some_and(|ft| ft.is_file()))
        .map(|e| e.into_path())
        .filter(|p| Language::from_path(p) != Language::Unknown)
        .collect();

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn enumerates_supported_languages_only_and_sorted() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.py"), "def f(): pass").unwrap();
        fs::write(dir.path().join("a.rs"), "fn f() {}").unwrap();
        fs::write(dir.path().join("notes.md"), "# hi").unwrap();

        let files = enumerate(dir.path(), &IndexingConfig::default());
        let names: Vec<_> = files.iter().filter_map(|p| p.file_name()).map(|n| n.to_string_lossy().to_string()).collect();
        assert_eq!(names, vec!["a.rs".to_string(), "b.py".to_string()]);
    }

    #[test]
    fn excludes_builtin_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("target")).unwrap();
        fs::write(dir.path().join("target/gen.rs"), "fn gen() {}").unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let files = enumerate(dir.path(), &IndexingConfig::default());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("main.rs"));
    }
}
