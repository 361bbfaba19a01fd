//! Layered configuration: defaults → `.tldrs/config.toml` → `TLDRS_`-prefixed
//! environment variables, following the teacher's figment-based layering.
//!
//! # Environment Variables
//!
//! Prefixed with `TLDRS_`, double underscores separate nested levels:
//! - `TLDRS_INDEXING__PARALLEL_THREADS=8` sets `indexing.parallel_threads`
//! - `TLDRS_PACK__DEFAULT_BUDGET=2000` sets `pack.default_budget`
//! - `TLDRS_DAEMON__PACK_TIMEOUT_SECS=30` sets `daemon.pack_timeout_secs`

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub pack: PackConfig,

    #[serde(default)]
    pub daemon: DaemonConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    #[serde(default = "default_parallel_threads")]
    pub parallel_threads: usize,

    /// Extra exclude globs, layered on top of the built-in list
    /// (`node_modules`, `target`, `.git`, `dist`, `build`, `.venv`) from
    /// spec §6.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Extra include globs restricting the walk, if non-empty.
    #[serde(default)]
    pub include_patterns: Vec<String>,

    #[serde(default = "default_true")]
    pub include_reverse_adjacency: bool,

    #[serde(default = "default_false")]
    pub include_sources: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PackConfig {
    #[serde(default = "default_budget")]
    pub default_budget: u32,

    #[serde(default = "default_depth")]
    pub default_depth: u8,

    /// `"tiktoken"` or `"heuristic"`. Resolved once at coordinator startup
    /// per spec §9 ("Tokenization pluggability") and fixed for the process
    /// lifetime.
    #[serde(default = "default_tokenizer")]
    pub tokenizer: String,

    #[serde(default = "default_soft_ceiling_blocks")]
    pub soft_ceiling_blocks: usize,

    #[serde(default = "default_soft_ceiling_two_stage")]
    pub soft_ceiling_two_stage: usize,

    #[serde(default = "default_soft_ceiling_chunk_summary")]
    pub soft_ceiling_chunk_summary: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DaemonConfig {
    #[serde(default = "default_index_timeout")]
    pub index_timeout_secs: u64,

    #[serde(default = "default_pack_timeout")]
    pub pack_timeout_secs: u64,

    #[serde(default = "default_compress_timeout")]
    pub compress_timeout_secs: u64,

    /// How often the background watcher polls mtimes when no native
    /// filesystem events are available (seconds).
    #[serde(default = "default_watch_poll_secs")]
    pub watch_poll_secs: u64,

    /// Session GC sample rate (spec §4.7: "probabilistically, e.g. 1%").
    #[serde(default = "default_gc_sample_rate")]
    pub session_gc_sample_rate: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub default: String,

    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_parallel_threads() -> usize {
    num_cpus::get()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_budget() -> u32 {
    4000
}
fn default_depth() -> u8 {
    2
}
fn default_tokenizer() -> String {
    "tiktoken".to_string()
}
fn default_soft_ceiling_blocks() -> usize {
    400
}
fn default_soft_ceiling_two_stage() -> usize {
    250
}
fn default_soft_ceiling_chunk_summary() -> usize {
    150
}
fn default_index_timeout() -> u64 {
    120
}
fn default_pack_timeout() -> u64 {
    60
}
fn default_compress_timeout() -> u64 {
    30
}
fn default_watch_poll_secs() -> u64 {
    2
}
fn default_gc_sample_rate() -> f64 {
    0.01
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            indexing: IndexingConfig::default(),
            pack: PackConfig::default(),
            daemon: DaemonConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parallel_threads: default_parallel_threads(),
            exclude_patterns: Vec::new(),
            include_patterns: Vec::new(),
            include_reverse_adjacency: default_true(),
            include_sources: default_false(),
        }
    }
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            default_budget: default_budget(),
            default_depth: default_depth(),
            tokenizer: default_tokenizer(),
            soft_ceiling_blocks: default_soft_ceiling_blocks(),
            soft_ceiling_two_stage: default_soft_ceiling_two_stage(),
            soft_ceiling_chunk_summary: default_soft_ceiling_chunk_summary(),
        }
    }
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            index_timeout_secs: default_index_timeout(),
            pack_timeout_secs: default_pack_timeout(),
            compress_timeout_secs: default_compress_timeout(),
            watch_poll_secs: default_watch_poll_secs(),
            session_gc_sample_rate: default_gc_sample_rate(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

/// Built-in exclude list, always applied regardless of workspace config
/// (spec §6: "otherwise uses a built-in exclude list").
pub const BUILTIN_EXCLUDES: &[&str] = &["node_modules", "target", ".git", "dist", "build", ".venv"];

impl Settings {
    /// Loads layered config rooted at `workspace`: defaults, then
    /// `workspace/.tldrs/config.toml` if present, then `TLDRS_`-prefixed
    /// env vars.
    pub fn load(workspace: &std::path::Path) -> Result<Self, figment::Error> {
        let config_path = workspace.join(".tldrs").join("config.toml");
        Self::load_from(config_path)
    }

    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(
                Env::prefixed("TLDRS_").map(|key| key.as_str().to_lowercase().replace("__", ".").into()),
            )
            .extract()
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_string =
            toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, toml_string)
    }

    pub fn tldrs_dir(workspace: &std::path::Path) -> PathBuf {
        workspace.join(".tldrs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert!(settings.indexing.parallel_threads > 0);
        assert_eq!(settings.pack.default_budget, 4000);
        assert_eq!(settings.pack.soft_ceiling_blocks, 400);
    }

    #[test]
    fn toml_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[indexing]
parallel_threads = 4

[pack]
default_budget = 9000
tokenizer = "heuristic"
"#,
        )
        .unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.indexing.parallel_threads, 4);
        assert_eq!(settings.pack.default_budget, 9000);
        assert_eq!(settings.pack.tokenizer, "heuristic");
        // untouched fields keep their defaults
        assert_eq!(settings.daemon.pack_timeout_secs, 60);
    }

    #[test]
    fn env_vars_override_file() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        std::fs::write(&config_path, "[pack]\ndefault_budget = 1000\n").unwrap();

        // SAFETY: test is single-threaded w.r.t. this env var and cleans up after itself.
        unsafe {
            std::env::set_var("TLDRS_PACK__DEFAULT_BUDGET", "2500");
        }
        let settings = Settings::load_from(&config_path).unwrap();
        unsafe {
            std::env::remove_var("TLDRS_PACK__DEFAULT_BUDGET");
        }
        assert_eq!(settings.pack.default_budget, 2500);
    }
}
