//! Thin CLI argument surface (SPEC_FULL.md §2: "no argument-parsing logic
//! lives in the core"). Every subcommand marshals straight into one
//! `Coordinator` call and prints the chosen serializer's bytes.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tldrs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Token-budgeted code context packing for coding agents")]
pub struct Cli {
    /// Workspace root. Defaults to the current directory.
    #[arg(short, long, global = true)]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build (or rebuild) the project index.
    Index,

    /// Pack a seed set of symbols into a context bundle.
    Pack {
        /// Seed entry strings (short name, qualified name, or path:name).
        seed: Vec<String>,
        #[arg(short, long, default_value_t = 2)]
        depth: u8,
        #[arg(short, long, default_value_t = 4000)]
        budget: u32,
        #[arg(long, value_enum, default_value_t = ZoomArg::Windowed)]
        zoom: ZoomArg,
        #[arg(long, value_enum, default_value_t = CompressArg::Blocks)]
        compress: CompressArg,
        #[arg(long)]
        strip_comments: bool,
        #[arg(long)]
        compress_imports: bool,
        #[arg(long)]
        session: Option<String>,
        #[arg(long, value_enum, default_value_t = FormatArg::Text)]
        format: FormatArg,
    },

    /// Pack the symbols touched by a set of diff hunks.
    DiffPack {
        #[arg(short, long, default_value_t = 2)]
        depth: u8,
        #[arg(short, long, default_value_t = 4000)]
        budget: u32,
        #[arg(long, value_enum, default_value_t = ZoomArg::Windowed)]
        zoom: ZoomArg,
        #[arg(long, value_enum, default_value_t = CompressArg::Blocks)]
        compress: CompressArg,
        #[arg(long)]
        session: Option<String>,
        #[arg(long, value_enum, default_value_t = FormatArg::Text)]
        format: FormatArg,
    },

    /// Resolve an entry string to a SymbolId.
    Resolve { entry: String },

    /// Report index freshness and rebuild state.
    Status,

    /// Run the long-lived daemon over a line-delimited stdio protocol.
    Serve,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ZoomArg {
    Map,
    Index,
    Sketch,
    Windowed,
    Full,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum CompressArg {
    None,
    Blocks,
    TwoStage,
    ChunkSummary,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Text,
    Ultracompact,
    Json,
    PackedJson,
    CacheFriendly,
}
