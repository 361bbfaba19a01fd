//! CLI front end. Out of scope for the core per spec §1; kept intentionally
//! thin — marshals args into one `Coordinator` call and prints the chosen
//! serializer's bytes.

pub mod args;

use crate::config::Settings;
use crate::coordinator::Coordinator;
use crate::diff::{DiffSource, GitDiffSource};
use crate::pack::PackOptions;
use crate::serialize::{self, OutputFormat};
use args::{Cli, Commands, CompressArg, FormatArg, ZoomArg};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let workspace = cli.workspace.unwrap_or_else(|| PathBuf::from("."));
    let settings = Settings::load(&workspace).unwrap_or_else(|cause| {
        tracing::warn!(%cause, "failed to load config, using defaults");
        Settings::default()
    });
    let coordinator = Coordinator::new(&workspace, settings);

    match cli.command {
        Commands::Index => {
            let fingerprint = coordinator.build_index().await?;
            println!("indexed {workspace} :: fingerprint={fingerprint}", workspace = workspace.display());
        }

        Commands::Status => {
            coordinator.build_index().await.ok();
            let status = coordinator.status();
            println!(
                "indexed={} symbols={} files={} rebuild_in_flight={} last_invalidated_unix={}",
                status.indexed, status.symbol_count, status.file_count, status.rebuild_in_flight, status.last_invalidated_unix
            );
        }

        Commands::Resolve { entry } => {
            coordinator.build_index().await?;
            let id = coordinator.resolve_entry(&entry)?;
            println!("{id}");
        }

        Commands::Pack { seed, depth, budget, zoom, compress, strip_comments, compress_imports, session, format } => {
            coordinator.build_index().await?;
            let mut ids = Vec::with_capacity(seed.len());
            for entry in &seed {
                ids.push(coordinator.resolve_entry(entry)?);
            }
            let options = PackOptions {
                zoom: zoom.into(),
                compress: compress.into(),
                strip_comments,
                compress_imports,
                session_id: session,
            };
            let pack = coordinator.pack(ids, depth, budget, options, CancellationToken::new()).await?;
            print_pack(&coordinator, &pack, format.into());
        }

        Commands::DiffPack { depth, budget, zoom, compress, session, format } => {
            coordinator.build_index().await?;
            let source = GitDiffSource::new(&workspace);
            let hunks = source.list_hunks("HEAD", "HEAD").map_err(anyhow::Error::msg)?;
            let options = PackOptions { zoom: zoom.into(), compress: compress.into(), strip_comments: false, compress_imports: false, session_id: session };
            let pack = coordinator.diff_pack(hunks, depth, budget, options, CancellationToken::new()).await?;
            print_pack(&coordinator, &pack, format.into());
        }

        Commands::Serve => {
            crate::daemon::serve(std::sync::Arc::new(coordinator)).await?;
        }
    }

    Ok(())
}

fn print_pack(coordinator: &Coordinator, pack: &crate::pack::ContextPack, format: OutputFormat) {
    // A CLI-local index snapshot for the serializers that need symbol
    // lookups (ultracompact's short names); reusing the same Arc the
    // Coordinator just packed against avoids a second build.
    let guard = coordinator_index(coordinator);
    let estimator = crate::pack::resolve_estimator("heuristic");
    if let Some(index) = guard.as_ref() {
        print!("{}", serialize::serialize(format, pack, index, estimator.as_ref()));
    }
}

fn coordinator_index(coordinator: &Coordinator) -> arc_swap::Guard<Option<std::sync::Arc<crate::index::ProjectIndex>>> {
    coordinator.index_snapshot()
}

impl From<ZoomArg> for crate::pack::Zoom {
    fn from(value: ZoomArg) -> Self {
        match value {
            ZoomArg::Map => crate::pack::Zoom::Map,
            ZoomArg::Index => crate::pack::Zoom::Index,
            ZoomArg::Sketch => crate::pack::Zoom::Sketch,
            ZoomArg::Windowed => crate::pack::Zoom::Windowed,
            ZoomArg::Full => crate::pack::Zoom::Full,
        }
    }
}

impl From<CompressArg> for crate::pack::Compress {
    fn from(value: CompressArg) -> Self {
        match value {
            CompressArg::None => crate::pack::Compress::None,
            CompressArg::Blocks => crate::pack::Compress::Blocks,
            CompressArg::TwoStage => crate::pack::Compress::TwoStage,
            CompressArg::ChunkSummary => crate::pack::Compress::ChunkSummary,
        }
    }
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Ultracompact => OutputFormat::Ultracompact,
            FormatArg::Json => OutputFormat::Json,
            FormatArg::PackedJson => OutputFormat::PackedJson,
            FormatArg::CacheFriendly => OutputFormat::CacheFriendly,
        }
    }
}
