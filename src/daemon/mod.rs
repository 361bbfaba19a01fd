//! Daemon transport (SPEC_FULL.md §2): a long-lived Coordinator behind a
//! line-delimited JSON request/response loop over stdio. The transport
//! itself is out of scope per spec §1 beyond the request/response contract;
//! this is intentionally the thinnest thing that exercises it.

use crate::coordinator::Coordinator;
use crate::diff::Hunk;
use crate::pack::PackOptions;
use crate::serialize::OutputFormat;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Request {
    BuildIndex,
    ResolveEntry { entry: String },
    Pack { seed: Vec<String>, depth: u8, budget: u32 },
    DiffPack { hunks: Vec<Hunk>, depth: u8, budget: u32 },
    Status,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Response {
    Ok { result: serde_json::Value },
    Err { error: String },
}

/// Reads one JSON request per line from stdin, writes one JSON response per
/// line to stdout. Exits when stdin closes.
pub async fn serve(coordinator: Arc<Coordinator>) -> anyhow::Result<()> {
    info!("daemon listening on stdio");
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(&coordinator, &line).await;
        let bytes = serde_json::to_vec(&response).unwrap_or_else(|_| b"{\"error\":\"serialization failed\"}".to_vec());
        stdout.write_all(&bytes)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
    }
    Ok(())
}

async fn handle_line(coordinator: &Coordinator, line: &str) -> Response {
    let request: Request = match serde_json::from_str(line) {
        Ok(req) => req,
        Err(cause) => return Response::Err { error: format!("malformed request: {cause}") },
    };

    match request {
        Request::BuildIndex => match coordinator.build_index().await {
            Ok(fingerprint) => Response::Ok { result: serde_json::json!({ "fingerprint": fingerprint }) },
            Err(cause) => {
                error!(%cause, "BuildIndex failed");
                Response::Err { error: cause.to_string() }
            }
        },
        Request::ResolveEntry { entry } => match coordinator.resolve_entry(&entry) {
            Ok(id) => Response::Ok { result: serde_json::json!({ "id": id.as_str() }) },
            Err(cause) => Response::Err { error: cause.to_string() },
        },
        Request::Pack { seed, depth, budget } => {
            let ids: Result<Vec<_>, _> = seed.iter().map(|e| coordinator.resolve_entry(e)).collect();
            let ids = match ids {
                Ok(ids) => ids,
                Err(cause) => return Response::Err { error: cause.to_string() },
            };
            match coordinator.pack(ids, depth, budget, PackOptions::default(), CancellationToken::new()).await {
                Ok(pack) => {
                    let guard = coordinator.index_snapshot();
                    let estimator = crate::pack::resolve_estimator("heuristic");
                    let rendered = guard
                        .as_ref()
                        .map(|index| crate::serialize::serialize(OutputFormat::Json, &pack, index, estimator.as_ref()))
                        .unwrap_or_default();
                    Response::Ok { result: serde_json::from_str(&rendered).unwrap_or(serde_json::Value::Null) }
                }
                Err(cause) => Response::Err { error: cause.to_string() },
            }
        }
        Request::DiffPack { hunks, depth, budget } => {
            match coordinator.diff_pack(hunks, depth, budget, PackOptions::default(), CancellationToken::new()).await {
                Ok(pack) => {
                    let guard = coordinator.index_snapshot();
                    let estimator = crate::pack::resolve_estimator("heuristic");
                    let rendered = guard
                        .as_ref()
                        .map(|index| crate::serialize::serialize(OutputFormat::Json, &pack, index, estimator.as_ref()))
                        .unwrap_or_default();
                    Response::Ok { result: serde_json::from_str(&rendered).unwrap_or(serde_json::Value::Null) }
                }
                Err(cause) => {
                    error!(%cause, "DiffPack failed");
                    Response::Err { error: cause.to_string() }
                }
            }
        }
        Request::Status => {
            let status = coordinator.status();
            Response::Ok {
                result: serde_json::json!({
                    "indexed": status.indexed,
                    "symbol_count": status.symbol_count,
                    "file_count": status.file_count,
                    "rebuild_in_flight": status.rebuild_in_flight,
                    "last_invalidated_unix": status.last_invalidated_unix,
                }),
            }
        }
    }
}
