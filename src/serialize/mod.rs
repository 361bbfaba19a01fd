//! Output Serializers (spec §4.8): five deterministic renderings of a
//! `ContextPack`. All share the same token estimator instance as the pack
//! call that produced the data, so any token counts they report match.

pub mod cache_friendly;
pub mod json;
pub mod text;
pub mod ultracompact;

use crate::index::ProjectIndex;
use crate::pack::{ContextPack, TokenEstimator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Ultracompact,
    Json,
    PackedJson,
    CacheFriendly,
}

pub fn serialize(format: OutputFormat, pack: &ContextPack, index: &ProjectIndex, estimator: &dyn TokenEstimator) -> String {
    match format {
        OutputFormat::Text => text::render(pack),
        OutputFormat::Ultracompact => ultracompact::render(pack, index),
        OutputFormat::Json => json::render(pack, false),
        OutputFormat::PackedJson => json::render(pack, true),
        OutputFormat::CacheFriendly => cache_friendly::render(pack, estimator),
    }
}
