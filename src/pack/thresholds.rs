//! Named soft-ceiling constants per `compress` mode (spec §9 Open
//! Question, resolved here): a single named constant per mode, referenced
//! everywhere rather than inlined as a magic number.

/// `compress = Blocks`: hand a body to the Block Compressor once it
/// exceeds this many estimated tokens.
pub const SOFT_CEILING_BLOCKS: usize = 400;

/// `compress = TwoStage`: a tighter ceiling since the first stage already
/// summarizes, leaving less room before the second stage must compress
/// further.
pub const SOFT_CEILING_TWO_STAGE: usize = 250;

/// `compress = ChunkSummary`: the tightest ceiling — bodies beyond this
/// are replaced by a generated summary rather than compressed code.
pub const SOFT_CEILING_CHUNK_SUMMARY: usize = 150;

/// Resolves the soft ceiling for a given compression mode. `None` (no
/// compression) has no ceiling — a body that doesn't fit degrades straight
/// to signature-only.
pub fn soft_ceiling(compress: crate::pack::Compress) -> Option<usize> {
    use crate::pack::Compress;
    match compress {
        Compress::None => None,
        Compress::Blocks => Some(SOFT_CEILING_BLOCKS),
        Compress::TwoStage => Some(SOFT_CEILING_TWO_STAGE),
        Compress::ChunkSummary => Some(SOFT_CEILING_CHUNK_SUMMARY),
    }
}
