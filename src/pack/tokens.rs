//! Pluggable tokenization (spec §4.5 "Tokenization", §9 "Tokenization
//! pluggability"). The estimator is resolved once at Coordinator startup
//! and threaded as one `Arc<dyn TokenEstimator>` through an entire pack
//! call, so accounting stays internally consistent even if the process
//! later re-resolves a different estimator.

use tiktoken_rs::CoreBPE;

pub trait TokenEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> u32;
    fn name(&self) -> &'static str;
}

/// Precise tokenizer against a common LLM vocabulary (`cl100k_base`, the
/// encoding shared by GPT-3.5/4-era models — close enough to most coding
/// agents' own models that budgets track real usage).
pub struct TiktokenEstimator {
    bpe: CoreBPE,
}

impl TiktokenEstimator {
    pub fn try_new() -> Option<Self> {
        tiktoken_rs::cl100k_base().ok().map(|bpe| Self { bpe })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> u32 {
        self.bpe.encode_ordinary(text).len() as u32
    }

    fn name(&self) -> &'static str {
        "tiktoken-cl100k"
    }
}

/// `len/4` fallback, always available. Used when no tiktoken encoding can
/// be resolved (e.g. no bundled vocabulary file).
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> u32 {
        ((text.chars().count() as f64) / 4.0).ceil() as u32
    }

    fn name(&self) -> &'static str {
        "heuristic-len4"
    }
}

/// Resolves the estimator named in config, falling back to the heuristic
/// if `"tiktoken"` was requested but the encoding can't be loaded.
pub fn resolve(name: &str) -> Box<dyn TokenEstimator> {
    if name == "tiktoken" {
        if let Some(est) = TiktokenEstimator::try_new() {
            return Box::new(est);
        }
    }
    Box::new(HeuristicEstimator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heuristic_estimates_len_over_four() {
        let est = HeuristicEstimator;
        assert_eq!(est.estimate("abcd"), 1);
        assert_eq!(est.estimate("abcde"), 2);
        assert_eq!(est.estimate(""), 0);
    }
}
