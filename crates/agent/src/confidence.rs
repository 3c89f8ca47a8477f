//! Confidence policy: maps retrieval quality to a trust tier.

use crate::response::Tier;

/// Aggregate at or above which an answer is considered well grounded.
pub const OK_THRESHOLD: f64 = 0.75;
/// Aggregate at or above which weak grounding is still surfaced.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;
/// Confidence reported for general-knowledge answers.
pub const GENERAL_KNOWLEDGE_CONFIDENCE: f64 = 0.6;

pub const LOW_CONFIDENCE_BANNER: &str = "⚠️ LOW-CONFIDENCE ADVISORY:\n\
The following reasoning is based on limited context. \
Verify carefully against OEM manuals and approved procedures.\n\n";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub tier: Tier,
    pub confidence: f64,
    /// Prepended to the model's answer.
    pub prefix: &'static str,
}

pub fn classify(passage_count: usize, aggregate: f64) -> Assessment {
    match passage_count {
        n if n > 0 && aggregate >= OK_THRESHOLD => Assessment {
            tier: Tier::Ok,
            confidence: aggregate,
            prefix: "",
        },
        n if n > 0 && aggregate >= LOW_CONFIDENCE_THRESHOLD => Assessment {
            tier: Tier::LowConfidence,
            confidence: aggregate,
            prefix: LOW_CONFIDENCE_BANNER,
        },
        _ => Assessment {
            tier: Tier::GeneralKnowledge,
            confidence: GENERAL_KNOWLEDGE_CONFIDENCE,
            prefix: "",
        },
    }
}
