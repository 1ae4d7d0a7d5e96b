//! Assembles the `ReviewPack` handed to the operator at the `review`
//! state: diff + decisions + preference-derived warnings + screenshots +
//! a run-level confidence blending analytics coverage with decision
//! confidence.

use crate::models::{CartDiff, PruneDecision, ReviewPack};
use chrono::{DateTime, Utc};

/// `analytics_coverage` is the fraction of reviewed identities that had
/// purchase history to derive analytics from (§8: empty history ⇒
/// coverage 0, not an error).
pub fn compute_confidence(decisions: &[PruneDecision], analytics_coverage: f64) -> f64 {
    let decision_mean = if decisions.is_empty() {
        0.0
    } else {
        decisions.iter().map(|d| d.confidence).sum::<f64>() / decisions.len() as f64
    };
    (0.5 * analytics_coverage.clamp(0.0, 1.0) + 0.5 * decision_mean).clamp(0.0, 1.0)
}

#[allow(clippy::too_many_arguments)]
pub fn assemble_review_pack(
    run_id: impl Into<String>,
    diff: CartDiff,
    decisions: Vec<PruneDecision>,
    warnings: Vec<String>,
    screenshots: Vec<String>,
    analytics_coverage: f64,
    generated_at: DateTime<Utc>,
) -> ReviewPack {
    let confidence = compute_confidence(&decisions, analytics_coverage);
    ReviewPack {
        run_id: run_id.into(),
        diff,
        decisions,
        warnings,
        screenshots,
        confidence,
        generated_at,
    }
}
