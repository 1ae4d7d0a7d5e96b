//! Cadence calculator (spec §4.5): median inter-purchase interval,
//! clamped to `[1, 180]` days, falling back to the category default when
//! history is too thin.

use crate::decisions::category::Category;
use crate::models::IntervalStats;

const MIN_CADENCE_DAYS: f64 = 1.0;
const MAX_CADENCE_DAYS: f64 = 180.0;

pub struct CadenceEstimate {
    pub cadence_days: f64,
    pub confidence: f64,
    pub from_category_default: bool,
}

/// `purchase_count` is the number of purchases backing `interval_stats`
/// (not the interval count, which is one fewer).
pub fn calculate_cadence(
    purchase_count: usize,
    interval_stats: &IntervalStats,
    category: Category,
    min_required: usize,
) -> CadenceEstimate {
    if purchase_count < min_required {
        // Confidence rises with whatever little history exists, capped
        // within the category-default band.
        let confidence = (0.3 + 0.05 * purchase_count as f64).min(0.5);
        return CadenceEstimate {
            cadence_days: category.default_cadence_days() as f64,
            confidence,
            from_category_default: true,
        };
    }

    let cadence_days = interval_stats.median.clamp(MIN_CADENCE_DAYS, MAX_CADENCE_DAYS);

    // More purchases raises confidence; higher variability (CV) lowers it.
    let count_term = (interval_stats.count as f64 / 10.0).min(0.5);
    let variability_penalty = (interval_stats.cv * 0.3).min(0.4);
    let confidence = (0.5 + count_term - variability_penalty).clamp(0.1, 0.95);

    CadenceEstimate {
        cadence_days,
        confidence,
        from_category_default: false,
    }
}
