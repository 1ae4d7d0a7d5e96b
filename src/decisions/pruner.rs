//! StockPruner decision precedence (spec §4.5, highest wins):
//! 1. user override
//! 2. duplicate in cart
//! 3. no history
//! 4. timing
//! 5. conservative-mode downgrade
//!
//! Modeled on `RiskManager::calculate_position`'s ordered-guardrail style
//! (kelly cap → regime → drawdown → liquidity), just for a binary
//! prune/keep decision instead of a position size.

use crate::decisions::cadence::calculate_cadence;
use crate::decisions::category::Category;
use crate::decisions::timing::{classify_timing, TimingClass};
use crate::models::{OverrideKind, ProductAnalytics, PruneDecision, UserOverride};
use chrono::Utc;
use serde_json::json;

const DUPLICATE_CONFIDENCE: f64 = 0.9;
const NO_HISTORY_CONFIDENCE: f64 = 0.2;
const MIN_REQUIRED_PURCHASES: usize = 3;

pub struct PruneContext<'a> {
    pub identity: &'a str,
    pub category: Category,
    pub analytics: Option<&'a ProductAnalytics>,
    pub purchase_count: usize,
    pub user_override: Option<&'a UserOverride>,
    pub is_duplicate_in_cart: bool,
    pub conservative_mode: bool,
    pub min_prune_confidence: f64,
}

pub fn decide_prune(ctx: &PruneContext<'_>) -> PruneDecision {
    if let Some(over) = ctx.user_override {
        match over.kind {
            Some(OverrideKind::AlwaysPrune) => {
                return PruneDecision {
                    product_identity: ctx.identity.to_string(),
                    prune: true,
                    confidence: 1.0,
                    reason: "user override: always prune".to_string(),
                    context: json!({ "source": "user_override" }),
                };
            }
            Some(OverrideKind::NeverPrune) => {
                return PruneDecision {
                    product_identity: ctx.identity.to_string(),
                    prune: false,
                    confidence: 1.0,
                    reason: "user override: never prune".to_string(),
                    context: json!({ "source": "user_override" }),
                };
            }
            None => {}
        }
    }

    if ctx.is_duplicate_in_cart {
        return PruneDecision {
            product_identity: ctx.identity.to_string(),
            prune: true,
            confidence: DUPLICATE_CONFIDENCE,
            reason: "duplicate of an item already in the cart".to_string(),
            context: json!({ "source": "duplicate_in_cart" }),
        };
    }

    let Some(analytics) = ctx.analytics else {
        return PruneDecision {
            product_identity: ctx.identity.to_string(),
            prune: false,
            confidence: NO_HISTORY_CONFIDENCE,
            reason: "no purchase history available".to_string(),
            context: json!({ "source": "no_history" }),
        };
    };

    let Some(last_purchase) = analytics.last_purchase_date else {
        return PruneDecision {
            product_identity: ctx.identity.to_string(),
            prune: false,
            confidence: NO_HISTORY_CONFIDENCE,
            reason: "no purchase history available".to_string(),
            context: json!({ "source": "no_history" }),
        };
    };

    let cadence = calculate_cadence(
        ctx.purchase_count,
        &analytics.interval_stats,
        ctx.category,
        MIN_REQUIRED_PURCHASES,
    );
    let cadence_days = ctx
        .user_override
        .and_then(|o| o.custom_cadence_days)
        .map(|d| d as f64)
        .unwrap_or(cadence.cadence_days);

    let days_since_purchase = (Utc::now() - last_purchase).num_seconds() as f64 / 86_400.0;
    let timing = classify_timing(Some(days_since_purchase), cadence_days);

    let (prune, confidence) = match timing {
        TimingClass::RecentlyPurchased => (true, cadence.confidence.max(0.6)),
        TimingClass::Adequate => (false, cadence.confidence.max(0.4)),
        TimingClass::DueSoon => (false, cadence.confidence.max(0.7)),
        TimingClass::Overdue => (false, cadence.confidence.max(0.85)),
        TimingClass::Unknown => (false, NO_HISTORY_CONFIDENCE),
    };

    let context = json!({
        "source": "timing",
        "timing": format!("{timing:?}"),
        "cadence_days": cadence_days,
        "days_since_purchase": days_since_purchase,
    });

    if ctx.conservative_mode && prune && confidence < ctx.min_prune_confidence {
        return PruneDecision {
            product_identity: ctx.identity.to_string(),
            prune: false,
            confidence,
            reason: "conservative mode: confidence below threshold, downgraded to keep".to_string(),
            context,
        };
    }

    PruneDecision {
        product_identity: ctx.identity.to_string(),
        prune,
        confidence,
        reason: format!("timing classification: {timing:?}"),
        context,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IntervalStats;
    use chrono::Duration as ChronoDuration;

    fn analytics_with_last_purchase(days_ago: i64) -> ProductAnalytics {
        ProductAnalytics {
            identity: "leite".to_string(),
            interval_stats: IntervalStats {
                count: 10,
                mean: 7.0,
                std_dev: 0.5,
                min: 6.0,
                max: 8.0,
                median: 7.0,
                cv: 0.07,
            },
            quantity_stats: Default::default(),
            trend: None,
            seasonality: None,
            frequently_bought_with: vec![],
            analytics_confidence: 0.8,
            last_purchase_date: Some(Utc::now() - ChronoDuration::days(days_ago)),
        }
    }

    #[test]
    fn always_prune_override_wins_regardless_of_timing() {
        let analytics = analytics_with_last_purchase(1);
        let over = UserOverride {
            product_identity: "leite".to_string(),
            kind: Some(OverrideKind::AlwaysPrune),
            custom_cadence_days: None,
        };
        let ctx = PruneContext {
            identity: "leite",
            category: Category::Dairy,
            analytics: Some(&analytics),
            purchase_count: 10,
            user_override: Some(&over),
            is_duplicate_in_cart: false,
            conservative_mode: true,
            min_prune_confidence: 0.9,
        };
        let decision = decide_prune(&ctx);
        assert!(decision.prune);
        assert_eq!(decision.confidence, 1.0);
    }

    #[test]
    fn duplicate_in_cart_outranks_timing() {
        let analytics = analytics_with_last_purchase(30);
        let ctx = PruneContext {
            identity: "leite",
            category: Category::Dairy,
            analytics: Some(&analytics),
            purchase_count: 10,
            user_override: None,
            is_duplicate_in_cart: true,
            conservative_mode: false,
            min_prune_confidence: 0.5,
        };
        let decision = decide_prune(&ctx);
        assert!(decision.prune);
        assert!(decision.confidence >= 0.9);
    }

    #[test]
    fn no_history_keeps_conservatively() {
        let ctx = PruneContext {
            identity: "novidade",
            category: Category::Unknown,
            analytics: None,
            purchase_count: 0,
            user_override: None,
            is_duplicate_in_cart: false,
            conservative_mode: false,
            min_prune_confidence: 0.5,
        };
        let decision = decide_prune(&ctx);
        assert!(!decision.prune);
        assert!(decision.confidence < 0.5);
    }

    #[test]
    fn recently_purchased_is_pruned() {
        let analytics = analytics_with_last_purchase(1);
        let ctx = PruneContext {
            identity: "leite",
            category: Category::Dairy,
            analytics: Some(&analytics),
            purchase_count: 10,
            user_override: None,
            is_duplicate_in_cart: false,
            conservative_mode: false,
            min_prune_confidence: 0.5,
        };
        let decision = decide_prune(&ctx);
        assert!(decision.prune);
    }

    #[test]
    fn overdue_item_is_kept() {
        let analytics = analytics_with_last_purchase(60);
        let ctx = PruneContext {
            identity: "leite",
            category: Category::Dairy,
            analytics: Some(&analytics),
            purchase_count: 10,
            user_override: None,
            is_duplicate_in_cart: false,
            conservative_mode: false,
            min_prune_confidence: 0.5,
        };
        let decision = decide_prune(&ctx);
        assert!(!decision.prune);
    }

    #[test]
    fn conservative_mode_downgrades_low_confidence_prune() {
        let analytics = analytics_with_last_purchase(1);
        let ctx = PruneContext {
            identity: "leite",
            category: Category::Dairy,
            analytics: Some(&analytics),
            purchase_count: 10,
            user_override: None,
            is_duplicate_in_cart: false,
            conservative_mode: true,
            min_prune_confidence: 0.99,
        };
        let decision = decide_prune(&ctx);
        assert!(!decision.prune);
        assert!(decision.reason.contains("conservative"));
    }
}
