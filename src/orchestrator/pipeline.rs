//! End-to-end review pack assembly (spec §3/§4.7): turns order history plus
//! the live cart into a `ReviewPack` by running analytics, the pruning
//! ladder, and the diff assembler in sequence. This is the orchestrator's
//! "review" phase body — everything up to here only reads; nothing here
//! ever calls `reorder`.

use crate::analytics::engine::{compute_analytics, AnalyticsConfig};
use crate::analytics::identity::normalize_name;
use crate::decisions::category::detect_category;
use crate::decisions::pruner::{decide_prune, PruneContext};
use crate::models::{
    CartItem, CartSnapshot, OrderDetail, ProductAnalytics, PruneDecision, PurchaseRecord,
    ReviewPack, UserOverride,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

pub struct PipelineConfig {
    pub analytics: AnalyticsConfig,
    pub min_prune_confidence: f64,
    pub conservative_mode: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analytics: AnalyticsConfig::default(),
            min_prune_confidence: 0.6,
            conservative_mode: false,
        }
    }
}

fn purchase_records(orders: &[OrderDetail]) -> Vec<PurchaseRecord> {
    orders
        .iter()
        .flat_map(|order| {
            order.items.iter().map(move |item| PurchaseRecord {
                product_id: item.product_id.clone(),
                product_name: item.name.clone(),
                purchase_date: order.summary.date,
                quantity: item.quantity,
                order_id: order.summary.order_id.clone(),
            })
        })
        .collect()
}

/// The candidate cart to review: the line items from the most recent
/// order, before any pruning. Reconstructing from the single latest order
/// (rather than a union of every past order) keeps the candidate cart
/// close to what the household last actually bought together.
fn candidate_items(orders: &[OrderDetail]) -> Vec<CartItem> {
    let Some(latest) = orders.iter().max_by_key(|o| o.summary.date) else {
        return Vec::new();
    };
    latest
        .items
        .iter()
        .map(|item| CartItem {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            available: true,
        })
        .collect()
}

fn purchase_counts(records: &[PurchaseRecord]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for record in records {
        *counts.entry(record.identity()).or_insert(0usize) += 1;
    }
    counts
}

fn override_for<'a>(overrides: &'a [UserOverride], identity: &str) -> Option<&'a UserOverride> {
    overrides.iter().find(|o| o.product_identity == identity)
}

fn decide_one(
    item: &CartItem,
    analytics: Option<&ProductAnalytics>,
    purchase_count: usize,
    user_override: Option<&UserOverride>,
    is_duplicate_in_cart: bool,
    config: &PipelineConfig,
) -> PruneDecision {
    let identity = item.identity();
    let normalized = normalize_name(&item.name);
    let category = detect_category(&normalized).category;

    let ctx = PruneContext {
        identity: &identity,
        category,
        analytics,
        purchase_count,
        user_override,
        is_duplicate_in_cart,
        conservative_mode: config.conservative_mode,
        min_prune_confidence: config.min_prune_confidence,
    };
    decide_prune(&ctx)
}

/// Runs the full history → analytics → pruning → diff pipeline and
/// returns the assembled review pack. `live_cart` is the "before" state;
/// the candidate cart (minus pruned items) is the "after" state.
pub fn build_review_pack(
    run_id: &str,
    orders: &[OrderDetail],
    live_cart: &CartSnapshot,
    overrides: &[UserOverride],
    config: &PipelineConfig,
    generated_at: DateTime<Utc>,
) -> ReviewPack {
    let records = purchase_records(orders);
    let analytics_map = compute_analytics(&records, &config.analytics);
    let counts = purchase_counts(&records);
    let candidates = candidate_items(orders);

    let live_identities: std::collections::HashSet<String> =
        live_cart.items.iter().map(CartItem::identity).collect();

    let mut decisions = Vec::with_capacity(candidates.len());
    let mut kept_items = Vec::with_capacity(candidates.len());

    for item in &candidates {
        let identity = item.identity();
        let analytics = analytics_map.get(&identity);
        let purchase_count = counts.get(&identity).copied().unwrap_or(0);
        let user_override = override_for(overrides, &identity);
        let is_duplicate_in_cart = live_identities.contains(&identity);

        let decision = decide_one(
            item,
            analytics,
            purchase_count,
            user_override,
            is_duplicate_in_cart,
            config,
        );
        if !decision.prune {
            kept_items.push(item.clone());
        }
        decisions.push(decision);
    }

    let after_total: f64 = kept_items.iter().map(|i| i.unit_price * i.quantity as f64).sum();
    let after_count: u32 = kept_items.len() as u32;
    let after_cart = CartSnapshot {
        timestamp: generated_at,
        items: kept_items,
        item_count: after_count,
        total_price: after_total,
    };

    let diff = crate::diff::compute_diff(live_cart, &after_cart);

    let analytics_coverage = if candidates.is_empty() {
        0.0
    } else {
        candidates
            .iter()
            .filter(|i| analytics_map.contains_key(&i.identity()))
            .count() as f64
            / candidates.len() as f64
    };

    crate::diff::assemble_review_pack(
        run_id,
        diff,
        decisions,
        Vec::new(),
        Vec::new(),
        analytics_coverage,
        generated_at,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CostSummary, DeliveryInfo, OrderLineItem, OrderSummary};
    use chrono::Duration as ChronoDuration;

    fn detail(order_id: &str, days_ago: i64, items: Vec<OrderLineItem>) -> OrderDetail {
        let subtotal: f64 = items.iter().map(OrderLineItem::derived_total).sum();
        OrderDetail {
            summary: OrderSummary {
                order_id: order_id.to_string(),
                date: Utc::now() - ChronoDuration::days(days_ago),
                product_count: items.len() as u32,
                total_price: subtotal,
                detail_url: format!("https://www.auchan.pt/orders/{order_id}"),
            },
            items,
            delivery: DeliveryInfo {
                window: None,
                address: None,
            },
            cost_summary: CostSummary {
                subtotal,
                delivery_fee: 0.0,
                total: subtotal,
            },
        }
    }

    fn item(product_id: &str, name: &str, qty: u32, price: f64) -> OrderLineItem {
        OrderLineItem {
            product_id: Some(product_id.to_string()),
            name: name.to_string(),
            url: None,
            image: None,
            quantity: qty,
            unit_price: price,
        }
    }

    #[test]
    fn empty_order_history_yields_zero_confidence_pack() {
        let live_cart = CartSnapshot::empty(Utc::now());
        let pack = build_review_pack(
            "run-1",
            &[],
            &live_cart,
            &[],
            &PipelineConfig::default(),
            Utc::now(),
        );
        assert_eq!(pack.confidence, 0.0);
        assert!(pack.decisions.is_empty());
        assert!(pack.diff.added.is_empty());
    }

    #[test]
    fn always_prune_override_removes_item_from_after_cart() {
        let orders = vec![detail(
            "O1",
            1,
            vec![item("P1", "Leite Meio Gordo", 2, 1.2)],
        )];
        let live_cart = CartSnapshot::empty(Utc::now());
        let overrides = vec![UserOverride {
            product_identity: "P1".to_string(),
            kind: Some(crate::models::OverrideKind::AlwaysPrune),
            custom_cadence_days: None,
        }];

        let pack = build_review_pack(
            "run-1",
            &orders,
            &live_cart,
            &overrides,
            &PipelineConfig::default(),
            Utc::now(),
        );

        assert_eq!(pack.decisions.len(), 1);
        assert!(pack.decisions[0].prune);
        assert!(pack.diff.added.is_empty());
    }

    #[test]
    fn item_with_no_override_and_no_history_is_kept_and_added() {
        let orders = vec![detail(
            "O1",
            1,
            vec![item("P2", "Cafe Moido", 1, 3.5)],
        )];
        let live_cart = CartSnapshot::empty(Utc::now());

        let pack = build_review_pack(
            "run-1",
            &orders,
            &live_cart,
            &[],
            &PipelineConfig::default(),
            Utc::now(),
        );

        assert_eq!(pack.decisions.len(), 1);
        assert!(!pack.decisions[0].prune);
        assert_eq!(pack.diff.added.len(), 1);
        assert_eq!(pack.diff.added[0].identity, "P2");
    }
}
