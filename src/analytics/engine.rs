//! Wires interval/quantity/trend/seasonality/co-purchase stats into one
//! `ProductAnalytics` per product identity (spec §4.4).

use crate::analytics::copurchase::{compute_co_purchase_graph, CoPurchaseConfig};
use crate::analytics::interval_stats::compute_interval_stats;
use crate::analytics::quantity_stats::compute_quantity_stats;
use crate::analytics::seasonality::compute_seasonality;
use crate::analytics::trend::compute_trend;
use crate::models::{ProductAnalytics, PurchaseRecord};
use chrono::{Datelike, Utc};
use std::collections::HashMap;

pub struct AnalyticsConfig {
    pub recent_window_size: usize,
    pub co_purchase: CoPurchaseConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            recent_window_size: 3,
            co_purchase: CoPurchaseConfig::default(),
        }
    }
}

/// `sigma((n-3)/5)`, clamped to `[0.1, 0.99]` (spec §4.4 confidence curve).
fn analytics_confidence(sample_count: usize) -> f64 {
    let x = (sample_count as f64 - 3.0) / 5.0;
    let sigmoid = 1.0 / (1.0 + (-x).exp());
    sigmoid.clamp(0.1, 0.99)
}

fn group_by_identity(records: &[PurchaseRecord]) -> HashMap<String, Vec<PurchaseRecord>> {
    let mut groups: HashMap<String, Vec<PurchaseRecord>> = HashMap::new();
    for record in records {
        groups.entry(record.identity()).or_default().push(record.clone());
    }
    groups
}

pub fn compute_analytics(
    records: &[PurchaseRecord],
    config: &AnalyticsConfig,
) -> HashMap<String, ProductAnalytics> {
    let groups = group_by_identity(records);
    let co_purchase_graph = compute_co_purchase_graph(records, &config.co_purchase);
    let current_month = Utc::now().month();

    groups
        .into_iter()
        .map(|(identity, group_records)| {
            let interval_stats = compute_interval_stats(&group_records);
            let quantity_stats = compute_quantity_stats(&group_records);
            let trend = compute_trend(&group_records, config.recent_window_size);
            let seasonality = compute_seasonality(&group_records, current_month);
            let frequently_bought_with = co_purchase_graph.get(&identity).cloned().unwrap_or_default();
            let last_purchase_date = group_records.iter().map(|r| r.purchase_date).max();
            let analytics_confidence = analytics_confidence(group_records.len());

            let analytics = ProductAnalytics {
                identity: identity.clone(),
                interval_stats,
                quantity_stats,
                trend,
                seasonality,
                frequently_bought_with,
                analytics_confidence,
                last_purchase_date,
            };
            (identity, analytics)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn record(identity: &str, days_ago: i64) -> PurchaseRecord {
        PurchaseRecord {
            product_id: Some(identity.to_string()),
            product_name: identity.to_string(),
            purchase_date: Utc::now() - ChronoDuration::days(days_ago),
            quantity: 1,
            order_id: format!("o-{identity}-{days_ago}"),
        }
    }

    #[test]
    fn confidence_grows_with_sample_size() {
        assert!(analytics_confidence(2) < analytics_confidence(20));
        assert!(analytics_confidence(2) >= 0.1);
        assert!(analytics_confidence(50) <= 0.99);
    }

    #[test]
    fn groups_records_by_identity_and_fills_last_purchase_date() {
        let records = vec![record("leite", 30), record("leite", 0), record("pao", 5)];
        let analytics = compute_analytics(&records, &AnalyticsConfig::default());
        assert_eq!(analytics.len(), 2);
        let leite = &analytics["leite"];
        assert!(leite.last_purchase_date.is_some());
        assert_eq!(leite.interval_stats.count, 1);
    }
}
