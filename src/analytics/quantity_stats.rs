//! Per-purchase quantity statistics (spec §4.4): mean, stdDev, mode, total.

use crate::models::{PurchaseRecord, QuantityStats};
use std::collections::HashMap;

pub fn compute_quantity_stats(records: &[PurchaseRecord]) -> QuantityStats {
    if records.is_empty() {
        return QuantityStats::default();
    }

    let quantities: Vec<f64> = records.iter().map(|r| r.quantity as f64).collect();
    let total: f64 = quantities.iter().sum();
    let mean = total / quantities.len() as f64;
    let variance = quantities.iter().map(|q| (q - mean).powi(2)).sum::<f64>()
        / quantities.len() as f64;
    let std_dev = variance.sqrt();

    let mut counts: HashMap<u32, u32> = HashMap::new();
    for r in records {
        *counts.entry(r.quantity).or_insert(0) += 1;
    }
    let mode = counts
        .into_iter()
        .max_by_key(|(_, count)| *count)
        .map(|(qty, _)| qty as f64)
        .unwrap_or(mean);

    QuantityStats {
        mean,
        std_dev,
        mode,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(qty: u32) -> PurchaseRecord {
        PurchaseRecord {
            product_id: Some("p1".to_string()),
            product_name: "Leite".to_string(),
            purchase_date: Utc::now(),
            quantity: qty,
            order_id: "o1".to_string(),
        }
    }

    #[test]
    fn empty_history_is_default() {
        assert_eq!(compute_quantity_stats(&[]).total, 0.0);
    }

    #[test]
    fn mode_picks_most_frequent_quantity() {
        let records = vec![record(2), record(2), record(3)];
        let stats = compute_quantity_stats(&records);
        assert_eq!(stats.mode, 2.0);
        assert_eq!(stats.total, 7.0);
    }

    #[test]
    fn mean_and_std_dev_computed_correctly() {
        let records = vec![record(1), record(3)];
        let stats = compute_quantity_stats(&records);
        assert!((stats.mean - 2.0).abs() < 1e-9);
        assert!((stats.std_dev - 1.0).abs() < 1e-9);
    }
}
