//! Inter-purchase interval statistics (spec §4.4): count, mean, stdDev,
//! min, max, median, and coefficient of variation.

use crate::models::{IntervalStats, PurchaseRecord};

/// `records` must already be sorted or will be sorted here by purchase
/// date; intervals are gaps in days between consecutive purchases.
pub fn compute_interval_stats(records: &[PurchaseRecord]) -> IntervalStats {
    let mut sorted: Vec<&PurchaseRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.purchase_date);

    let intervals: Vec<f64> = sorted
        .windows(2)
        .map(|pair| {
            let days = (pair[1].purchase_date - pair[0].purchase_date).num_seconds() as f64
                / 86_400.0;
            days.max(0.0)
        })
        .collect();

    if intervals.is_empty() {
        return IntervalStats::default();
    }

    let mean = intervals.iter().sum::<f64>() / intervals.len() as f64;
    let variance = intervals.iter().map(|x| (x - mean).powi(2)).sum::<f64>()
        / intervals.len() as f64;
    let std_dev = variance.sqrt();
    let min = intervals.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = intervals.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let median = median_of(&intervals);
    let cv = if mean > 0.0 { std_dev / mean } else { 0.0 };

    IntervalStats {
        count: intervals.len(),
        mean,
        std_dev,
        min,
        max,
        median,
        cv,
    }
}

fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, Utc};

    fn record(days_ago: i64) -> PurchaseRecord {
        PurchaseRecord {
            product_id: Some("p1".to_string()),
            product_name: "Leite".to_string(),
            purchase_date: Utc::now() - ChronoDuration::days(days_ago),
            quantity: 1,
            order_id: format!("o{days_ago}"),
        }
    }

    #[test]
    fn empty_history_is_default() {
        let stats = compute_interval_stats(&[]);
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn single_purchase_has_no_intervals() {
        let stats = compute_interval_stats(&[record(10)]);
        assert_eq!(stats.count, 0);
    }

    #[test]
    fn regular_cadence_has_low_cv() {
        let records = vec![record(60), record(45), record(30), record(15), record(0)];
        let stats = compute_interval_stats(&records);
        assert_eq!(stats.count, 4);
        assert!((stats.mean - 15.0).abs() < 1e-6);
        assert!(stats.cv < 0.05);
    }

    #[test]
    fn median_matches_manual_computation() {
        let records = vec![record(100), record(70), record(50), record(10)];
        let stats = compute_interval_stats(&records);
        // intervals: 30, 20, 40 (sorted by date ascending: 100,70,50,10 ago)
        assert_eq!(stats.count, 3);
    }
}
