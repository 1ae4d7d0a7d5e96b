//! Seasonality scoring (spec §4.4): chi-square goodness-of-fit of the
//! month-of-purchase histogram against a uniform distribution.

use crate::models::{PurchaseRecord, SeasonalityStats};
use chrono::Datelike;
use statrs::distribution::{ChiSquared, ContinuousCDF};

const MONTHS: usize = 12;

fn month_histogram(records: &[PurchaseRecord]) -> [u32; MONTHS] {
    let mut hist = [0u32; MONTHS];
    for r in records {
        let month = r.purchase_date.month0() as usize;
        hist[month] += 1;
    }
    hist
}

/// Normalizes the chi-square statistic to `[0, 1]` via the chi-square CDF
/// at 11 degrees of freedom: a statistic deep in the upper tail (unlikely
/// under a uniform null) scores close to 1.
fn normalize_chi_square(statistic: f64) -> f64 {
    let Ok(dist) = ChiSquared::new((MONTHS - 1) as f64) else {
        return 0.0;
    };
    dist.cdf(statistic).clamp(0.0, 1.0)
}

pub fn compute_seasonality(records: &[PurchaseRecord], current_month: u32) -> Option<SeasonalityStats> {
    if records.len() < MONTHS {
        return None;
    }

    let hist = month_histogram(records);
    let total: u32 = hist.iter().sum();
    if total == 0 {
        return None;
    }
    let expected = total as f64 / MONTHS as f64;

    let chi_square: f64 = hist
        .iter()
        .map(|&observed| {
            let diff = observed as f64 - expected;
            diff * diff / expected
        })
        .sum();

    let score = normalize_chi_square(chi_square);

    let (peak_index, _) = hist
        .iter()
        .enumerate()
        .max_by_key(|(_, count)| **count)
        .unwrap();
    let (trough_index, _) = hist
        .iter()
        .enumerate()
        .min_by_key(|(_, count)| **count)
        .unwrap();

    let peak_month = (peak_index + 1) as u32;
    let trough_month = (trough_index + 1) as u32;
    let is_currently_peak_season = current_month == peak_month;

    Some(SeasonalityStats {
        score,
        peak_month,
        trough_month,
        is_currently_peak_season,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record_in_month(month: u32) -> PurchaseRecord {
        PurchaseRecord {
            product_id: Some("p1".to_string()),
            product_name: "Sidra".to_string(),
            purchase_date: Utc.with_ymd_and_hms(2025, month, 15, 0, 0, 0).unwrap(),
            quantity: 1,
            order_id: format!("o-{month}"),
        }
    }

    #[test]
    fn too_few_purchases_is_none() {
        let records: Vec<_> = (1..=5).map(record_in_month).collect();
        assert!(compute_seasonality(&records, 12).is_none());
    }

    #[test]
    fn heavy_december_skew_peaks_in_december() {
        let mut records: Vec<_> = (1..=12).map(record_in_month).collect();
        for _ in 0..20 {
            records.push(record_in_month(12));
        }
        let stats = compute_seasonality(&records, 12).unwrap();
        assert_eq!(stats.peak_month, 12);
        assert!(stats.is_currently_peak_season);
        assert!(stats.score > 0.5);
    }

    #[test]
    fn uniform_distribution_scores_low() {
        let records: Vec<_> = (1..=12).map(record_in_month).collect();
        let stats = compute_seasonality(&records, 6).unwrap();
        assert!(stats.score < 0.5);
    }
}
