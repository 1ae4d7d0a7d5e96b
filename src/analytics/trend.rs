//! Velocity trend (spec §4.4): recent-vs-historical delta plus an OLS fit
//! over intervals, classified into accelerating/decelerating/stable.

use crate::models::{PurchaseRecord, TrendStats, VelocityTrend};

const ACCELERATING_SLOPE_THRESHOLD: f64 = -0.5;
const DECELERATING_SLOPE_THRESHOLD: f64 = 0.5;
const TREND_R_SQUARED_THRESHOLD: f64 = 0.3;

fn purchase_intervals_days(records: &[PurchaseRecord]) -> Vec<f64> {
    let mut sorted: Vec<&PurchaseRecord> = records.iter().collect();
    sorted.sort_by_key(|r| r.purchase_date);
    sorted
        .windows(2)
        .map(|pair| {
            ((pair[1].purchase_date - pair[0].purchase_date).num_seconds() as f64 / 86_400.0)
                .max(0.0)
        })
        .collect()
}

/// Ordinary least squares fit `y = a + bx` over `(index, interval)` pairs.
/// Returns `(slope, r_squared)`; `r_squared` is 0 when fewer than 2 points
/// or the intervals have zero variance.
fn ols_fit(intervals: &[f64]) -> (f64, f64) {
    let n = intervals.len();
    if n < 2 {
        return (0.0, 0.0);
    }

    let xs: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let x_mean = xs.iter().sum::<f64>() / n as f64;
    let y_mean = intervals.iter().sum::<f64>() / n as f64;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for i in 0..n {
        sxy += (xs[i] - x_mean) * (intervals[i] - y_mean);
        sxx += (xs[i] - x_mean).powi(2);
    }

    if sxx == 0.0 {
        return (0.0, 0.0);
    }

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;

    let ss_tot: f64 = intervals.iter().map(|y| (y - y_mean).powi(2)).sum();
    if ss_tot == 0.0 {
        return (slope, 0.0);
    }
    let ss_res: f64 = xs
        .iter()
        .zip(intervals.iter())
        .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
        .sum();
    let r_squared = (1.0 - ss_res / ss_tot).clamp(0.0, 1.0);

    (slope, r_squared)
}

fn classify_velocity(slope: f64, r_squared: f64) -> VelocityTrend {
    if slope < ACCELERATING_SLOPE_THRESHOLD && r_squared > TREND_R_SQUARED_THRESHOLD {
        VelocityTrend::Accelerating
    } else if slope > DECELERATING_SLOPE_THRESHOLD && r_squared > TREND_R_SQUARED_THRESHOLD {
        VelocityTrend::Decelerating
    } else {
        VelocityTrend::Stable
    }
}

/// `recent_window_size` is the number of trailing intervals treated as
/// "recent"; the remainder (if any) is "historical". Returns `None` when
/// there are fewer than 2 intervals total.
pub fn compute_trend(records: &[PurchaseRecord], recent_window_size: usize) -> Option<TrendStats> {
    let intervals = purchase_intervals_days(records);
    if intervals.len() < 2 {
        return None;
    }

    let window = recent_window_size.min(intervals.len()).max(1);
    let recent = &intervals[intervals.len() - window..];
    let historical_len = intervals.len().saturating_sub(window);
    let historical = if historical_len > 0 {
        &intervals[..historical_len]
    } else {
        intervals.as_slice()
    };

    let recent_mean = recent.iter().sum::<f64>() / recent.len() as f64;
    let historical_mean = historical.iter().sum::<f64>() / historical.len() as f64;

    let delta = if historical_mean > 0.0 {
        (recent_mean - historical_mean) / historical_mean
    } else {
        0.0
    };

    let (slope, r_squared) = ols_fit(&intervals);
    let velocity_trend = classify_velocity(slope, r_squared);

    Some(TrendStats {
        delta,
        slope,
        r_squared,
        velocity_trend,
    })
}
