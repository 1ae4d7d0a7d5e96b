//! Timing classifier (spec §4.5): `urgencyRatio = daysSincePurchase /
//! cadenceDays`, thresholded into four bands.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingClass {
    RecentlyPurchased,
    Adequate,
    DueSoon,
    Overdue,
    Unknown,
}

pub fn classify_timing(days_since_purchase: Option<f64>, cadence_days: f64) -> TimingClass {
    let Some(days_since_purchase) = days_since_purchase else {
        return TimingClass::Unknown;
    };
    if cadence_days <= 0.0 {
        return TimingClass::Unknown;
    }

    let ratio = days_since_purchase / cadence_days;
    if ratio < 0.5 {
        TimingClass::RecentlyPurchased
    } else if ratio < 0.9 {
        TimingClass::Adequate
    } else if ratio < 1.2 {
        TimingClass::DueSoon
    } else {
        TimingClass::Overdue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_last_purchase_is_unknown() {
        assert_eq!(classify_timing(None, 14.0), TimingClass::Unknown);
    }

    #[test]
    fn boundaries_match_spec_thresholds() {
        assert_eq!(classify_timing(Some(6.0), 14.0), TimingClass::RecentlyPurchased);
        assert_eq!(classify_timing(Some(10.0), 14.0), TimingClass::Adequate);
        assert_eq!(classify_timing(Some(13.0), 14.0), TimingClass::DueSoon);
        assert_eq!(classify_timing(Some(20.0), 14.0), TimingClass::Overdue);
    }
}
