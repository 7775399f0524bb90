// Derived utilization metrics with explicit zero-denominator handling.
//
// A zero denominator yields null, never zero: a zero rate would read as
// "no utilization" when the truth is "unmeasurable".
use crate::types::AggregatedRecord;
use crate::util::round2;

/// Safe ratio: `numerator / denominator * scale`, rounded to 2 decimals,
/// null when the denominator is zero.
fn safe_rate(numerator: i64, denominator: i64, scale: f64) -> Option<f64> {
    if denominator == 0 {
        None
    } else {
        Some(round2(numerator as f64 / denominator as f64 * scale))
    }
}

/// Fill in occupancy percentage and capacity per 100k registered patients
/// for every aggregated record. The population multiplier comes from the
/// template descriptor (100,000 for the current template generation).
pub fn derive(records: &mut [AggregatedRecord], per_100k_multiplier: f64) {
    for r in records.iter_mut() {
        r.occupancy_percent = safe_rate(r.occupancy, r.capacity, 100.0);
        r.capacity_100k = safe_rate(r.capacity, r.gp_registered_population, per_100k_multiplier);
    }
}
