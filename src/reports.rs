// Reporting over the aggregated dataset: month-on-month capacity movers
// and the JSON summary.
use std::collections::{HashMap, HashSet};

use chrono::Datelike;

use crate::types::{AggregatedRecord, CapacityMoverRow, SummaryStats};
use crate::util::month_before;

/// Total capacity per area for one calendar month.
fn capacity_by_area(
    records: &[AggregatedRecord],
    year: i32,
    month: u32,
) -> HashMap<String, i64> {
    let mut totals = HashMap::new();
    for r in records {
        if r.date.year() == year && r.date.month() == month {
            *totals.entry(r.short_name.clone()).or_insert(0) += r.capacity;
        }
    }
    totals
}

/// The five areas with the greatest capacity increase versus the prior
/// calendar month (January compares against December of the prior year).
///
/// Areas present in only one of the two months are excluded: without both
/// operands the difference is undefined, and treating the missing month as
/// zero would fabricate a movement. Ties break on ascending area name.
pub fn top_movers(
    records: &[AggregatedRecord],
    year: i32,
    month: u32,
) -> Vec<CapacityMoverRow> {
    let (prev_year, prev_month) = month_before(year, month);
    let current = capacity_by_area(records, year, month);
    let previous = capacity_by_area(records, prev_year, prev_month);

    let mut deltas: Vec<(String, i64, i64)> = current
        .into_iter()
        .filter_map(|(area, cur)| previous.get(&area).map(|prev| (area, *prev, cur)))
        .collect();
    deltas.sort_by(|a, b| {
        let inc_a = a.2 - a.1;
        let inc_b = b.2 - b.1;
        inc_b.cmp(&inc_a).then_with(|| a.0.cmp(&b.0))
    });

    deltas
        .into_iter()
        .take(5)
        .enumerate()
        .map(|(idx, (area, prev, cur))| CapacityMoverRow {
            rank: idx + 1,
            area,
            previous_capacity: prev,
            current_capacity: cur,
            increase: cur - prev,
        })
        .collect()
}

pub fn generate_summary(records: &[AggregatedRecord], unresolved_rows: usize) -> SummaryStats {
    let months: HashSet<_> = records.iter().map(|r| r.date).collect();
    let areas: HashSet<&str> = records.iter().map(|r| r.short_name.as_str()).collect();
    let latest_month = months.iter().max().copied();
    let (latest_capacity, latest_occupancy) = match latest_month {
        Some(latest) => {
            let cap = records
                .iter()
                .filter(|r| r.date == latest)
                .map(|r| r.capacity)
                .sum();
            let occ = records
                .iter()
                .filter(|r| r.date == latest)
                .map(|r| r.occupancy)
                .sum();
            (Some(cap), Some(occ))
        }
        None => (None, None),
    };
    SummaryStats {
        months_covered: months.len(),
        total_areas: areas.len(),
        total_records: records.len(),
        unresolved_rows,
        latest_month,
        latest_capacity,
        latest_occupancy,
    }
}
