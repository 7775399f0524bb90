// Identity resolution: join the unified table against the sub-ICS lookup
// on a lowercased name key, then aggregate to (Date, ICB code).
//
// The monthly files report at sub-ICS grain while the output grain is the
// ICB, so summation after the join collapses the many-to-one mapping.
use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::PipelineError;
use crate::types::{AggregatedRecord, LookupEntry, UnifiedTable};
use crate::util::{normalize_name, shorten_icb_name};

#[derive(Debug, Deserialize)]
struct LookupRow {
    #[serde(rename = "ICB_Name")]
    name: String,
    #[serde(rename = "ICB23CD")]
    code: String,
    #[serde(rename = "ICB23NM")]
    display_name: String,
    #[serde(rename = "NHSER23NM")]
    national_region: String,
}

/// Read the static identity lookup, keyed by lowercased location name.
pub fn load_lookup(path: &Path) -> Result<HashMap<String, LookupEntry>, PipelineError> {
    let mut rdr = csv::Reader::from_path(path).map_err(|source| PipelineError::Lookup {
        path: path.to_path_buf(),
        source,
    })?;
    let mut lookup = HashMap::new();
    for result in rdr.deserialize::<LookupRow>() {
        let row = result.map_err(|source| PipelineError::Lookup {
            path: path.to_path_buf(),
            source,
        })?;
        lookup
            .entry(normalize_name(&row.name))
            .or_insert(LookupEntry {
                area_code: row.code,
                display_name: row.display_name,
                national_region: row.national_region,
            });
    }
    Ok(lookup)
}

/// Aggregation output plus the count of rows the lookup could not resolve.
/// Unresolved rows are retained (null identity) so totals are never
/// silently undercounted; the count is the caller-visible warning.
#[derive(Debug)]
pub struct Resolution {
    pub records: Vec<AggregatedRecord>,
    pub unresolved_rows: usize,
}

/// Group key. Unresolved rows group under their own lowercased source name
/// so distinct unmatched areas never merge with each other.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
enum AreaKey {
    Resolved(String),
    Unresolved(String),
}

#[derive(Default)]
struct Acc {
    capacity: i64,
    gp_registered_population: i64,
    occupancy: i64,
    area_code: Option<String>,
    display_name: Option<String>,
    national_region: Option<String>,
}

/// Left-join every unified row against the lookup and sum to one record
/// per (Date, ICB code). Display fields take the first non-null value in
/// the group; divergence within a group is a source data-quality issue and
/// gets no special handling.
pub fn resolve_and_aggregate(
    table: &UnifiedTable,
    lookup: &HashMap<String, LookupEntry>,
) -> Resolution {
    let mut groups: HashMap<(chrono::NaiveDate, AreaKey), Acc> = HashMap::new();
    let mut unresolved_rows = 0usize;

    for row in &table.rows {
        let join_key = row.area_name.as_deref().map(normalize_name);
        let hit = join_key.as_deref().and_then(|k| lookup.get(k));

        let area_key = match (&hit, &join_key) {
            (Some(entry), _) => AreaKey::Resolved(entry.area_code.clone()),
            (None, Some(k)) => {
                unresolved_rows += 1;
                AreaKey::Unresolved(k.clone())
            }
            (None, None) => {
                unresolved_rows += 1;
                AreaKey::Unresolved(String::new())
            }
        };

        let acc = groups.entry((row.date, area_key)).or_default();
        acc.capacity += row.capacity.unwrap_or(0);
        acc.gp_registered_population += row.gp_registered_population.unwrap_or(0);
        acc.occupancy += row.occupancy.unwrap_or(0);
        if let Some(entry) = hit {
            acc.area_code.get_or_insert_with(|| entry.area_code.clone());
            acc.display_name
                .get_or_insert_with(|| entry.display_name.clone());
            acc.national_region
                .get_or_insert_with(|| entry.national_region.clone());
        } else if let Some(name) = &row.area_name {
            acc.display_name.get_or_insert_with(|| name.clone());
        }
    }

    let mut keyed: Vec<((chrono::NaiveDate, AreaKey), Acc)> = groups.into_iter().collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));

    let records = keyed
        .into_iter()
        .map(|((date, _), acc)| {
            let resolved = acc.area_code.is_some();
            let area_name = acc
                .display_name
                .unwrap_or_else(|| "(unnamed)".to_string());
            AggregatedRecord {
                date,
                short_name: shorten_icb_name(&area_name),
                area_name,
                area_code: acc.area_code,
                national_region: acc.national_region,
                capacity: acc.capacity,
                gp_registered_population: acc.gp_registered_population,
                occupancy: acc.occupancy,
                capacity_100k: None,
                occupancy_percent: None,
                resolved,
            }
        })
        .collect();

    Resolution {
        records,
        unresolved_rows,
    }
}
