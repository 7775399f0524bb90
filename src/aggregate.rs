// Batch aggregation: concatenate every monthly extract, then finalize the
// unified schema and typing.
//
// Column pruning and type coercion must run strictly after concatenation: a
// column empty in one month but populated in another has to survive with
// nulls for the empty month, which a per-file decision would get wrong.
use crate::error::PipelineError;
use crate::types::{CanonicalColumn, CanonicalRow, NormalizedBatch, UnifiedTable};
use crate::util::{parse_i64_safe, parse_month_stamp};

fn trim_opt(v: Option<String>) -> Option<String> {
    let v = v?;
    let t = v.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Concatenate normalized batches into the unified table: trim text fields,
/// coerce numerics to nullable integers, type the reporting month, and drop
/// canonical columns that are entirely null across the whole batch.
pub fn unify(batches: Vec<NormalizedBatch>) -> Result<UnifiedTable, PipelineError> {
    let first_labels = batches.first().map(|b| b.labels.clone());
    let mut drifted_files = Vec::new();
    let mut rows: Vec<CanonicalRow> = Vec::new();

    for batch in batches {
        if let Some(reference) = &first_labels {
            if &batch.labels != reference {
                drifted_files.push(batch.file.clone());
            }
        }
        for row in batch.rows {
            let date = parse_month_stamp(&row.date_stamp).ok_or_else(|| {
                PipelineError::BadFileStamp {
                    file: batch.file.clone(),
                }
            })?;
            rows.push(CanonicalRow {
                region: trim_opt(row.region),
                region_code: trim_opt(row.region_code),
                area_code: trim_opt(row.area_code),
                area_name: trim_opt(row.area_name),
                capacity: parse_i64_safe(row.capacity.as_deref()),
                gp_registered_population: parse_i64_safe(
                    row.gp_registered_population.as_deref(),
                ),
                occupancy: parse_i64_safe(row.occupancy.as_deref()),
                date,
            });
        }
    }

    let columns = retained_columns(&rows);

    Ok(UnifiedTable {
        rows,
        columns,
        drifted_files,
    })
}

/// Canonical columns with at least one non-null value across the batch.
fn retained_columns(rows: &[CanonicalRow]) -> Vec<CanonicalColumn> {
    CanonicalColumn::ALL
        .into_iter()
        .filter(|col| {
            rows.iter().any(|row| match col {
                CanonicalColumn::Region => row.region.is_some(),
                CanonicalColumn::RegionCode => row.region_code.is_some(),
                CanonicalColumn::AreaCode => row.area_code.is_some(),
                CanonicalColumn::AreaName => row.area_name.is_some(),
                CanonicalColumn::Capacity => row.capacity.is_some(),
                CanonicalColumn::GpRegisteredPopulation => {
                    row.gp_registered_population.is_some()
                }
                CanonicalColumn::Occupancy => row.occupancy.is_some(),
                CanonicalColumn::Date => true,
            })
        })
        .collect()
}
