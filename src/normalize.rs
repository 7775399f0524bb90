// Schema normalization: positional mapping of a raw block onto the
// canonical field order, driven by a versioned template descriptor.
//
// Source header text drifts between monthly exports but column order is
// stable, so canonical fields are assigned by index after the template's
// administrative columns are dropped. Labels are cleaned only so the batch
// aggregator can compare them across files.
use crate::config::TemplateVersion;
use crate::error::PipelineError;
use crate::types::{NormalizedBatch, NormalizedRow, RawTable};
use crate::util::clean_label;

/// Canonical source fields expected after administrative drops, in order.
const CANONICAL_SOURCE_FIELDS: usize = 7;

fn drop_positions<T>(values: &mut Vec<T>, positions: &[usize]) {
    // Remove highest index first so earlier positions stay valid.
    let mut sorted: Vec<usize> = positions.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    for pos in sorted {
        if pos < values.len() {
            values.remove(pos);
        }
    }
}

/// Map one file's raw block onto the canonical schema and stamp every row
/// with the file's YYYYMM reporting month.
pub fn normalize(
    raw: RawTable,
    stamp: &str,
    template: &TemplateVersion,
) -> Result<NormalizedBatch, PipelineError> {
    if raw.labels.len() != template.expected_width {
        return Err(PipelineError::SchemaMismatch {
            file: raw.file,
            expected: template.expected_width,
            found: raw.labels.len(),
        });
    }

    let mut labels = raw.labels;
    drop_positions(&mut labels, template.drop_positions);
    if labels.len() != CANONICAL_SOURCE_FIELDS {
        return Err(PipelineError::SchemaMismatch {
            file: raw.file,
            expected: CANONICAL_SOURCE_FIELDS + template.drop_positions.len(),
            found: labels.len() + template.drop_positions.len(),
        });
    }
    let mut labels: Vec<String> = labels.iter().map(|l| clean_label(l)).collect();
    labels.push("date".to_string());

    let rows = raw
        .rows
        .into_iter()
        .map(|mut cells| {
            cells.resize(template.expected_width, None);
            drop_positions(&mut cells, template.drop_positions);
            let mut cells = cells.into_iter();
            NormalizedRow {
                region: cells.next().flatten(),
                region_code: cells.next().flatten(),
                area_code: cells.next().flatten(),
                area_name: cells.next().flatten(),
                capacity: cells.next().flatten(),
                gp_registered_population: cells.next().flatten(),
                occupancy: cells.next().flatten(),
                date_stamp: stamp.to_string(),
            }
        })
        .collect();

    Ok(NormalizedBatch {
        file: raw.file,
        labels,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TEMPLATE_2022_PILOT, TEMPLATE_2023};
    use crate::types::RawTable;

    fn raw(labels: Vec<&str>, rows: Vec<Vec<Option<&str>>>) -> RawTable {
        RawTable {
            file: "VW202403.xlsx".to_string(),
            labels: labels.into_iter().map(String::from).collect(),
            rows: rows
                .into_iter()
                .map(|r| r.into_iter().map(|c| c.map(String::from)).collect())
                .collect(),
        }
    }

    fn sitrep_labels() -> Vec<&'static str> {
        vec![
            "Index",
            "Region",
            "Region Code",
            "ICB Code",
            "Name",
            "Capacity",
            "Notes",
            "GP Registered Population",
            "Occupancy",
            "Checksum",
        ]
    }

    #[test]
    fn administrative_columns_dropped_by_position() {
        let table = raw(
            sitrep_labels(),
            vec![vec![
                Some("1"),
                Some("South West"),
                Some("E40000006"),
                Some("QJK"),
                Some("NHS Devon ICB"),
                Some("100"),
                Some("note"),
                Some("950000"),
                Some("50"),
                Some("x"),
            ]],
        );
        let batch = normalize(table, "202403", &TEMPLATE_2023).unwrap();
        assert_eq!(batch.rows.len(), 1);
        let row = &batch.rows[0];
        assert_eq!(row.region.as_deref(), Some("South West"));
        assert_eq!(row.region_code.as_deref(), Some("E40000006"));
        assert_eq!(row.area_code.as_deref(), Some("QJK"));
        assert_eq!(row.area_name.as_deref(), Some("NHS Devon ICB"));
        assert_eq!(row.capacity.as_deref(), Some("100"));
        assert_eq!(row.gp_registered_population.as_deref(), Some("950000"));
        assert_eq!(row.occupancy.as_deref(), Some("50"));
        assert_eq!(row.date_stamp, "202403");
    }

    #[test]
    fn cleaned_labels_keep_positional_order_plus_date() {
        let table = raw(sitrep_labels(), vec![]);
        let batch = normalize(table, "202403", &TEMPLATE_2023).unwrap();
        assert_eq!(
            batch.labels,
            vec![
                "region",
                "region_code",
                "icb_code",
                "name",
                "capacity",
                "gp_registered_population",
                "occupancy",
                "date",
            ]
        );
    }

    #[test]
    fn width_mismatch_is_an_error() {
        let table = raw(vec!["Region", "Name"], vec![]);
        let err = normalize(table, "202403", &TEMPLATE_2023).unwrap_err();
        match err {
            PipelineError::SchemaMismatch { expected, found, .. } => {
                assert_eq!(expected, 10);
                assert_eq!(found, 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn pilot_template_maps_without_drops() {
        let table = raw(
            vec![
                "Region",
                "Region Code",
                "ICB Code",
                "Name",
                "Capacity",
                "GP Registered Population",
                "Occupancy",
            ],
            vec![vec![
                Some("London"),
                Some("E40000003"),
                Some("QMJ"),
                Some("NHS North Central London ICB"),
                Some("80"),
                None,
                Some("40"),
            ]],
        );
        let batch = normalize(table, "202210", &TEMPLATE_2022_PILOT).unwrap();
        assert_eq!(batch.rows[0].area_code.as_deref(), Some("QMJ"));
        assert_eq!(batch.rows[0].gp_registered_population, None);
    }

    #[test]
    fn short_rows_pad_with_nulls() {
        let table = raw(
            sitrep_labels(),
            vec![vec![Some("1"), Some("South West"), Some("E40000006")]],
        );
        let batch = normalize(table, "202403", &TEMPLATE_2023).unwrap();
        let row = &batch.rows[0];
        assert_eq!(row.region.as_deref(), Some("South West"));
        assert_eq!(row.area_name, None);
        assert_eq!(row.occupancy, None);
    }
}
