// End-to-end pipeline test over a synthetic two-month batch: raw cell
// grids through extraction, normalization, unification, identity
// resolution, metric derivation, and the top-movers report.
use calamine::{Data, Range};
use chrono::NaiveDate;

use vw_report::config::PipelineConfig;
use vw_report::{aggregate, loader, metrics, normalize, reports, resolve};

fn s(v: &str) -> Data {
    Data::String(v.to_string())
}

fn n(v: f64) -> Data {
    Data::Float(v)
}

fn grid(cells: Vec<Vec<Data>>) -> Range<Data> {
    let rows = cells.len() as u32;
    let cols = cells.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
    let mut range = Range::new((0, 0), (rows - 1, cols - 1));
    for (r, row) in cells.into_iter().enumerate() {
        for (c, cell) in row.into_iter().enumerate() {
            range.set_value((r as u32, c as u32), cell);
        }
    }
    range
}

fn header() -> Vec<Data> {
    vec![
        s("Index"),
        s("Region"),
        s("Region Code"),
        s("ICB Code"),
        s("Name"),
        s("Virtual Ward Capacity"),
        s("Notes"),
        s("GP Registered Population"),
        s("Virtual Ward Occupancy"),
        s("Checksum"),
    ]
}

fn data_row(name: &str, capacity: f64, population: f64, occupancy: f64) -> Vec<Data> {
    vec![
        n(1.0),
        s("Midlands"),
        s("E54000000"),
        s("XX"),
        s(name),
        n(capacity),
        s("note"),
        n(population),
        n(occupancy),
        s("x"),
    ]
}

fn sentinel_row() -> Vec<Data> {
    vec![
        Data::Empty,
        s("ENGLAND"),
        Data::Empty,
        Data::Empty,
        s("ENGLAND"),
        n(5000.0),
        Data::Empty,
        n(60_000_000.0),
        n(2500.0),
        Data::Empty,
    ]
}

fn month_sheet(rows: Vec<Vec<Data>>) -> Range<Data> {
    let mut cells = vec![
        vec![s("NHS Virtual Ward Situation Report")],
        vec![Data::Empty, s("Monthly submission")],
        header(),
    ];
    cells.extend(rows);
    cells.push(sentinel_row());
    grid(cells)
}

fn write_lookup() -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("vw_lookup_{}.csv", std::process::id()));
    std::fs::write(
        &path,
        "ICB_Name,ICB23CD,ICB23NM,NHSER23NM\n\
         Foo,QF1,NHS Foo Integrated Care Board,Midlands\n\
         Bar,QB1,NHS Bar Integrated Care Board,Midlands\n",
    )
    .unwrap();
    path
}

#[test]
fn two_month_batch_end_to_end() {
    let cfg = PipelineConfig::default();

    let march = month_sheet(vec![
        data_row("Foo", 100.0, 950_000.0, 50.0),
        data_row("Bar", 200.0, 800_000.0, 100.0),
    ]);
    // April reports the same areas with different casing and padding.
    let april = month_sheet(vec![
        data_row("  FOO  ", 120.0, 950_000.0, 72.0),
        data_row("bar", 205.0, 800_000.0, 90.0),
    ]);

    let raw_march = loader::extract_table(&march, "VW202403.xlsx", &cfg).unwrap();
    let raw_april = loader::extract_table(&april, "VW202404.xlsx", &cfg).unwrap();

    let batches = vec![
        normalize::normalize(raw_march, "202403", &cfg.template).unwrap(),
        normalize::normalize(raw_april, "202404", &cfg.template).unwrap(),
    ];
    let unified = aggregate::unify(batches).unwrap();
    // Sentinel rows never reach the unified table.
    assert_eq!(unified.rows.len(), 4);
    assert!(unified
        .rows
        .iter()
        .all(|r| r.region.as_deref() != Some("ENGLAND")));

    let lookup_path = write_lookup();
    let lookup = resolve::load_lookup(&lookup_path).unwrap();
    std::fs::remove_file(&lookup_path).ok();

    let resolution = resolve::resolve_and_aggregate(&unified, &lookup);
    assert_eq!(resolution.unresolved_rows, 0);
    assert_eq!(resolution.records.len(), 4);

    let mut records = resolution.records;
    metrics::derive(&mut records, cfg.template.per_100k_multiplier);

    let march_foo = records
        .iter()
        .find(|r| {
            r.area_code.as_deref() == Some("QF1")
                && r.date == NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        })
        .unwrap();
    assert_eq!(march_foo.occupancy_percent, Some(50.0));
    assert_eq!(march_foo.short_name, "NHS Foo ICB");
    assert_eq!(march_foo.national_region.as_deref(), Some("Midlands"));

    let april_foo = records
        .iter()
        .find(|r| {
            r.area_code.as_deref() == Some("QF1")
                && r.date == NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()
        })
        .unwrap();
    assert_eq!(april_foo.occupancy_percent, Some(60.0));
    assert_eq!(april_foo.capacity, 120);
    // 120 / 950,000 * 100,000 = 12.63
    assert_eq!(april_foo.capacity_100k, Some(12.63));

    let movers = reports::top_movers(&records, 2024, 4);
    assert_eq!(movers.len(), 2);
    assert_eq!(movers[0].area, "NHS Foo ICB");
    assert_eq!(movers[0].increase, 20);
    assert_eq!(movers[1].area, "NHS Bar ICB");
    assert_eq!(movers[1].increase, 5);
}

#[test]
fn schema_mismatch_aborts_only_the_offending_file() {
    let cfg = PipelineConfig::default();
    let narrow = grid(vec![
        vec![s("Region"), s("Name")],
        vec![s("Midlands"), s("Foo")],
    ]);
    let raw = loader::extract_table(&narrow, "VW202405.xlsx", &cfg).unwrap();
    let err = normalize::normalize(raw, "202405", &cfg.template).unwrap_err();
    assert!(err.to_string().contains("VW202405.xlsx"));

    // A well-formed file still normalizes independently.
    let good = month_sheet(vec![data_row("Foo", 10.0, 1000.0, 5.0)]);
    let raw = loader::extract_table(&good, "VW202406.xlsx", &cfg).unwrap();
    let batch = normalize::normalize(raw, "202406", &cfg.template).unwrap();
    assert_eq!(batch.rows.len(), 1);
}
