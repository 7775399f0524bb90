use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

use crate::util::format_opt_metric;

/// Rectangular block extracted from one monthly workbook: header labels,
/// then untyped cell rows, sentinel summary rows already removed.
#[derive(Debug, Clone)]
pub struct RawTable {
    pub file: String,
    pub labels: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

/// One source row mapped onto the canonical field order, still untyped.
/// Typing is finalized only after the whole batch is concatenated.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub area_code: Option<String>,
    pub area_name: Option<String>,
    pub capacity: Option<String>,
    pub gp_registered_population: Option<String>,
    pub occupancy: Option<String>,
    /// YYYYMM stamp derived from the source file name.
    pub date_stamp: String,
}

/// Normalizer output for one file. The cleaned labels are kept so the
/// batch aggregator can flag header drift between months.
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub file: String,
    pub labels: Vec<String>,
    pub rows: Vec<NormalizedRow>,
}

/// The canonical 8-field schema, in positional order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanonicalColumn {
    Region,
    RegionCode,
    AreaCode,
    AreaName,
    Capacity,
    GpRegisteredPopulation,
    Occupancy,
    Date,
}

impl CanonicalColumn {
    pub const ALL: [CanonicalColumn; 8] = [
        CanonicalColumn::Region,
        CanonicalColumn::RegionCode,
        CanonicalColumn::AreaCode,
        CanonicalColumn::AreaName,
        CanonicalColumn::Capacity,
        CanonicalColumn::GpRegisteredPopulation,
        CanonicalColumn::Occupancy,
        CanonicalColumn::Date,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalColumn::Region => "Region",
            CanonicalColumn::RegionCode => "Region_Code",
            CanonicalColumn::AreaCode => "ICB_Code",
            CanonicalColumn::AreaName => "Name",
            CanonicalColumn::Capacity => "Capacity",
            CanonicalColumn::GpRegisteredPopulation => "GP_Registered_Population",
            CanonicalColumn::Occupancy => "Occupancy",
            CanonicalColumn::Date => "Date",
        }
    }
}

/// Fully typed row of the unified table.
#[derive(Debug, Clone)]
pub struct CanonicalRow {
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub area_code: Option<String>,
    pub area_name: Option<String>,
    pub capacity: Option<i64>,
    pub gp_registered_population: Option<i64>,
    pub occupancy: Option<i64>,
    pub date: NaiveDate,
}

/// All monthly extracts concatenated, typed, with the surviving schema.
#[derive(Debug, Clone)]
pub struct UnifiedTable {
    pub rows: Vec<CanonicalRow>,
    /// Canonical columns with at least one non-null value across the whole
    /// batch; entirely empty columns are dropped from the schema here.
    pub columns: Vec<CanonicalColumn>,
    /// Files whose cleaned header labels differ from the first file's, a
    /// data-quality note surfaced to the caller.
    pub drifted_files: Vec<String>,
}

/// Identity of one sub-ICS location from the static lookup.
#[derive(Debug, Clone)]
pub struct LookupEntry {
    pub area_code: String,
    pub display_name: String,
    pub national_region: String,
}

/// Final unit of the pipeline, one per (Date, ICB code). Unresolved source
/// rows keep a null code and group under their own lowercased name.
#[derive(Debug, Clone)]
pub struct AggregatedRecord {
    pub date: NaiveDate,
    pub area_code: Option<String>,
    pub area_name: String,
    pub short_name: String,
    pub national_region: Option<String>,
    pub capacity: i64,
    pub gp_registered_population: i64,
    pub occupancy: i64,
    pub capacity_100k: Option<f64>,
    pub occupancy_percent: Option<f64>,
    pub resolved: bool,
}

/// Export/preview shape of an aggregated record; nulls render as empty
/// strings so "unmeasurable" never reads as zero.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DatasetRow {
    #[serde(rename = "Date")]
    #[tabled(rename = "Date")]
    pub date: String,
    #[serde(rename = "ICB_Code")]
    #[tabled(rename = "ICB_Code")]
    pub area_code: String,
    #[serde(rename = "ICB_Name")]
    #[tabled(rename = "ICB_Name")]
    pub area_name: String,
    #[serde(rename = "National_Region")]
    #[tabled(rename = "National_Region")]
    pub national_region: String,
    #[serde(rename = "Capacity")]
    #[tabled(rename = "Capacity")]
    pub capacity: String,
    #[serde(rename = "GP_Registered_Population")]
    #[tabled(rename = "GP_Registered_Population")]
    pub gp_registered_population: String,
    #[serde(rename = "Occupancy")]
    #[tabled(rename = "Occupancy")]
    pub occupancy: String,
    #[serde(rename = "Capacity_100k")]
    #[tabled(rename = "Capacity_100k")]
    pub capacity_100k: String,
    #[serde(rename = "Occupancy_Percent")]
    #[tabled(rename = "Occupancy_Percent")]
    pub occupancy_percent: String,
}

impl From<&AggregatedRecord> for DatasetRow {
    fn from(r: &AggregatedRecord) -> Self {
        DatasetRow {
            date: r.date.format("%Y-%m-%d").to_string(),
            area_code: r.area_code.clone().unwrap_or_default(),
            area_name: r.area_name.clone(),
            national_region: r.national_region.clone().unwrap_or_default(),
            capacity: r.capacity.to_string(),
            gp_registered_population: r.gp_registered_population.to_string(),
            occupancy: r.occupancy.to_string(),
            capacity_100k: format_opt_metric(r.capacity_100k),
            occupancy_percent: format_opt_metric(r.occupancy_percent),
        }
    }
}

/// One row of the top-movers report: capacity delta versus the prior month.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CapacityMoverRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "ICB")]
    #[tabled(rename = "ICB")]
    pub area: String,
    #[serde(rename = "PreviousCapacity")]
    #[tabled(rename = "PreviousCapacity")]
    pub previous_capacity: i64,
    #[serde(rename = "CurrentCapacity")]
    #[tabled(rename = "CurrentCapacity")]
    pub current_capacity: i64,
    #[serde(rename = "Increase")]
    #[tabled(rename = "Increase")]
    pub increase: i64,
}

#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub months_covered: usize,
    pub total_areas: usize,
    pub total_records: usize,
    pub unresolved_rows: usize,
    pub latest_month: Option<NaiveDate>,
    pub latest_capacity: Option<i64>,
    pub latest_occupancy: Option<i64>,
}
