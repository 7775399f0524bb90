// Pipeline configuration.
//
// Every constant the original scripts kept at module scope lives here as an
// explicit struct passed into the pipeline, so nothing reads paths or
// keywords from hidden globals.
use std::path::PathBuf;

/// Positional descriptor for one generation of the monthly sitrep template.
///
/// The monthly exports rename their column headers freely but keep column
/// order stable, so canonical fields are mapped by index. Which
/// administrative columns exist (and the capacity-per-100k multiplier)
/// differs between template generations, so both are carried here rather
/// than hardcoded in the normalizer.
#[derive(Debug, Clone)]
pub struct TemplateVersion {
    pub name: &'static str,
    /// Source columns expected below the header row, before any drops.
    pub expected_width: usize,
    /// Indices of administrative columns removed before canonical mapping,
    /// given in the source column order.
    pub drop_positions: &'static [usize],
    /// Multiplier for the capacity-per-population rate. The 2022 pilot
    /// reported per 100 registered patients; the current template reports
    /// per 100,000.
    pub per_100k_multiplier: f64,
    /// Cell values marking national-total summary rows, which must not
    /// double-count into per-area aggregation.
    pub summary_sentinels: &'static [&'static str],
}

/// Current sitrep template (April 2023 onwards): ten source columns of
/// which three are administrative, national totals flagged with
/// "ENGLAND"/"ENGLAND*", rates per 100,000 GP registered patients.
pub const TEMPLATE_2023: TemplateVersion = TemplateVersion {
    name: "sitrep-2023",
    expected_width: 10,
    drop_positions: &[0, 6, 9],
    per_100k_multiplier: 100_000.0,
    summary_sentinels: &["ENGLAND", "ENGLAND*"],
};

/// Legacy pilot template (2022): seven source columns, no administrative
/// columns to drop, rates per 100 registered patients.
pub const TEMPLATE_2022_PILOT: TemplateVersion = TemplateVersion {
    name: "sitrep-2022-pilot",
    expected_width: 7,
    drop_positions: &[],
    per_100k_multiplier: 100.0,
    summary_sentinels: &["ENGLAND"],
};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory scanned for monthly source files.
    pub data_dir: PathBuf,
    /// Source files are named `<prefix><YYYYMM><ext>`.
    pub file_prefix: String,
    pub file_ext: String,
    /// Worksheet holding the data block in each monthly workbook.
    pub sheet_name: String,
    /// The header row is the first row where any cell contains this
    /// keyword (substring, case-sensitive).
    pub header_keyword: String,
    /// CSV mapping sub-ICS location names to ICB identities.
    pub lookup_path: PathBuf,
    pub template: TemplateVersion,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            data_dir: PathBuf::from("./data"),
            file_prefix: "VW".to_string(),
            file_ext: ".xlsx".to_string(),
            sheet_name: "Virtual Ward Data".to_string(),
            header_keyword: "Region".to_string(),
            lookup_path: PathBuf::from("./data/subICSLocations.csv"),
            template: TEMPLATE_2023,
        }
    }
}
