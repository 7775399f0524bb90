// Raw file loading: workbook -> rectangular block below the detected
// header row, with national-total summary rows removed.
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::normalize;
use crate::types::{NormalizedBatch, RawTable};

/// Per-file result of a batch load. Structural failures in one monthly
/// export never abort the rest of the batch.
#[derive(Debug)]
pub struct FileOutcome {
    pub file: String,
    pub result: Result<usize, PipelineError>,
}

/// Render one cell as text, the representation all downstream parsing works
/// from. Empty and error cells become `None`; integral floats print without
/// a fractional part so counts survive Excel's numeric storage.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => Some(s.clone()),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 9e15 {
                Some(format!("{}", *f as i64))
            } else {
                Some(f.to_string())
            }
        }
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => Some(dt.as_f64().to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Extract the YYYYMM reporting stamp from a source file name of the form
/// `<prefix><YYYYMM><ext>`.
pub fn month_stamp_from_name(file_name: &str, cfg: &PipelineConfig) -> Result<String, PipelineError> {
    let stamp = file_name
        .strip_prefix(&cfg.file_prefix)
        .and_then(|rest| rest.strip_suffix(&cfg.file_ext))
        .ok_or_else(|| PipelineError::BadFileStamp {
            file: file_name.to_string(),
        })?;
    if crate::util::parse_month_stamp(stamp).is_none() {
        return Err(PipelineError::BadFileStamp {
            file: file_name.to_string(),
        });
    }
    Ok(stamp.to_string())
}

/// Locate the header row by keyword containment and return everything below
/// it, with the header cells promoted to column labels and summary rows
/// carrying a sentinel token removed.
pub fn extract_table(
    range: &Range<Data>,
    file: &str,
    cfg: &PipelineConfig,
) -> Result<RawTable, PipelineError> {
    let header_idx = range
        .rows()
        .position(|row| {
            row.iter()
                .filter_map(cell_to_string)
                .any(|s| s.contains(&cfg.header_keyword))
        })
        .ok_or_else(|| PipelineError::MissingHeader {
            file: file.to_string(),
            keyword: cfg.header_keyword.clone(),
        })?;

    let mut rows_iter = range.rows().skip(header_idx);
    let labels: Vec<String> = rows_iter
        .next()
        .map(|row| {
            row.iter()
                .map(|c| cell_to_string(c).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default();

    let sentinels = cfg.template.summary_sentinels;
    let rows: Vec<Vec<Option<String>>> = rows_iter
        .filter(|row| {
            !row.iter().filter_map(cell_to_string).any(|s| {
                let s = s.trim().to_string();
                sentinels.iter().any(|t| s == *t)
            })
        })
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(RawTable {
        file: file.to_string(),
        labels,
        rows,
    })
}

/// Load one monthly workbook and extract its data block. Pure read.
pub fn load_file(path: &Path, cfg: &PipelineConfig) -> Result<RawTable, PipelineError> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let mut workbook = open_workbook_auto(path).map_err(|source| PipelineError::Workbook {
        file: file.clone(),
        source,
    })?;

    if !workbook.sheet_names().iter().any(|s| s == &cfg.sheet_name) {
        return Err(PipelineError::SheetNotFound {
            file,
            sheet: cfg.sheet_name.clone(),
        });
    }

    let range = workbook
        .worksheet_range(&cfg.sheet_name)
        .map_err(|source| PipelineError::Workbook {
            file: file.clone(),
            source,
        })?;

    extract_table(&range, &file, cfg)
}

/// Monthly source files in the data directory, sorted by name so batches
/// are processed in reporting order.
pub fn list_source_files(cfg: &PipelineConfig) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(&cfg.data_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&cfg.file_prefix) && n.ends_with(&cfg.file_ext))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Load and normalize every monthly file in the data directory, collecting
/// a per-file outcome list alongside the successfully normalized batches.
pub fn load_batch(
    cfg: &PipelineConfig,
) -> Result<(Vec<NormalizedBatch>, Vec<FileOutcome>), PipelineError> {
    let mut batches = Vec::new();
    let mut outcomes = Vec::new();

    for path in list_source_files(cfg)? {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let result = month_stamp_from_name(&file, cfg)
            .and_then(|stamp| {
                let raw = load_file(&path, cfg)?;
                normalize::normalize(raw, &stamp, &cfg.template)
            })
            .map(|batch| {
                let n = batch.rows.len();
                batches.push(batch);
                n
            });

        outcomes.push(FileOutcome { file, result });
    }

    Ok((batches, outcomes))
}
