use std::path::PathBuf;
use thiserror::Error;

/// Failures that abort processing of a single source file (or the lookup),
/// never the whole batch. The batch loader collects one `Result` per file so
/// a malformed monthly export is reported alongside the files that loaded.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{file}: could not open workbook: {source}")]
    Workbook {
        file: String,
        #[source]
        source: calamine::Error,
    },

    #[error("{file}: sheet '{sheet}' not found")]
    SheetNotFound { file: String, sheet: String },

    #[error("{file}: no row contains the header keyword '{keyword}'")]
    MissingHeader { file: String, keyword: String },

    #[error("{file}: expected {expected} source columns, found {found}")]
    SchemaMismatch {
        file: String,
        expected: usize,
        found: usize,
    },

    #[error("{file}: file name does not encode a YYYYMM reporting month")]
    BadFileStamp { file: String },

    #[error("could not read identity lookup {}: {source}", .path.display())]
    Lookup {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
