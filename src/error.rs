use std::path::PathBuf;

use thiserror::Error;

/// Conditions callers can match on. Everything else travels as `anyhow::Error`.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("Cannot find depth column (z/depth) in {file}. Columns={columns:?}")]
    MissingDepthColumn { file: String, columns: Vec<String> },

    #[error("{file} has no column '{column}' (present in the first profile file)")]
    MissingProfileVariable { file: String, column: String },

    #[error("{} has no header row", file.display())]
    EmptyTable { file: PathBuf },

    #[error("{}:{line}: expected at most {expected} fields, found {found}", file.display())]
    RaggedRow {
        file: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },
}
