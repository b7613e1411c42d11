//! FILENAME: engine/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Required column headers are absent from the input sheet. The load
    /// is aborted and any previously loaded dataset stays active.
    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// A non-blank date cell matched no accepted representation. Aborts
    /// the whole load; the row index is 0-based over the data rows.
    #[error("row {row}: unparseable date {value:?}")]
    InvalidDate { row: usize, value: String },
}
