use thiserror::Error;

/// A table whose columns do not line up.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
}

/// The uploaded bytes could not be turned into a [`Table`](super::model::Table).
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid parquet data: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("invalid arrow data: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("invalid CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid JSON data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("{0}")]
    Malformed(String),
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Selection or filter spec that does not fit the table it is applied to.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("column '{0}' is not numeric")]
    NotNumeric(String),
    #[error("column '{0}' is not categorical")]
    NotCategorical(String),
    #[error("no range given for selected column '{0}'")]
    MissingRange(String),
    #[error("range given for unselected column '{0}'")]
    UnselectedRange(String),
    #[error("column '{0}' selected more than once")]
    DuplicateSelection(String),
}

/// A `[low, high]` pair that is not a valid closed interval.
#[derive(Debug, Error, PartialEq)]
#[error("invalid range [{low}, {high}]")]
pub struct RangeError {
    pub low: f64,
    pub high: f64,
}
