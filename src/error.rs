use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read source {}: {source}", path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed table: {0}")]
    Csv(#[from] csv::Error),
    #[error("column error: {0}")]
    Column(String),
    #[error("continuous series has no finite points to align against")]
    InsufficientData,
    #[error("timestamp out of range: {0}")]
    TimestampRange(String),
    #[error("length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("unknown column: {0}")]
    UnknownColumn(String),
    #[error("too many charts: {count} continuous columns (max {max})")]
    TooManyCharts { count: usize, max: usize },
    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
