use iotmap_core::CoreError;
use thiserror::Error;

/// Errors raised while reading feed or node-list files.
///
/// Row-level problems in the transmission feed are not surfaced here;
/// those rows are dropped and logged, and the load continues.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row has {0} fields, expected 8")]
    FieldCount(usize),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("invalid app type '{0}'")]
    InvalidAppType(String),

    #[error("invalid node id '{0}'")]
    InvalidNodeId(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
