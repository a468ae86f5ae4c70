use thiserror::Error;

/// Errors raised while constructing model values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown protocol '{0}'")]
    UnknownProtocol(String),

    #[error("application type {0} outside the 1..=5 cluster range")]
    InvalidAppType(u8),
}
