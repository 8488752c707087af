use std::io;
use thiserror::Error;

/// Errors raised while decoding, encoding or editing a resource pack.
///
/// Every truncation variant carries the byte count the format required and
/// the count the stream actually delivered.
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Truncated header: expected {expected} bytes, read {actual}")]
    TruncatedHeader { expected: usize, actual: usize },
    #[error("Truncated payload: expected {expected} bytes, read {actual}")]
    TruncatedPayload { expected: usize, actual: usize },
    #[error("Truncated padding: expected {expected} bytes, read {actual}")]
    TruncatedPadding { expected: usize, actual: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ResourceError>;
