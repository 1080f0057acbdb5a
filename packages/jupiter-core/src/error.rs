use thiserror::Error;

use crate::ids::ContentHash;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("decode error: {0}")]
    Decode(String),
    #[error("document rejected operation: {0}")]
    LogAppend(#[from] LogAppendError),
    #[error("operation could not be composed into the buffer")]
    BufferCompose,
    #[error("transform error: {0}")]
    Transform(String),
    #[error("document is already open")]
    AlreadyOpen,
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}

/// Reasons a document log refuses an operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LogAppendError {
    #[error("operation was generated against {found}, document head is {expected}")]
    HashMismatch {
        expected: ContentHash,
        found: ContentHash,
    },
    #[error("operation spans {found} chars, document has {expected}")]
    LengthMismatch { expected: usize, found: usize },
}
