use std::io;
use thiserror::Error;

/// Fatal errors that unwind all the way out of a scan.
///
/// Per-entry I/O trouble (a bad `stat`, a permission-denied `open`, a short
/// `read`) is never represented here: it's counted and logged where it
/// happens and the offending entry is just dropped from its candidate set.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invariant violation: {0}")]
    Invariant(String),

    #[error("result sink failed: {0}")]
    Sink(#[source] io::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;
