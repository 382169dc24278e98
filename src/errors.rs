use std::io;
use std::path::PathBuf;
use std::str::Utf8Error;
use std::string::FromUtf8Error;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NioError>;

#[derive(Error, Debug)]
pub enum NioError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("Read chain already started for {0:?}")]
    DoubleStart(PathBuf),
    #[error("Failed to release {}: {reason}", .path.display())]
    Close { path: PathBuf, reason: String },
    #[error("File handle of {0:?} is already released")]
    Released(PathBuf),
    #[error("No read chain was started for {0:?}")]
    NotStarted(PathBuf),
    #[error("Read chain did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Buffer overflow: {requested} requested, {remaining} remaining")]
    Overflow { requested: usize, remaining: usize },
    #[error("Buffer underflow")]
    Underflow,
    #[error("Range {offset}..{offset}+{length} is out of bounds for {len}")]
    OutOfBounds {
        offset: usize,
        length: usize,
        len: usize,
    },
    #[error("Transfer buffer is already handed to a pending read")]
    InFlight,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Parsing error")]
    Parse,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a running read chain.
///
/// Cloneable, so every waiter on the chain receives the same error.
#[derive(Error, Debug, Clone)]
pub enum ReadError {
    #[error("Read at offset {offset} failed: {source}")]
    Io {
        offset: u64,
        #[source]
        source: Arc<io::Error>,
    },
    #[error("File handle was released at offset {offset}")]
    Released { offset: u64 },
    #[error("Read chain was dropped by its runtime at offset {offset}")]
    Abandoned { offset: u64 },
}

impl ReadError {
    pub fn offset(&self) -> u64 {
        match self {
            ReadError::Io { offset, .. } => *offset,
            ReadError::Released { offset } => *offset,
            ReadError::Abandoned { offset } => *offset,
        }
    }
}

impl From<Utf8Error> for NioError {
    fn from(_: Utf8Error) -> Self {
        Self::Parse
    }
}

impl From<FromUtf8Error> for NioError {
    fn from(_: FromUtf8Error) -> Self {
        Self::Parse
    }
}

impl From<serde_json::Error> for NioError {
    fn from(_: serde_json::Error) -> Self {
        Self::Parse
    }
}
