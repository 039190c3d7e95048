use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq, Hash)]
pub enum Error {
    #[error(transparent)]
    Usage(#[from] UsageError),
    /// A program failed to compile or run. The whole batch is abandoned.
    #[error(transparent)]
    Execution(#[from] interleave_script::Error),
    #[error(transparent)]
    Limit(#[from] LimitError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq, Hash)]
pub enum UsageError {
    #[error("expected between {min} and {max} threads, got {got}")]
    ThreadCount { got: usize, min: usize, max: usize },
    #[error("{0}: no such file or directory")]
    NotFound(PathBuf),
    #[error("{0}: permission denied")]
    PermissionDenied(PathBuf),
    #[error("{0}: is a directory")]
    IsADirectory(PathBuf),
    #[error("{0}: invalid UTF-8")]
    InvalidUtf8(PathBuf),
    #[error("{path}: {msg}")]
    Io { path: PathBuf, msg: String },
    #[error("failed to write output: {0}")]
    Output(String),
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq, Hash)]
pub enum LimitError {
    #[error("{count} interleavings exceed the limit of {max}")]
    TooManyInterleavings { count: u128, max: u128 },
    #[error("too many interleavings to count (limit {max})")]
    Uncountable { max: u128 },
}

impl UsageError {
    /// Classifies an error from reading a source file.
    pub fn from_io(err: &io::Error, path: &Path) -> Self {
        let path = path.to_owned();
        match err.kind() {
            io::ErrorKind::NotFound => UsageError::NotFound(path),
            io::ErrorKind::PermissionDenied => UsageError::PermissionDenied(path),
            io::ErrorKind::InvalidData => UsageError::InvalidUtf8(path),
            _ if path.is_dir() => UsageError::IsADirectory(path),
            _ => UsageError::Io {
                path,
                msg: err.to_string(),
            },
        }
    }
}
