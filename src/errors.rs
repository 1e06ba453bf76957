use std::{io, path::PathBuf, result};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The given path does not exist.
    #[error("file {0:?} not found")]
    NotFound(PathBuf),

    /// The container exists but does not carry valid tracking data.
    #[error("not a valid tracking container: {0}")]
    InvalidFormat(String),

    /// An accessor was invoked after the dataset was closed.
    #[error("dataset handle is closed")]
    ClosedHandle,

    /// A track or node filter could not be resolved. Carries the valid
    /// options so the caller can correct the filter and retry.
    #[error("invalid {kind} filter {given:?}; options are {options:?}")]
    InvalidFilter {
        kind: &'static str,
        given: String,
        options: Vec<String>,
    },

    /// A mutable array view was requested on a read-only handle.
    #[error("container is opened read-only")]
    ReadOnly,

    /// The container has no array or table under a schema-required key.
    #[error("no array or table named {0:?} in container")]
    BadKey(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = result::Result<T, Error>;
