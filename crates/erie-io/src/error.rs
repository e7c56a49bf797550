//! Errors raised while reading tables, configuration or writing exports.

use std::io;
use std::path::{Path, PathBuf};

use erie_core::ErieError;
use thiserror::Error;

pub type DataResult<T> = Result<T, DataError>;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Well-formed CSV whose contents do not fit the expected layout.
    #[error("{path}, row {row}: {message}")]
    Layout {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error(transparent)]
    Model(#[from] ErieError),
}

impl DataError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn layout(path: &Path, row: usize, message: impl Into<String>) -> Self {
        Self::Layout {
            path: path.to_path_buf(),
            row,
            message: message.into(),
        }
    }
}

impl From<DataError> for ErieError {
    fn from(err: DataError) -> Self {
        match err {
            DataError::Io { path, source } => ErieError::Io(io::Error::new(
                source.kind(),
                format!("{}: {source}", path.display()),
            )),
            DataError::Config { .. } => ErieError::Config(err.to_string()),
            DataError::Model(inner) => inner,
            other => ErieError::Data(other.to_string()),
        }
    }
}
