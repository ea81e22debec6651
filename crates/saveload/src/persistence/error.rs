use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::codec::CodecError;
use super::paths::Category;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("a save/load manager is already live in this process")]
    AlreadyInitialized,
    #[error("no {category} file at {path}")]
    NotFound { category: Category, path: PathBuf },
    #[error("failed to encode {category}: {message}")]
    Encode { category: Category, message: String },
    #[error("file {path} has invalid format: {message}")]
    Format { path: PathBuf, message: String },
    #[error("file {path} is corrupt: {message}")]
    Corruption { path: PathBuf, message: String },
    #[error("failed to read/write file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl PersistenceError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        PersistenceError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn from_codec(category: Category, path: &Path, error: CodecError) -> Self {
        match error {
            CodecError::Encode { message, .. } => PersistenceError::Encode { category, message },
            CodecError::Format { .. } => PersistenceError::Format {
                path: path.to_path_buf(),
                message: error.to_string(),
            },
            CodecError::Corruption { .. } => PersistenceError::Corruption {
                path: path.to_path_buf(),
                message: error.to_string(),
            },
        }
    }
}
