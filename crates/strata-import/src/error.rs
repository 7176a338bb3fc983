use std::path::PathBuf;

use thiserror::Error;

use strata_graph::LinkError;

use crate::options::ConfigError;

#[derive(Debug, Error)]
pub enum ImportError {
    /// A path, URL, or archive entry that does not exist or cannot be opened.
    #[error("location not found: {0}")]
    LocationNotFound(String),

    #[error("malformed class file {source_name}: {error}")]
    Malformed {
        source_name: String,
        #[source]
        error: strata_classfile::Error,
    },

    #[error(transparent)]
    ClassIdentityConflict(#[from] LinkError),

    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error in {path}: {source}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ImportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            return ImportError::LocationNotFound(path.display().to_string());
        }
        ImportError::Io { path, source }
    }

    pub(crate) fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        match source {
            zip::result::ZipError::Io(source) => ImportError::io(path, source),
            source => ImportError::Zip {
                path: path.into(),
                source,
            },
        }
    }
}
