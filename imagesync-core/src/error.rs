//! Error types for imagesync-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ImageName;
use crate::version::ParseError;

/// Errors raised while loading or validating the desired-state configuration.
///
/// Every variant is fatal and pre-flight: nothing downstream may run once one
/// of these has been produced.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, annotated with the file that was being read.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },

    /// The desired image list was empty.
    #[error("no images declared; refusing to reconcile an empty desired state")]
    NoImagesDeclared,

    /// The same image name was declared twice.
    #[error("image '{name}' is declared more than once")]
    DuplicateImage { name: ImageName },

    /// A declared version could not be parsed.
    #[error("invalid declared version for image '{name}': {source}")]
    InvalidDeclaredVersion {
        name: ImageName,
        #[source]
        source: ParseError,
    },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
