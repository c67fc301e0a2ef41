//! Error types for the translation runtime.

use std::path::PathBuf;

/// Errors raised while discovering, loading or persisting translations.
#[derive(thiserror::Error, Debug)]
pub enum I18nError {
    /// The translations root could not be listed, or an entry could not be inspected.
    #[error("Failed to scan translations directory {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configuration value is missing or inconsistent.
    #[error("Invalid i18n configuration: {0}")]
    InvalidOptions(String),

    /// A resource file could not be read or written.
    #[error("Backend I/O error on {path}: {source}")]
    BackendIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A resource file does not contain a JSON object.
    #[error("Malformed resource file {path}: {message}")]
    MalformedResource { path: PathBuf, message: String },
}

impl I18nError {
    /// The underlying io error kind, when this error came from the filesystem.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            Self::Discovery { source, .. } | Self::BackendIo { source, .. } => Some(source.kind()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, I18nError>;
