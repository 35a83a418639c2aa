//! Custom error types for `pigshift` operations.
//!
//! Every failure is surfaced to the caller; the orchestration host decides
//! whether to retry. The root [`PigshiftError`] delegates display formatting to
//! the domain-specific enums below.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for `pigshift` operations.
#[derive(Debug, Error)]
pub enum PigshiftError {
    /// Schema reading and translation errors
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Single-file transfer errors
    #[error(transparent)]
    Transfer(#[from] TransferError),

    /// Errors raised by a local or remote target
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic errors from dependencies
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors produced while locating, reading, or translating a Pig schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The document is not JSON or lacks the expected `fields` structure
    #[error("Malformed Pig schema: {reason}")]
    Malformed {
        /// Description of the parse failure
        reason: String,
    },

    /// A field carries a type code with no Redshift translation
    #[error("Unsupported Pig type: {code} (field '{field}')")]
    UnsupportedType {
        /// The offending Pig type code, as written in the document
        code: String,
        /// Name of the field carrying the code
        field: String,
    },

    /// No schema object exists at the requested location
    #[error("No schema file located at {location}. Can not set Redshift columns.")]
    MissingSource {
        /// The schema location that was checked
        location: String,
    },

    /// The store failed while fetching the schema document
    #[error("Failed to read schema file '{location}': {source}")]
    Read {
        /// The schema location
        location: String,
        /// The underlying store error
        #[source]
        source: object_store::Error,
    },
}

/// Errors raised by a [`Target`](crate::transfer::Target).
#[derive(Debug, Error)]
pub enum StorageError {
    /// Local filesystem failure
    #[error("Local file '{path}': {source}")]
    Local {
        /// The local path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Object store failure
    #[error("Remote object '{location}': {source}")]
    Remote {
        /// The object location
        location: String,
        /// The underlying store error
        #[source]
        source: object_store::Error,
    },
}

/// Single-file transfer errors.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The destination existence check failed, so nothing was attempted
    #[error("Could not check whether '{target}' exists: {source}")]
    Check {
        /// Description of the destination
        target: String,
        /// The underlying storage error
        #[source]
        source: StorageError,
    },

    /// The copy failed; any partial destination has already been removed
    #[error("Transfer from '{from}' to '{to}' failed: {source}")]
    Copy {
        /// Description of the source
        from: String,
        /// Description of the destination
        to: String,
        /// The underlying storage error
        #[source]
        source: StorageError,
    },
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid option value
    #[error("Invalid {option} option: {message}")]
    InvalidOption {
        /// The option name
        option: String,
        /// Why it's invalid
        message: String,
    },

    /// Required option is missing
    #[error("Missing required option: {option}")]
    MissingRequired {
        /// The missing option name
        option: String,
    },

    /// The object store could not be built for a location
    #[error("Cannot open object store for '{location}': {source}")]
    Store {
        /// The location that was parsed
        location: String,
        /// The underlying store error
        #[source]
        source: object_store::Error,
    },
}

/// Type alias for Results using `PigshiftError`.
pub type Result<T> = std::result::Result<T, PigshiftError>;

impl PigshiftError {
    /// Get a user-friendly error message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Schema(e) => e.user_message(),
            Self::Transfer(e) => e.to_string(),
            Self::Storage(e) => e.to_string(),
            Self::Config(e) => format!("Configuration error: {e}"),
            Self::Other(e) => format!("Error: {e}"),
        }
    }

    /// Get recovery suggestions if available.
    #[must_use]
    pub fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::Schema(e) => e.recovery_suggestion(),
            Self::Transfer(_) | Self::Storage(_) => Some(
                "Check the local path, the remote location and the store credentials, then retry."
                    .to_string(),
            ),
            Self::Config(ConfigError::MissingRequired { option }) => {
                Some(format!("Set {option} in the environment."))
            },
            _ => None,
        }
    }

    /// Check if the host scheduler may reasonably retry the failed unit of work.
    ///
    /// Schema problems are deterministic and never fixed by a retry; storage
    /// and transfer failures may be transient.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transfer(_) | Self::Storage(_))
    }
}

impl SchemaError {
    fn user_message(&self) -> String {
        match self {
            Self::UnsupportedType { code, field } => {
                format!("Field '{field}' has Pig type code {code}, which has no Redshift mapping.")
            },
            _ => self.to_string(),
        }
    }

    fn recovery_suggestion(&self) -> Option<String> {
        match self {
            Self::MissingSource { .. } => Some(
                "Check that the Pig job stored its output with a schema (PigStorage('-schema'))."
                    .to_string(),
            ),
            Self::UnsupportedType { .. } => Some(
                "Cast the field to a scalar type in the Pig script before storing.".to_string(),
            ),
            Self::Malformed { .. } => {
                Some("Check that the schema file is the .pig_schema written by Pig.".to_string())
            },
            Self::Read { .. } => None,
        }
    }
}

/// Extension trait for adding target context to I/O and store errors.
pub trait StorageErrorExt<T> {
    /// Wrap a filesystem error with the local path it concerns.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError::Local`] if the underlying operation fails.
    fn with_local_context(self, path: impl Into<PathBuf>) -> std::result::Result<T, StorageError>;
}

impl<T> StorageErrorExt<T> for std::io::Result<T> {
    fn with_local_context(self, path: impl Into<PathBuf>) -> std::result::Result<T, StorageError> {
        self.map_err(|source| StorageError::Local {
            path: path.into(),
            source,
        })
    }
}
