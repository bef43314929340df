//! Error types for the signing core.
//!
//! Every failure raised by an external collaborator is converted into one of
//! these variants so the batch loop can decide whether to continue, skip the
//! current document, or stop.

use std::path::PathBuf;

/// Result type alias for signing operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while assembling and executing signing requests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wrong password or malformed certificate container
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// The interactive stamp selection was cancelled
    #[error("Stamp placement cancelled for {}", .source_path.display())]
    GeometryInputAborted {
        /// Document whose selection was cancelled
        source_path: PathBuf,
    },

    /// The destination-path prompt was cancelled
    #[error("No destination chosen for {}", .source_path.display())]
    DestinationAborted {
        /// Document whose destination prompt was cancelled
        source_path: PathBuf,
    },

    /// The external signing primitive rejected the input or failed
    #[error("Signing failed: {0}")]
    SigningPrimitive(String),

    /// Document has no pages to place a stamp on
    #[error("PDF is empty: {}", .0.display())]
    EmptyDocument(PathBuf),

    /// Stamp profile could not be interpreted
    #[error("Invalid stamp profile: {0}")]
    InvalidProfile(String),

    /// A persisted setting has an unusable value
    #[error("Invalid setting: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure category reported in a [`SigningOutcome`](crate::signatures::SigningOutcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad password or malformed container
    Authentication,
    /// Stamp selection cancelled; only that document is skipped
    GeometryInputAborted,
    /// Destination prompt cancelled; the remaining batch is skipped
    DestinationAborted,
    /// Signer rejected the document, or reading/writing it failed
    SigningPrimitiveFailure,
    /// Stamp profile or empty document
    Profile,
    /// Persisted settings
    Config,
}

impl Error {
    /// Map this error onto the batch failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Authentication(_) => ErrorKind::Authentication,
            Error::GeometryInputAborted { .. } => ErrorKind::GeometryInputAborted,
            Error::DestinationAborted { .. } => ErrorKind::DestinationAborted,
            Error::SigningPrimitive(_) | Error::Io(_) => ErrorKind::SigningPrimitiveFailure,
            Error::EmptyDocument(_) | Error::InvalidProfile(_) | Error::Json(_) => {
                ErrorKind::Profile
            },
            Error::Config(_) => ErrorKind::Config,
        }
    }
}
