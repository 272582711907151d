use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by the data-access layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Identifier text that does not parse as a store identifier.
    #[error("invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// Driver or connectivity failure reported by the backend.
    #[error("store backend error: {0}")]
    Backend(String),

    #[error("document serialization failed: {0}")]
    Serialization(String),

    /// The handle was shut down.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for StoreError {
    fn from(err: mongodb::bson::ser::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
