//! Error types for the resolution and caching layer
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Storage Error ==
/// Failure reported by a persistent storage backend.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing would exceed the backend's byte quota
    #[error("Storage quota exceeded while writing key: {0}")]
    QuotaExceeded(String),

    /// Underlying file I/O failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data could not be encoded or decoded
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// == Store Error ==
/// Reason a bounded store write did not take place.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The key is reserved for store bookkeeping
    #[error("Key is reserved: {0}")]
    ReservedKey(String),

    /// A single entry is larger than the whole store
    #[error("Entry of {size} bytes exceeds capacity of {capacity} bytes")]
    TooLarge { size: usize, capacity: usize },

    /// Eviction could not free enough space
    #[error("Unable to free {needed} bytes for key: {key}")]
    NoSpace { key: String, needed: usize },

    /// The value could not be serialized
    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend rejected the write, even after an emergency purge
    #[error(transparent)]
    Storage(#[from] StorageError),
}

// == Backend Error ==
/// Failure reported by an entity collaborator (listing or direct lookup).
#[derive(Error, Debug, Clone)]
pub enum BackendError {
    /// The service could not be reached or timed out
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

// == API Error ==
/// Error type surfaced by the HTTP layer.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Entity not found after exhausting every resolution strategy
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

// == Startup Error ==
/// Failure while wiring the layer together from configuration.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Invalid ID pattern: {0}")]
    InvalidIdPattern(#[from] regex::Error),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

// == Result Type Aliases ==
/// Convenience Result type for HTTP handlers.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Result of a collaborator call.
pub type BackendResult<T> = std::result::Result<T, BackendError>;
