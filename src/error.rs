//! Error types for clickstream-ingest

use thiserror::Error;

/// Errors that can occur while ingesting and forwarding events
#[derive(Debug, Error)]
pub enum IngestError {
    /// No transport backend is configured or constructible for this request
    #[error("No transport configured")]
    NoTransportConfigured,

    /// A backend driver failed to initialize
    ///
    /// Contained inside the registry: logged, the slot stays empty, and
    /// construction is retried on the next request.
    #[error("Failed to construct '{backend}' driver: {reason}")]
    DriverConstruction {
        backend: String,
        reason: String,
    },

    /// Request body claimed to be base64 but could not be decoded to UTF-8 text
    #[error("Failed to decode request body: {0}")]
    BodyDecode(String),

    /// Synchronous publish failure, propagated to the caller
    #[error("Failed to publish record via '{driver}': {reason}")]
    Publish {
        driver: String,
        reason: String,
    },

    /// Record could not be serialized for a backend
    ///
    /// Treated as a logged no-op send inside drivers, never request-fatal.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, IngestError>;
