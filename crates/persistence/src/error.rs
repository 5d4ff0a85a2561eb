//! Error types for the repository layer.
//!
//! Errors are split by origin: configuration and schema errors are raised
//! eagerly when a repository is constructed, engine errors come back from
//! the search engine (and are retried), bulk errors describe partial
//! failures inside otherwise successful bulk calls.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

use crate::retry::RetryError;

/// The primary error type for all repository operations.
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Missing or invalid options
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Malformed entity schema declaration
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Non-success answer or transport failure from the engine
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Partial bulk failures
    #[error(transparent)]
    Bulk(#[from] BulkError),

    /// Serialization/deserialization error.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// The operation exists on the surface but has no implementation.
    #[error("{operation} is not implemented")]
    NotImplemented { operation: &'static str },

    /// The call was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

/// Errors related to repository options.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required option is missing or empty.
    #[error("missing required option: {field}")]
    MissingField { field: &'static str },

    /// An option holds a value outside its accepted range.
    #[error("invalid option {field}: {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Errors raised while building property descriptors from a declared schema.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A type was declared without a name.
    #[error("schema declared without a type name at {path}")]
    MissingTypeName { path: String },

    /// A property was declared without a name.
    #[error("property without a name in type {type_name}")]
    MissingPropertyName { type_name: String },

    /// The same property name was declared twice on one type.
    #[error("duplicate property {name} in type {type_name}")]
    DuplicateProperty { type_name: String, name: String },

    /// An aggregation annotation carries an empty order key.
    #[error("aggregation on {path} has an empty order key")]
    EmptyAggregateOrder { path: String },
}

/// Errors originating from the search engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The request never produced a response (connection, timeout, TLS, ...).
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The engine answered with a non-success status.
    ///
    /// `reason` is the engine's `error.reason` when present, the raw
    /// response body otherwise.
    #[error("engine returned status {status}: {reason}")]
    Response { status: u16, reason: String },

    /// The engine answered but the body could not be interpreted.
    #[error("unexpected engine response: {message}")]
    UnexpectedResponse { message: String },
}

/// Errors related to bulk operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BulkError {
    /// One chunk contained items the engine rejected.
    #[error("bulk chunk {chunk} failed for {} item(s): {reason}", failed_ids.len())]
    ChunkFailed {
        chunk: usize,
        failed_ids: Vec<String>,
        reason: String,
    },

    /// One or more chunks still failed after retries were exhausted.
    #[error("\r\n{}", failures.join("; \r\n"))]
    Aggregate { failures: Vec<String> },
}

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for raw engine calls.
pub type EngineResult<T> = Result<T, EngineError>;

impl RepositoryError {
    /// Whether the error may succeed on a later attempt.
    ///
    /// Every error raised by an engine call qualifies; local errors
    /// (configuration, schema, cancellation, stubs) never do.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            RepositoryError::Configuration(_)
                | RepositoryError::Schema(_)
                | RepositoryError::NotImplemented { .. }
                | RepositoryError::Cancelled
        )
    }

    /// Whether the error looks transient: transport failures, throttling
    /// (429) and server-side (5xx) errors.
    pub fn is_transient(&self) -> bool {
        match self {
            RepositoryError::Engine(EngineError::Transport { .. }) => true,
            RepositoryError::Engine(EngineError::Response { status, .. }) => {
                *status == 429 || *status >= 500
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<RetryError<RepositoryError>> for RepositoryError {
    fn from(err: RetryError<RepositoryError>) -> Self {
        match err {
            RetryError::Failed(inner) => inner,
            RetryError::Cancelled => RepositoryError::Cancelled,
        }
    }
}
