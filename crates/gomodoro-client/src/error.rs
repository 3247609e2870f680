//! Error types for gomodoro-client.
//!
//! Transport failures (network, HTTP status, socket, GraphQL `errors` array)
//! are kept distinct from remote logical failures (a mutation returning a
//! null entity). Nothing here retries; the only retry loop in the crate is
//! the startup health probe.

use thiserror::Error;

/// Failures raised by the GraphQL transport layer.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Underlying HTTP request failed (connect, DNS, body read, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("HTTP status {0}")]
    Status(reqwest::StatusCode),

    /// The response carried a GraphQL `errors` array. Messages are
    /// concatenated into one failure.
    #[error("GraphQL error: {0}")]
    Graphql(String),

    /// A mutation response had no `data` field.
    #[error("empty response for {operation}")]
    EmptyResponse { operation: &'static str },

    /// Response body was not the expected shape.
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// WebSocket-level failure on the subscription socket.
    #[error("subscription socket error: {0}")]
    Socket(String),

    /// Invalid endpoint configuration.
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Failures raised by the domain service.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server acknowledged a mutation but returned a null entity.
    #[error("failed to {operation} pomodoro: {operation} result not found")]
    NullPomodoro { operation: &'static str },

    /// Task mutation returned a null entity.
    #[error("failed to {operation} task: {operation} result not found")]
    NullTask { operation: &'static str },
}

/// Failures from the fallback backend process supervisor.
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("failed to spawn backend process '{program}': {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to terminate backend process: {0}")]
    TerminateFailed(std::io::Error),
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;
