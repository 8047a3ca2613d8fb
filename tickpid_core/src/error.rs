//! Error types for tickpid
//!
//! The PID algorithm itself is total and never returns errors; everything here
//! belongs to the layers around it (parameter files, channels, input parsing).

use thiserror::Error;

/// Errors raised by the tickpid runtime
#[derive(Debug, Error)]
pub enum TickPidError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parameter '{0}' not found")]
    ParameterNotFound(String),

    #[error("Communication error: {0}")]
    Communication(String),

    #[error("Node '{node}' failed: {message}")]
    NodeError { node: String, message: String },
}

impl TickPidError {
    /// Shorthand for a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Shorthand for an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Shorthand for a channel or transport failure
    pub fn communication(msg: impl Into<String>) -> Self {
        Self::Communication(msg.into())
    }

    /// Error attributed to a named node
    pub fn node(node: impl Into<String>, message: impl Into<String>) -> Self {
        Self::NodeError {
            node: node.into(),
            message: message.into(),
        }
    }
}

/// Result type for tickpid operations
pub type TickPidResult<T> = Result<T, TickPidError>;
