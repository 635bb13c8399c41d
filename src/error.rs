//! Error handling for Susurrus
//!
//! One error type covers the whole pipeline, from configuration validation
//! through external engine invocations. Config and pool errors are raised
//! before the engine is ever touched.

use thiserror::Error;

/// Result type alias for Susurrus operations
pub type Result<T> = std::result::Result<T, SusurrusError>;

/// Main error type for Susurrus operations
#[derive(Error, Debug)]
pub enum SusurrusError {
    // Configuration Errors
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    // Clip Pool Errors
    #[error("No clips found in {dir}")]
    EmptyPool { dir: String },

    // Probe Errors
    #[error("Could not measure duration of {path}: {reason}")]
    Probe { path: String, reason: String },

    // External Engine Errors
    #[error("Audio engine {operation} failed (exit {status}): {stderr}")]
    Engine {
        operation: String,
        status: i32,
        stderr: String,
    },

    #[error("Audio engine executable not found: {name}")]
    EngineNotFound { name: String },

    // Processing Graph Errors
    #[error("Invalid processing graph: {reason}")]
    Graph { reason: String },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SusurrusError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            SusurrusError::Config { .. } => "CONFIG_ERROR",
            SusurrusError::EmptyPool { .. } => "EMPTY_POOL",
            SusurrusError::Probe { .. } => "PROBE_ERROR",
            SusurrusError::Engine { .. } => "ENGINE_ERROR",
            SusurrusError::EngineNotFound { .. } => "ENGINE_NOT_FOUND",
            SusurrusError::Graph { .. } => "GRAPH_ERROR",
            SusurrusError::Io(_) => "IO_ERROR",
            SusurrusError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Shorthand for a configuration error
    pub fn config(reason: impl Into<String>) -> Self {
        SusurrusError::Config {
            reason: reason.into(),
        }
    }

    /// Shorthand for a graph validation error
    pub fn graph(reason: impl Into<String>) -> Self {
        SusurrusError::Graph {
            reason: reason.into(),
        }
    }

    /// Whether the user can fix this by editing configuration or inputs.
    ///
    /// Engine failures are treated as deterministic (bad graph or bad
    /// input), so nothing here warrants an automatic retry.
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self,
            SusurrusError::Config { .. }
                | SusurrusError::EmptyPool { .. }
                | SusurrusError::EngineNotFound { .. }
                | SusurrusError::Engine { .. }
        )
    }
}
