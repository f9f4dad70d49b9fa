//! Error types for ci-decision

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using DecisionError
pub type Result<T> = std::result::Result<T, DecisionError>;

/// Main error type for decision task operations
#[derive(Debug, Error)]
pub enum DecisionError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Task descriptor errors
    #[error(transparent)]
    Task(#[from] TaskError),

    /// Backend submission errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while checking or rendering a task descriptor
#[derive(Debug, Error)]
pub enum TaskError {
    /// Task name is empty
    #[error("Task name cannot be empty")]
    EmptyName,

    /// Task command is empty
    #[error("Task '{0}' has an empty command")]
    EmptyCommand(String),

    /// Max run time out of range
    #[error("Task '{task}' has invalid max run time: {minutes} minutes")]
    InvalidMaxRunTime { task: String, minutes: u32 },

    /// Scope string is malformed
    #[error("Task '{task}' has malformed scope '{scope}': {reason}")]
    InvalidScope {
        task: String,
        scope: String,
        reason: String,
    },

    /// Dockerfile does not exist
    #[error("Dockerfile not found for task '{task}': {path}")]
    DockerfileNotFound { task: String, path: PathBuf },

    /// Relative time expression could not be parsed
    #[error("Invalid relative time '{0}'")]
    InvalidRelativeTime(String),
}

/// Errors raised by a CI backend
#[derive(Debug, Error)]
pub enum BackendError {
    /// Backend refused the task
    #[error("Backend '{backend}' rejected task '{task}': {reason}")]
    Rejected {
        backend: String,
        task: String,
        reason: String,
    },

    /// Failed to write output
    #[error("Failed to write {target}: {reason}")]
    WriteFailed { target: String, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
