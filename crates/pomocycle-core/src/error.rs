//! Core error types for pomocycle-core.
//!
//! Every failure is recoverable: validation errors are raised before any
//! state changes, persistence errors leave in-memory state untouched, and
//! transition errors reject the call without side effects.

use std::path::PathBuf;
use thiserror::Error;

use crate::schedule::RunnerState;
use crate::timer::Phase;

/// Core error type for pomocycle-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Input rejected before any state change
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Storage unreachable or write failure
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Call not valid in the runner's current state
    #[error("Invalid transition: {0}")]
    Transition(#[from] TransitionError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{what} name must not be empty")]
    EmptyName { what: &'static str },

    #[error("{phase} duration must be greater than 0")]
    ZeroDuration { phase: Phase },

    #[error("duration must be a positive number of seconds (got {value})")]
    NonPositiveDuration { value: i64 },

    #[error("seconds must be between 0 and 59 (got {value})")]
    SecondsOutOfRange { value: u32 },

    #[error("cannot parse duration '{input}' (expected MM:SS or minutes)")]
    InvalidDuration { input: String },

    #[error("schedule '{name}' has no timers")]
    EmptySchedule { name: String },

    #[error("Index {index} out of bounds for schedule instances (length: {len})")]
    InstanceOutOfBounds { index: usize, len: usize },

    #[error("rating must be between 1 and 10 (got {value})")]
    RatingOutOfRange { value: i64 },

    #[error("cannot parse rating '{input}' (expected a number from 1 to 10)")]
    InvalidRating { input: String },

    #[error("tag must not be empty")]
    EmptyTag,
}

/// Storage errors. Paths are kept so the user can see what failed.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("Failed to access data directory: {0}")]
    DataDir(String),

    /// Raised by stores that were told to refuse writes.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Rejected runner/engine calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("countdown is already running")]
    AlreadyRunning,

    #[error("'{name}' is still running; cancel it before starting another")]
    RunActive { name: String },

    #[error("no timer or schedule is running")]
    NoActiveRun,

    #[error("cannot {action} while {state}")]
    NotAllowed {
        action: &'static str,
        state: RunnerState,
    },
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

impl CoreError {
    /// True when the failure came from storage and a retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::Persistence(_) | CoreError::Io(_))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
