//! Error types for the ifgate system
//!
//! This module defines all error types used throughout the crate.

use std::fmt;
use thiserror::Error;

/// Result type alias for ifgate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ifgate system
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed gate, descriptor or daemon configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// An expression produced an unexpected number of results
    #[error("Evaluation error ({subject}): {message}")]
    Evaluation {
        /// What was being evaluated (extension name, interface, ...)
        subject: String,
        /// Error message
        message: String,
    },

    /// Hostname resolution failed
    #[error("Resolver error: {0}")]
    Resolve(String),

    /// Reachability probe could not be performed
    #[error("Reachability probe error: {0}")]
    Probe(String),

    /// A kernel attribute could not be opened or read
    #[error("Attribute error ({path}): {message}")]
    Attribute {
        /// Attribute path
        path: String,
        /// Error message
        message: String,
    },

    /// A single-element attribute write failed
    #[error("Attribute write failed ({path} <- {value}): {message}")]
    AttributeWrite {
        /// Attribute path
        path: String,
        /// Value that could not be written (without sigil)
        value: String,
        /// Error message
        message: String,
    },

    /// An extension command failed
    #[error("Extension {extension}: {command} command {failure}")]
    Process {
        /// Extension name
        extension: String,
        /// Which command was run ("start" or "stop")
        command: String,
        /// How it failed
        failure: ProcessFailure,
    },

    /// Underlying I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

/// Classified failure of an extension command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessFailure {
    /// The child could not be spawned
    SpawnFailed(String),
    /// Waiting for the child failed
    WaitFailed(String),
    /// The child did not exit normally (killed by a signal)
    Abnormal {
        /// Terminating signal, if known
        signal: Option<i32>,
    },
    /// The child exited with a nonzero status
    ExitStatus(i32),
    /// Start succeeded but the liveness check reports the service is down
    NotRunning,
    /// Stop succeeded but the liveness check reports the service is up
    StillRunning,
}

impl fmt::Display for ProcessFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessFailure::SpawnFailed(msg) => write!(f, "could not be spawned: {}", msg),
            ProcessFailure::WaitFailed(msg) => write!(f, "could not be waited for: {}", msg),
            ProcessFailure::Abnormal { signal: Some(sig) } => {
                write!(f, "terminated abnormally (signal {})", sig)
            }
            ProcessFailure::Abnormal { signal: None } => write!(f, "terminated abnormally"),
            ProcessFailure::ExitStatus(code) => write!(f, "exited with error status {}", code),
            ProcessFailure::NotRunning => write!(f, "succeeded, but service not running"),
            ProcessFailure::StillRunning => write!(f, "succeeded, but service still running"),
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an evaluation error
    pub fn evaluation(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Evaluation {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create a resolver error
    pub fn resolve(msg: impl Into<String>) -> Self {
        Self::Resolve(msg.into())
    }

    /// Create a probe error
    pub fn probe(msg: impl Into<String>) -> Self {
        Self::Probe(msg.into())
    }

    /// Create an attribute read/open error
    pub fn attribute(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Attribute {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an attribute write error
    pub fn attribute_write(
        path: impl Into<String>,
        value: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::AttributeWrite {
            path: path.into(),
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an extension process error
    pub fn process(
        extension: impl Into<String>,
        command: impl Into<String>,
        failure: ProcessFailure,
    ) -> Self {
        Self::Process {
            extension: extension.into(),
            command: command.into(),
            failure,
        }
    }

    /// The classified process failure, if this is a process error
    pub fn process_failure(&self) -> Option<&ProcessFailure> {
        match self {
            Self::Process { failure, .. } => Some(failure),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
