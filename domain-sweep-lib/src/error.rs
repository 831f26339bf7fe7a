//! Error handling for domain sweep operations.
//!
//! This module defines one error type covering every way a sweep can fail,
//! from transport problems on the status connection to unreadable ledgers.

use std::fmt;

/// Main error type for domain sweep operations.
///
/// The variants split into three groups that the orchestrator treats
/// differently:
/// - per-base failures (`Connection`, `TimeoutIncomplete`) abandon one base
/// - per-row failures (`JoinData`) skip one table row
/// - everything else aborts the run
#[derive(Debug, Clone)]
pub enum DomainSweepError {
    /// Transport-level failure on the status connection
    Connection {
        message: String,
        source: Option<String>,
    },

    /// Idle timeout reached while some domains of a base were unanswered
    TimeoutIncomplete {
        base: String,
        answered: usize,
        expected: usize,
    },

    /// Ledger, input or export file could not be read or written
    FileError {
        path: String,
        message: String,
    },

    /// Malformed row in a price or category table
    JoinData {
        path: String,
        line: u64,
        message: String,
    },

    /// Message or row parsing errors
    ParseError {
        message: String,
    },

    /// Configuration errors (invalid settings, etc.)
    ConfigError {
        message: String,
    },

    /// Generic internal errors that don't fit other categories
    Internal {
        message: String,
    },
}

impl DomainSweepError {
    /// Create a new connection error.
    pub fn connection<M: Into<String>>(message: M) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new connection error with source information.
    pub fn connection_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new incomplete-timeout error for a base.
    pub fn timeout_incomplete<B: Into<String>>(base: B, answered: usize, expected: usize) -> Self {
        Self::TimeoutIncomplete {
            base: base.into(),
            answered,
            expected,
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new join data error for one table row.
    pub fn join_data<P: Into<String>, M: Into<String>>(path: P, line: u64, message: M) -> Self {
        Self::JoinData {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if retrying the same base later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::TimeoutIncomplete { .. }
        )
    }

    /// Check if this error must abort the whole run.
    ///
    /// Ledger durability cannot be guaranteed after a file error, so those
    /// are always fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::FileError { .. } | Self::ConfigError { .. } | Self::Internal { .. }
        )
    }
}

impl fmt::Display for DomainSweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection { message, source } => {
                if let Some(source) = source {
                    write!(f, "Connection error: {} (source: {})", message, source)
                } else {
                    write!(f, "Connection error: {}", message)
                }
            }
            Self::TimeoutIncomplete {
                base,
                answered,
                expected,
            } => {
                write!(
                    f,
                    "Idle timeout for base '{}': {} of {} domains answered",
                    base, answered, expected
                )
            }
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::JoinData {
                path,
                line,
                message,
            } => {
                write!(f, "Bad row in '{}' (line {}): {}", path, line, message)
            }
            Self::ParseError { message } => {
                write!(f, "Parse error: {}", message)
            }
            Self::ConfigError { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for DomainSweepError {}

impl From<tokio_tungstenite::tungstenite::Error> for DomainSweepError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match err {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                Self::connection("Connection closed")
            }
            other => Self::connection_with_source("WebSocket transport failed", other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DomainSweepError {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError {
            message: format!("JSON parsing failed: {}", err),
        }
    }
}

impl From<csv::Error> for DomainSweepError {
    fn from(err: csv::Error) -> Self {
        Self::ParseError {
            message: format!("CSV processing failed: {}", err),
        }
    }
}

impl From<std::io::Error> for DomainSweepError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}
