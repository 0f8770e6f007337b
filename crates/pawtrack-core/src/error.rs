//! Error types for the store, configuration and service layers.
//!
//! The detector itself is total and has no error type.

use crate::event::EventId;

/// Errors raised by event store mutations
#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    UnknownEvent(EventId),
    SubjectMismatch { expected: String, found: String },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownEvent(id) => write!(f, "Unknown event: {}", id),
            Self::SubjectMismatch { expected, found } => write!(
                f,
                "Event belongs to subject '{}', not '{}'",
                expected, found
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors raised while loading or checking a `DetectorConfig`
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "Failed to read config: {}", e),
            Self::Parse(e) => write!(f, "Failed to parse config: {}", e),
            Self::Invalid(e) => write!(f, "Invalid config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}
