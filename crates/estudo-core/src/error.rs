//! Error types for the Estudo application.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Estudo application.
///
/// Generation and persistence failures are recovered at the controller or
/// gateway boundary and turned into session state or result values; the
/// variants here are what those boundaries see before that conversion.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EstudoError {
    /// A second generation was requested while one is still in flight
    #[error("Session '{session_key}' is already generating")]
    AlreadyGenerating { session_key: String },

    /// An entry with this id already exists in the session
    #[error("Duplicate identifier: '{id}'")]
    DuplicateIdentifier { id: String },

    /// A fragment arrived for an entry that was already finalized
    #[error("Late fragment for finalized entry '{id}'")]
    LateFragment { id: String },

    /// The generation source failed mid-stream
    #[error("Stream error: {0}")]
    Stream(String),

    /// Writing an artifact failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Structured generation returned nothing usable
    #[error("Structured generation error: {0}")]
    StructuredGeneration(String),

    /// A phase change that the session state machine does not allow
    #[error("Invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EstudoError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an AlreadyGenerating error
    pub fn already_generating(session_key: impl Into<String>) -> Self {
        Self::AlreadyGenerating {
            session_key: session_key.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Stream error
    pub fn stream(message: impl Into<String>) -> Self {
        Self::Stream(message.into())
    }

    /// Creates a Persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence(message.into())
    }

    /// Creates a StructuredGeneration error
    pub fn structured(message: impl Into<String>) -> Self {
        Self::StructuredGeneration(message.into())
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is an AlreadyGenerating error
    pub fn is_already_generating(&self) -> bool {
        matches!(self, Self::AlreadyGenerating { .. })
    }

    /// Check if this error is a protocol contract violation.
    ///
    /// These indicate a bookkeeping bug and are logged, never shown to the user.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. } | Self::LateFragment { .. }
        )
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Persistence error
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for EstudoError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::Io {
                message: format!("File not found: {}", err),
            },
            kind => Self::Io {
                message: format!("{} (kind: {:?})", err, kind),
            },
        }
    }
}

impl From<serde_json::Error> for EstudoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for EstudoError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, EstudoError>`.
pub type Result<T> = std::result::Result<T, EstudoError>;
