//! Unified Error Model
use thiserror::Error;

/// Failure reported by a Catalog API Client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("NET/{0}")]
    Network(String),

    #[error("API/REJECTED: {0}")]
    Rejected(String),

    #[error("API/NOT_FOUND: {0}")]
    NotFound(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SillError {
    /// Programming error: an operation was invoked from the wrong state
    #[error("PRECONDITION/{0}")]
    Precondition(String),

    #[error("NOT_FOUND/{entity} '{key}'")]
    NotFound { entity: &'static str, key: String },

    #[error("VALIDATION/{field}: {message}")]
    Validation { field: &'static str, message: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("CONFIG/{0}")]
    Config(String),

    #[error("SERIALIZE/{0}")]
    Serialize(String),
}

impl SillError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            key: key.into(),
        }
    }

    /// Whether the error comes from misuse of the state machines rather than
    /// from the user or the network
    pub fn is_programming_error(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

impl From<serde_json::Error> for SillError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialize(e.to_string())
    }
}

pub type Result<T, E = SillError> = std::result::Result<T, E>;
