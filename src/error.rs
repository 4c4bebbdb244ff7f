//! Error taxonomy for the triage workflow.
//!
//! Every variant except [`TriageError::Config`] is recoverable: the
//! orchestrators record it in state and stay re-triggerable.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TriageError {
    /// Local pre-flight rejection. Never reaches the network.
    #[error("{0}")]
    Validation(String),

    /// Connectivity failure or transport timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success response from the classifier, body kept verbatim.
    #[error("Triage API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Unexpected error: {0}")]
    Unknown(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// An orchestrator action was invoked from a state that does not accept it.
    #[error("cannot {action} while {from}")]
    InvalidTransition { action: &'static str, from: String },
}

impl TriageError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn invalid_transition(action: &'static str, from: impl std::fmt::Display) -> Self {
        Self::InvalidTransition {
            action,
            from: from.to_string(),
        }
    }

    /// Taxonomy name used in logs and operator-facing messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::Network(_) => "NetworkError",
            Self::Api { .. } => "ApiError",
            Self::Unknown(_) => "UnknownError",
            Self::Config(_) => "ConfigError",
            Self::InvalidTransition { .. } => "InvalidTransition",
        }
    }

    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

impl From<reqwest::Error> for TriageError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::Network(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Api {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            Self::Unknown(err.to_string())
        }
    }
}

impl From<config::ConfigError> for TriageError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<validator::ValidationErrors> for TriageError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<url::ParseError> for TriageError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TriageError>;
