//! Error taxonomy shared by every A2A participant.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Closed set of protocol error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AgentUnavailable,
    Timeout,
    InvalidMessage,
    CapabilityNotFound,
    RateLimited,
    AuthenticationFailed,
    ConsensusFailed,
    WorkflowFailed,
    InternalError,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 9] = [
        ErrorCode::AgentUnavailable,
        ErrorCode::Timeout,
        ErrorCode::InvalidMessage,
        ErrorCode::CapabilityNotFound,
        ErrorCode::RateLimited,
        ErrorCode::AuthenticationFailed,
        ErrorCode::ConsensusFailed,
        ErrorCode::WorkflowFailed,
        ErrorCode::InternalError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AgentUnavailable => "AGENT_UNAVAILABLE",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::InvalidMessage => "INVALID_MESSAGE",
            ErrorCode::CapabilityNotFound => "CAPABILITY_NOT_FOUND",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::AuthenticationFailed => "AUTHENTICATION_FAILED",
            ErrorCode::ConsensusFailed => "CONSENSUS_FAILED",
            ErrorCode::WorkflowFailed => "WORKFLOW_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether a caller may retry the failed request as-is.
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::Timeout | ErrorCode::AgentUnavailable | ErrorCode::RateLimited
        )
    }
}

/// Static retryability table lookup.
pub const fn is_retryable(code: ErrorCode) -> bool {
    code.is_retryable()
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCode {
    type Err = A2aRtError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        ErrorCode::ALL
            .into_iter()
            .find(|code| code.as_str() == value)
            .ok_or_else(|| A2aRtError::InvalidMessage(format!("Unknown error code: {}", value)))
    }
}

#[derive(Debug, Error)]
pub enum A2aRtError {
    #[error("No agent found for type: {0}")]
    AgentUnavailable(String),

    #[error("Agent not started")]
    NotStarted,

    #[error("Request timed out after {ttl_ms}ms")]
    Timeout { ttl_ms: u64 },

    #[error("Invalid message: {0}")]
    InvalidMessage(String),

    #[error("{code} from {agent_id}: {message}")]
    Remote {
        code: ErrorCode,
        message: String,
        agent_id: String,
        details: Option<Value>,
    },

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Broker error: {0}")]
    Broker(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Agent hook failed: {0}")]
    Hook(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl A2aRtError {
    /// Protocol code describing this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            A2aRtError::AgentUnavailable(_) => ErrorCode::AgentUnavailable,
            A2aRtError::Timeout { .. } => ErrorCode::Timeout,
            A2aRtError::InvalidMessage(_) | A2aRtError::Json(_) => ErrorCode::InvalidMessage,
            A2aRtError::Remote { code, .. } => *code,
            A2aRtError::NotStarted
            | A2aRtError::Registry(_)
            | A2aRtError::Broker(_)
            | A2aRtError::InvalidTransition { .. }
            | A2aRtError::Config(_)
            | A2aRtError::Hook(_) => ErrorCode::InternalError,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

pub type Result<T> = std::result::Result<T, A2aRtError>;
