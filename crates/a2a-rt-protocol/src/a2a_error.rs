use a2a_rt_core::ids::AgentId;
use a2a_rt_core::{A2aRtError, ErrorCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Payload of an `error` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2aError {
    pub code: ErrorCode,
    pub message: String,
    pub agent_id: AgentId,
    pub timestamp: DateTime<Utc>,
    pub retryable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl A2aError {
    /// `retryable` is always derived from the code.
    pub fn new(code: ErrorCode, message: impl Into<String>, agent_id: AgentId) -> Self {
        Self {
            code,
            message: message.into(),
            agent_id,
            timestamp: Utc::now(),
            retryable: code.is_retryable(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details = Some(details);
        self
    }
}

impl From<A2aError> for A2aRtError {
    fn from(error: A2aError) -> Self {
        A2aRtError::Remote {
            code: error.code,
            message: error.message,
            agent_id: error.agent_id.into_string(),
            details: error.details.map(Value::Object),
        }
    }
}
