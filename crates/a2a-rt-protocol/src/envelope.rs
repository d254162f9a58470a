//! The message envelope every inter-agent communication travels in.

use crate::a2a_error::A2aError;
use crate::identity::AgentIdentity;
use crate::shared_context::SharedContext;
use a2a_rt_core::ids::{ConversationId, CorrelationId, MessageId, SpanId, TraceId};
use a2a_rt_core::{A2aRtError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Request,
    Response,
    Event,
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Request => "request",
            MessageType::Response => "response",
            MessageType::Event => "event",
            MessageType::Error => "error",
        }
    }

    /// Responses and errors close a correlation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MessageType::Response | MessageType::Error)
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// Distributed tracing coordinates carried by an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceContext {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<SpanId>,
    pub sampled: bool,
}

impl TraceContext {
    /// Start a new trace.
    pub fn new_root() -> Self {
        Self {
            trace_id: TraceId::generate(),
            span_id: SpanId::generate(),
            parent_span_id: None,
            sampled: true,
        }
    }

    /// Open a span below this one in the same trace.
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: SpanId::generate(),
            parent_span_id: Some(self.span_id.clone()),
            sampled: self.sampled,
        }
    }
}

/// One A2A envelope. `T` is the opaque payload; on the wire it is JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct A2aMessage<T = Value> {
    // Header
    pub message_id: MessageId,
    pub correlation_id: CorrelationId,
    pub timestamp: DateTime<Utc>,

    // Routing
    pub from: AgentIdentity,
    pub to: AgentIdentity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,

    // Payload
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub intent: String,
    pub content: T,

    // Context
    pub conversation_id: ConversationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_message_id: Option<MessageId>,
    pub context: SharedContext,

    // Metadata
    pub priority: Priority,
    /// Milliseconds the sender waits for a terminal reply.
    pub ttl: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace: Option<TraceContext>,
}

impl<T> A2aMessage<T> {
    pub fn is_terminal(&self) -> bool {
        self.message_type.is_terminal()
    }
}

impl A2aMessage<Value> {
    /// Decode the JSON payload into a concrete type.
    pub fn decode_content<R: DeserializeOwned>(&self) -> Result<R> {
        serde_json::from_value(self.content.clone()).map_err(|err| {
            A2aRtError::InvalidMessage(format!(
                "Content of '{}' does not match the expected shape: {}",
                self.intent, err
            ))
        })
    }

    /// The error payload of an `error` envelope.
    pub fn error_payload(&self) -> Option<A2aError> {
        if self.message_type != MessageType::Error {
            return None;
        }
        serde_json::from_value(self.content.clone()).ok()
    }
}
