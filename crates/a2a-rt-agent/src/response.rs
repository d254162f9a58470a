//! Building terminal envelopes for an inbound request.

use a2a_rt_core::ids::MessageId;
use a2a_rt_protocol::{
    A2aError, A2aMessage, AgentIdentity, MessageType, Priority, SharedContext,
};
use chrono::Utc;
use serde_json::{Value, json};

/// Shapes the single terminal envelope sent back for every request.
pub trait ResponseFormatter: Send + Sync {
    fn format_response(
        &self,
        from: &AgentIdentity,
        request: &A2aMessage,
        content: Value,
        context: SharedContext,
    ) -> A2aMessage;

    fn format_error(
        &self,
        from: &AgentIdentity,
        request: &A2aMessage,
        context: SharedContext,
        error: A2aError,
    ) -> A2aMessage;
}

/// Replies that echo the request's correlation, conversation, ttl and trace
/// and point back at the request through `parent_message_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvelopeFormatter;

impl ResponseFormatter for EnvelopeFormatter {
    fn format_response(
        &self,
        from: &AgentIdentity,
        request: &A2aMessage,
        content: Value,
        context: SharedContext,
    ) -> A2aMessage {
        reply(
            from,
            request,
            MessageType::Response,
            content,
            context,
            request.priority,
        )
    }

    fn format_error(
        &self,
        from: &AgentIdentity,
        request: &A2aMessage,
        context: SharedContext,
        error: A2aError,
    ) -> A2aMessage {
        let content = serde_json::to_value(&error).unwrap_or_else(|_| {
            json!({
                "code": error.code,
                "message": error.message,
                "agentId": error.agent_id,
                "timestamp": error.timestamp,
                "retryable": error.retryable,
            })
        });
        reply(
            from,
            request,
            MessageType::Error,
            content,
            context,
            Priority::High,
        )
    }
}

fn reply(
    from: &AgentIdentity,
    request: &A2aMessage,
    message_type: MessageType,
    content: Value,
    context: SharedContext,
    priority: Priority,
) -> A2aMessage {
    A2aMessage {
        message_id: MessageId::generate(),
        correlation_id: request.correlation_id.clone(),
        timestamp: Utc::now(),
        from: from.clone(),
        to: request.from.clone(),
        reply_to: None,
        message_type,
        intent: request.intent.clone(),
        content,
        conversation_id: request.conversation_id.clone(),
        parent_message_id: Some(request.message_id.clone()),
        context,
        priority,
        ttl: request.ttl,
        trace: request.trace.clone(),
    }
}
