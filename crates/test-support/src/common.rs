//! Common test fixtures.

pub use crate::support::broker::{RecordingBroker, Responder};
pub use crate::support::registry::{RecordingRegistry, RegistryCall};

use a2a_rt_core::ids::{ConversationId, CorrelationId, MessageId};
use a2a_rt_protocol::{
    A2aMessage, AgentCard, AgentIdentity, AgentStatus, AgentType, AuthConfig, AuthType,
    MessageType, PROTOCOL_VERSION, Priority, RateLimitConfig, SharedContext, SlaConfig,
    TraceContext,
};
use chrono::Utc;
use serde_json::Value;

/// Deterministic identity for an agent type: id `{type}-test`.
pub fn identity(agent_type: AgentType) -> AgentIdentity {
    AgentIdentity {
        agent_id: format!("{}-test", agent_type).into(),
        agent_type,
        version: "1.0.0".to_string(),
        endpoint: format!("http://localhost/{}", agent_type),
        capabilities: Vec::new(),
    }
}

/// Request from the coordinator to the intent analyst.
pub fn request_envelope(intent: &str, content: Value) -> A2aMessage {
    envelope_between(
        identity(AgentType::Coordinator),
        identity(AgentType::IntentAnalyst),
        intent,
        content,
    )
}

pub fn envelope_between(
    from: AgentIdentity,
    to: AgentIdentity,
    intent: &str,
    content: Value,
) -> A2aMessage {
    let context = SharedContext::new_session();
    A2aMessage {
        message_id: MessageId::generate(),
        correlation_id: CorrelationId::generate(),
        timestamp: Utc::now(),
        from,
        to,
        reply_to: None,
        message_type: MessageType::Request,
        intent: intent.to_string(),
        content,
        conversation_id: ConversationId::from(context.session_id.clone()),
        parent_message_id: None,
        context,
        priority: Priority::Normal,
        ttl: 30_000,
        trace: Some(TraceContext::new_root()),
    }
}

/// Terminal envelope answering `request`, sent by its recipient.
pub fn reply_to(request: &A2aMessage, message_type: MessageType, content: Value) -> A2aMessage {
    A2aMessage {
        message_id: MessageId::generate(),
        correlation_id: request.correlation_id.clone(),
        timestamp: Utc::now(),
        from: request.to.clone(),
        to: request.from.clone(),
        reply_to: None,
        message_type,
        intent: request.intent.clone(),
        content,
        conversation_id: request.conversation_id.clone(),
        parent_message_id: Some(request.message_id.clone()),
        context: request.context.clone(),
        priority: request.priority,
        ttl: request.ttl,
        trace: request.trace.clone(),
    }
}

pub fn agent_card(agent_id: &str, agent_type: AgentType, status: AgentStatus) -> AgentCard {
    AgentCard {
        agent_id: agent_id.into(),
        agent_type,
        name: agent_type.to_string(),
        description: format!("{} agent", agent_type),
        version: "1.0.0".to_string(),
        capabilities: Vec::new(),
        protocols: vec![PROTOCOL_VERSION.to_string()],
        endpoint: format!("http://localhost/{}", agent_id),
        authentication: AuthConfig {
            auth_type: AuthType::Mtls,
            token_url: None,
            scopes: None,
        },
        rate_limit: RateLimitConfig {
            requests_per_minute: 100,
            max_concurrent: 10,
            burst_limit: None,
        },
        sla: SlaConfig {
            max_latency_ms: 5_000,
            availability: 99.9,
            error_budget: None,
        },
        health_endpoint: format!("http://localhost/{}/health", agent_id),
        status,
    }
}
