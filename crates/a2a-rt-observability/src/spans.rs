//! Span helpers for the agent runtime.
//!
//! All span names use the `a2a_rt.` namespace prefix for low cardinality.

use a2a_rt_core::correlation::current_correlation_id;
use tracing::Span;

fn correlation_field() -> String {
    current_correlation_id()
        .map(|id| id.into_string())
        .unwrap_or_else(|| "none".to_string())
}

/// Span for dispatching one inbound envelope to its handler.
///
/// Entered inside the correlation scope of the inbound message.
#[inline]
pub fn handle_message(agent_id: &str, intent: &str, message_type: &str) -> Span {
    tracing::info_span!(
        "a2a_rt.handle_message",
        agent_id = agent_id,
        intent = intent,
        message_type = message_type,
        correlation_id = correlation_field(),
    )
}

/// Span for an outbound request awaiting its correlated reply.
#[inline]
pub fn send_request(agent_id: &str, to_agent_type: &str, intent: &str, correlation_id: &str) -> Span {
    tracing::debug_span!(
        "a2a_rt.send_request",
        agent_id = agent_id,
        to = to_agent_type,
        intent = intent,
        correlation_id = correlation_id,
    )
}

/// Span covering registration, subscription and the setup hook.
#[inline]
pub fn agent_start(agent_id: &str, agent_type: &str) -> Span {
    tracing::info_span!(
        "a2a_rt.agent_start",
        agent_id = agent_id,
        agent_type = agent_type,
    )
}

/// Span covering the teardown hook and deregistration.
#[inline]
pub fn agent_stop(agent_id: &str) -> Span {
    tracing::info_span!("a2a_rt.agent_stop", agent_id = agent_id)
}
