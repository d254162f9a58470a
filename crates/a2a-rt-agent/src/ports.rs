//! Transport and discovery seams of the runtime.
//!
//! The agent only talks to the outside world through these traits. The
//! `a2a-rt-memory` crate provides in-process implementations; a networked
//! broker or a service registry plugs in the same way.

use a2a_rt_core::Result;
use a2a_rt_core::ids::AgentId;
use a2a_rt_protocol::{A2aMessage, AgentCard, AgentEvent, AgentType};
use async_trait::async_trait;
use std::sync::Arc;

/// Receives envelopes delivered to a subscribed agent.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn on_message(&self, message: A2aMessage);
}

#[async_trait]
pub trait MessageBroker: Send + Sync {
    /// Deliver envelopes addressed to `agent_id` to `handler`.
    async fn subscribe(&self, agent_id: &AgentId, handler: Arc<dyn InboundHandler>) -> Result<()>;

    /// Fire-and-forget delivery. Used for replies and events.
    async fn send(&self, message: A2aMessage) -> Result<()>;

    /// Deliver a request and wait up to its `ttl` for the terminal envelope
    /// carrying the same correlation id.
    async fn request(&self, message: A2aMessage) -> Result<A2aMessage>;

    async fn publish(&self, topic: &str, event: AgentEvent) -> Result<()>;
}

#[async_trait]
pub trait AgentRegistry: Send + Sync {
    /// Insert or replace the card for `card.agent_id`.
    async fn register(&self, card: AgentCard) -> Result<()>;

    async fn deregister(&self, agent_id: &AgentId) -> Result<()>;

    /// Pick one routable agent of the given type, if any.
    async fn find_agent(&self, agent_type: AgentType) -> Result<Option<AgentCard>>;

    async fn find_agents_by_capability(&self, capability: &str) -> Result<Vec<AgentCard>>;

    async fn get_healthy_agents(&self) -> Result<Vec<AgentCard>>;
}
