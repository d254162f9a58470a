//! A2A Runtime
//!
//! Agent-to-agent messaging for a network of specialized agents: the wire
//! protocol, the agent runtime that dispatches and correlates envelopes, and
//! in-process transport and discovery.

pub use a2a_rt_agent as agent;
pub use a2a_rt_core as core;
pub use a2a_rt_observability as observability;
pub use a2a_rt_protocol as protocol;

#[cfg(feature = "memory")]
pub use a2a_rt_memory as memory;

pub use a2a_rt_agent::{
    AgentConfig, AgentContext, AgentHooks, AgentRegistry, BaseAgent, EnvelopeFormatter,
    InboundHandler, Intent, MessageBroker, MessageHandler, ResponseFormatter, define_intents,
    handler_fn,
};
pub use a2a_rt_core::{A2aRtError, ErrorCode, Result, is_retryable};
pub use a2a_rt_protocol::{
    A2aError, A2aMessage, AgentCard, AgentEvent, AgentIdentity, AgentStatus, AgentType,
    MessageType, Priority, SharedContext, TraceContext,
};
