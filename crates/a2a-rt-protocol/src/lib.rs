//! A2A wire protocol: envelopes, shared context, discovery cards and the
//! payload shapes exchanged between specialized agents.

pub mod a2a_error;
pub mod agent_card;
pub mod envelope;
pub mod events;
pub mod identity;
pub mod payloads;
pub mod shared_context;
pub mod workflow;

pub use a2a_error::A2aError;
pub use agent_card::{AgentCard, AgentStatus, AuthConfig, AuthType, RateLimitConfig, SlaConfig};
pub use envelope::{A2aMessage, MessageType, Priority, TraceContext};
pub use events::AgentEvent;
pub use identity::{AgentIdentity, AgentType};
pub use shared_context::{Constraint, ConstraintType, Decision, MergeReport, SharedContext};

/// Protocol version advertised on every agent card.
pub const PROTOCOL_VERSION: &str = "a2a/1.0";
