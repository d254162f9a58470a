//! Agent runtime for A2A participants.
//!
//! A [`BaseAgent`] turns a table of typed intent handlers into a running
//! member of the network: it registers with an [`AgentRegistry`], subscribes
//! to a [`MessageBroker`], dispatches inbound requests and answers every one
//! of them with exactly one response or error envelope.

pub mod agent;
pub mod agents;
pub mod config;
pub mod context;
pub mod handlers;
pub mod lifecycle;
pub mod ports;
pub mod response;

pub use agent::{AgentHooks, BaseAgent, NoopHooks};
pub use config::AgentConfig;
pub use context::AgentContext;
pub use handlers::{FnHandler, HandlerTable, Intent, MessageHandler, handler_fn};
pub use lifecycle::Lifecycle;
pub use ports::{AgentRegistry, InboundHandler, MessageBroker};
pub use response::{EnvelopeFormatter, ResponseFormatter};
