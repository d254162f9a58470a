//! A2A runtime core types and shared utilities.

pub mod correlation;
pub mod error;
pub mod ids;

pub use error::{A2aRtError, ErrorCode, Result, is_retryable};
pub use ids::{AgentId, ConversationId, CorrelationId, MessageId, SessionId, SpanId, TraceId};
