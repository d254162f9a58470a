//! Per-message handler context.

use a2a_rt_core::ids::{ConversationId, CorrelationId, MessageId, SessionId};
use a2a_rt_core::{A2aRtError, Result};
use a2a_rt_protocol::{
    A2aMessage, AgentIdentity, AgentType, Constraint, Decision, MergeReport, Priority,
    SharedContext, TraceContext,
};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Outbound side of the owning agent, as seen from a handler.
#[async_trait]
pub(crate) trait Outbound: Send + Sync {
    /// Returns the reply content and the context the reply carried.
    async fn request(
        &self,
        to: AgentType,
        intent: &str,
        content: Value,
        context: SharedContext,
        priority: Priority,
        trace: TraceContext,
    ) -> Result<(Value, SharedContext)>;
}

struct Detached;

#[async_trait]
impl Outbound for Detached {
    async fn request(
        &self,
        _to: AgentType,
        _intent: &str,
        _content: Value,
        _context: SharedContext,
        _priority: Priority,
        _trace: TraceContext,
    ) -> Result<(Value, SharedContext)> {
        Err(A2aRtError::NotStarted)
    }
}

struct Inbound {
    message_id: MessageId,
    correlation_id: CorrelationId,
    conversation_id: ConversationId,
    intent: String,
    sender: AgentIdentity,
    priority: Priority,
}

/// What a handler knows about the message it is answering, plus a working
/// copy of the shared context.
///
/// Clones share the same working copy. Whatever the handler appends is
/// carried on the reply envelope.
#[derive(Clone)]
pub struct AgentContext {
    agent: Arc<AgentIdentity>,
    inbound: Arc<Inbound>,
    trace: TraceContext,
    shared: Arc<Mutex<SharedContext>>,
    outbound: Arc<dyn Outbound>,
}

impl AgentContext {
    pub(crate) fn new(
        agent: Arc<AgentIdentity>,
        message: &A2aMessage,
        outbound: Arc<dyn Outbound>,
    ) -> Self {
        Self {
            agent,
            inbound: Arc::new(Inbound {
                message_id: message.message_id.clone(),
                correlation_id: message.correlation_id.clone(),
                conversation_id: message.conversation_id.clone(),
                intent: message.intent.clone(),
                sender: message.from.clone(),
                priority: message.priority,
            }),
            trace: message.trace.clone().unwrap_or_else(TraceContext::new_root),
            shared: Arc::new(Mutex::new(message.context.clone())),
            outbound,
        }
    }

    /// A context that is not attached to a running agent. Outbound requests
    /// fail with [`A2aRtError::NotStarted`].
    pub fn detached(agent: AgentIdentity, message: &A2aMessage) -> Self {
        Self::new(Arc::new(agent), message, Arc::new(Detached))
    }

    /// Identity of the agent running the handler.
    pub fn agent(&self) -> &AgentIdentity {
        &self.agent
    }

    pub fn sender(&self) -> &AgentIdentity {
        &self.inbound.sender
    }

    pub fn message_id(&self) -> &MessageId {
        &self.inbound.message_id
    }

    pub fn correlation_id(&self) -> &CorrelationId {
        &self.inbound.correlation_id
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.inbound.conversation_id
    }

    pub fn intent(&self) -> &str {
        &self.inbound.intent
    }

    pub fn priority(&self) -> Priority {
        self.inbound.priority
    }

    pub fn trace(&self) -> &TraceContext {
        &self.trace
    }

    fn shared(&self) -> MutexGuard<'_, SharedContext> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the working shared context.
    pub fn shared_context(&self) -> SharedContext {
        self.shared().clone()
    }

    pub fn session_id(&self) -> SessionId {
        self.shared().session_id.clone()
    }

    pub fn fact(&self, key: &str) -> Option<Value> {
        self.shared().fact(key).cloned()
    }

    /// Append a decision attributed to this agent.
    pub fn record_decision(
        &self,
        decision: impl Into<String>,
        confidence: f64,
        reasoning: impl Into<String>,
    ) {
        let decision = Decision::new(self.agent.agent_id.clone(), decision, confidence, reasoning);
        self.shared().record_decision(decision);
    }

    pub fn add_constraint(&self, constraint: Constraint) {
        self.shared().add_constraint(constraint);
    }

    /// Returns the previous value for `key`, if any.
    pub fn set_fact(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.shared().set_fact(key, value)
    }

    /// Fold a parallel branch's context into the working copy.
    pub fn merge_branch(&self, branch: SharedContext) -> MergeReport {
        self.shared().merge(branch)
    }

    /// Ask another agent for something on behalf of this message.
    ///
    /// The request carries the current working context and a child of this
    /// message's trace. Whatever the peer appended to the context is merged
    /// back into the working copy.
    pub async fn send_request<T, R>(&self, to: AgentType, intent: &str, content: T) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        self.send_request_with_priority(to, intent, content, Priority::Normal)
            .await
    }

    pub async fn send_request_with_priority<T, R>(
        &self,
        to: AgentType,
        intent: &str,
        content: T,
        priority: Priority,
    ) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let content = serde_json::to_value(content)?;
        let (reply, reply_context) = self
            .outbound
            .request(
                to,
                intent,
                content,
                self.shared_context(),
                priority,
                self.trace.child(),
            )
            .await?;
        self.merge_branch(reply_context);
        decode_reply(intent, reply)
    }
}

pub(crate) fn decode_reply<R: DeserializeOwned>(intent: &str, content: Value) -> Result<R> {
    serde_json::from_value(content).map_err(|err| {
        A2aRtError::InvalidMessage(format!(
            "Reply to '{}' does not match the expected shape: {}",
            intent, err
        ))
    })
}
