//! Broadcast notifications published through the broker.

use crate::a2a_error::A2aError;
use crate::agent_card::{AgentCard, AgentStatus};
use crate::workflow::{ConsensusRequest, ConsensusResult};
use a2a_rt_core::ids::{AgentId, ConversationId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const TOPIC_AGENT_LIFECYCLE: &str = "agent.lifecycle";
pub const TOPIC_AGENT_HEALTH: &str = "agent.health";
pub const TOPIC_WORKFLOW: &str = "workflow";
pub const TOPIC_CONSENSUS: &str = "consensus";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum AgentEvent {
    #[serde(rename = "agent.registered")]
    AgentRegistered(AgentCard),
    #[serde(rename = "agent.deregistered", rename_all = "camelCase")]
    AgentDeregistered { agent_id: AgentId },
    #[serde(rename = "agent.health.changed", rename_all = "camelCase")]
    HealthChanged {
        agent_id: AgentId,
        status: AgentStatus,
    },
    #[serde(rename = "workflow.started", rename_all = "camelCase")]
    WorkflowStarted {
        workflow_id: String,
        conversation_id: ConversationId,
    },
    #[serde(rename = "workflow.completed", rename_all = "camelCase")]
    WorkflowCompleted { workflow_id: String, result: Value },
    #[serde(rename = "workflow.failed", rename_all = "camelCase")]
    WorkflowFailed {
        workflow_id: String,
        error: A2aError,
    },
    #[serde(rename = "consensus.requested")]
    ConsensusRequested(ConsensusRequest),
    #[serde(rename = "consensus.completed")]
    ConsensusCompleted(ConsensusResult),
}

impl AgentEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AgentEvent::AgentRegistered(_) => "agent.registered",
            AgentEvent::AgentDeregistered { .. } => "agent.deregistered",
            AgentEvent::HealthChanged { .. } => "agent.health.changed",
            AgentEvent::WorkflowStarted { .. } => "workflow.started",
            AgentEvent::WorkflowCompleted { .. } => "workflow.completed",
            AgentEvent::WorkflowFailed { .. } => "workflow.failed",
            AgentEvent::ConsensusRequested(_) => "consensus.requested",
            AgentEvent::ConsensusCompleted(_) => "consensus.completed",
        }
    }
}
