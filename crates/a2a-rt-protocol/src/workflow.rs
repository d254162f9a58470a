//! Workflow and consensus shapes.
//!
//! These travel as payloads and events only; nothing in the runtime executes
//! them.

use crate::identity::AgentType;
use a2a_rt_core::ids::AgentId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStep {
    pub agent: AgentType,
    pub action: String,
    pub timeout: u64,
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Box<WorkflowStep>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    All,
    Any,
    Majority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParallelStep {
    pub steps: Vec<WorkflowStep>,
    pub aggregation: Aggregation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorkflowStage {
    Parallel(ParallelStep),
    Step(WorkflowStep),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub steps: Vec<WorkflowStage>,
    pub timeout: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_handler: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusRequest {
    pub question: String,
    pub options: Vec<String>,
    pub voters: Vec<AgentType>,
    pub threshold: f64,
    pub timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusVote {
    pub agent_id: AgentId,
    pub choice: String,
    pub confidence: f64,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    pub achieved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winning_choice: Option<String>,
    pub votes: Vec<ConsensusVote>,
    pub agreement: f64,
}
