use a2a_rt_core::{A2aRtError, AgentId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed set of agent roles in the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AgentType {
    Coordinator,
    IntentAnalyst,
    Personalization,
    Compliance,
    Negotiation,
    CustomerData,
    ProductCatalog,
    KnowledgeGraph,
    Quoting,
}

impl AgentType {
    pub const ALL: [AgentType; 9] = [
        AgentType::Coordinator,
        AgentType::IntentAnalyst,
        AgentType::Personalization,
        AgentType::Compliance,
        AgentType::Negotiation,
        AgentType::CustomerData,
        AgentType::ProductCatalog,
        AgentType::KnowledgeGraph,
        AgentType::Quoting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Coordinator => "coordinator",
            AgentType::IntentAnalyst => "intent-analyst",
            AgentType::Personalization => "personalization",
            AgentType::Compliance => "compliance",
            AgentType::Negotiation => "negotiation",
            AgentType::CustomerData => "customer-data",
            AgentType::ProductCatalog => "product-catalog",
            AgentType::KnowledgeGraph => "knowledge-graph",
            AgentType::Quoting => "quoting",
        }
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = A2aRtError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        AgentType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| A2aRtError::InvalidMessage(format!("Unknown agent type: {}", value)))
    }
}

/// Who an agent is and where it can be reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentIdentity {
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub version: String,
    pub endpoint: String,
    pub capabilities: Vec<String>,
}
