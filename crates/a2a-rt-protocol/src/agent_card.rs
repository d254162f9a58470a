//! Discovery descriptor published to the registry.

use crate::identity::{AgentIdentity, AgentType};
use a2a_rt_core::ids::AgentId;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Healthy,
    Degraded,
    Unhealthy,
    #[default]
    Unknown,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Healthy => "healthy",
            AgentStatus::Degraded => "degraded",
            AgentStatus::Unhealthy => "unhealthy",
            AgentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthType {
    #[serde(rename = "oauth2")]
    OAuth2,
    #[serde(rename = "mtls")]
    Mtls,
    #[serde(rename = "api-key")]
    ApiKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    #[serde(rename = "type")]
    pub auth_type: AuthType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitConfig {
    pub requests_per_minute: u32,
    pub max_concurrent: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burst_limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlaConfig {
    pub max_latency_ms: u64,
    /// Availability target in percent.
    pub availability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCard {
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub name: String,
    pub description: String,
    pub version: String,
    pub capabilities: Vec<String>,
    pub protocols: Vec<String>,
    pub endpoint: String,
    pub authentication: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub sla: SlaConfig,
    pub health_endpoint: String,
    pub status: AgentStatus,
}

impl AgentCard {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Addressing information for envelopes sent to this agent.
    pub fn identity(&self) -> AgentIdentity {
        AgentIdentity {
            agent_id: self.agent_id.clone(),
            agent_type: self.agent_type,
            version: self.version.clone(),
            endpoint: self.endpoint.clone(),
            capabilities: self.capabilities.clone(),
        }
    }
}
