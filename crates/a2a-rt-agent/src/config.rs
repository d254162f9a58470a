//! Static configuration of an agent instance.

use a2a_rt_core::ids::AgentId;
use a2a_rt_core::{A2aRtError, Result};
use a2a_rt_protocol::AgentType;
use serde::{Deserialize, Serialize};

/// Deadline for outbound requests when the config names none.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Advertised concurrency when the config names none.
pub const DEFAULT_MAX_CONCURRENT: u32 = 10;
/// Advertised SLA latency when no timeout is configured.
pub const DEFAULT_SLA_LATENCY_MS: u64 = 5_000;
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 100;
pub const DEFAULT_AVAILABILITY: f64 = 99.9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentConfig {
    /// Generated from the agent type when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<AgentId>,
    pub agent_type: AgentType,
    pub version: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_concurrent: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl AgentConfig {
    pub fn new(agent_type: AgentType, version: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            agent_id: None,
            agent_type,
            version: version.into(),
            capabilities: Vec::new(),
            endpoint: endpoint.into(),
            max_concurrent: None,
            timeout_ms: None,
        }
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities.extend(capabilities.into_iter().map(Into::into));
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: u32) -> Self {
        self.max_concurrent = Some(max_concurrent);
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Override the endpoint from an environment variable when it is set
    /// and non-empty.
    pub fn with_endpoint_from_env(mut self, var: &str) -> Self {
        if let Ok(endpoint) = std::env::var(var)
            && !endpoint.trim().is_empty()
        {
            self.endpoint = endpoint;
        }
        self
    }

    pub fn request_timeout_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)
    }

    pub fn max_concurrent_or_default(&self) -> u32 {
        self.max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT)
    }

    pub fn sla_latency_ms(&self) -> u64 {
        self.timeout_ms.unwrap_or(DEFAULT_SLA_LATENCY_MS)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(A2aRtError::Config("version must not be empty".to_string()));
        }
        if self.endpoint.trim().is_empty() {
            return Err(A2aRtError::Config("endpoint must not be empty".to_string()));
        }
        if let Some(agent_id) = &self.agent_id
            && agent_id.as_str().trim().is_empty()
        {
            return Err(A2aRtError::Config("agent id must not be empty".to_string()));
        }
        if self.timeout_ms == Some(0) {
            return Err(A2aRtError::Config("timeout must be positive".to_string()));
        }
        if self.max_concurrent == Some(0) {
            return Err(A2aRtError::Config("max concurrency must be positive".to_string()));
        }
        Ok(())
    }
}
