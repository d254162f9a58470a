//! Registry holding agent cards in memory.

use a2a_rt_agent::ports::AgentRegistry;
use a2a_rt_core::Result;
use a2a_rt_core::ids::AgentId;
use a2a_rt_protocol::{AgentCard, AgentStatus, AgentType};
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

/// Cards in first-registration order. Re-registering an agent replaces its
/// card in place.
#[derive(Debug, Default)]
pub struct RegistryStore {
    cards: Vec<AgentCard>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the card that was replaced, if any.
    pub fn upsert(&mut self, card: AgentCard) -> Option<AgentCard> {
        match self
            .cards
            .iter_mut()
            .find(|existing| existing.agent_id == card.agent_id)
        {
            Some(existing) => Some(std::mem::replace(existing, card)),
            None => {
                self.cards.push(card);
                None
            }
        }
    }

    pub fn remove(&mut self, agent_id: &AgentId) -> Option<AgentCard> {
        let index = self
            .cards
            .iter()
            .position(|card| &card.agent_id == agent_id)?;
        Some(self.cards.remove(index))
    }

    pub fn get(&self, agent_id: &AgentId) -> Option<&AgentCard> {
        self.cards.iter().find(|card| &card.agent_id == agent_id)
    }

    /// Best routable card of a type: healthy, then degraded, then unknown.
    /// Unhealthy agents are never returned.
    pub fn find(&self, agent_type: AgentType) -> Option<&AgentCard> {
        self.cards
            .iter()
            .filter(|card| card.agent_type == agent_type)
            .filter_map(|card| routing_rank(card.status).map(|rank| (rank, card)))
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, card)| card)
    }

    pub fn with_capability(&self, capability: &str) -> Vec<AgentCard> {
        self.cards
            .iter()
            .filter(|card| card.has_capability(capability))
            .cloned()
            .collect()
    }

    pub fn healthy(&self) -> Vec<AgentCard> {
        self.cards
            .iter()
            .filter(|card| card.status == AgentStatus::Healthy)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

fn routing_rank(status: AgentStatus) -> Option<u8> {
    match status {
        AgentStatus::Healthy => Some(0),
        AgentStatus::Degraded => Some(1),
        AgentStatus::Unknown => Some(2),
        AgentStatus::Unhealthy => None,
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    inner: RwLock<RegistryStore>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, agent_id: &AgentId) -> Option<AgentCard> {
        self.inner.read().await.get(agent_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl AgentRegistry for InMemoryRegistry {
    async fn register(&self, card: AgentCard) -> Result<()> {
        let agent_id = card.agent_id.clone();
        let status = card.status;
        let replaced = self.inner.write().await.upsert(card);
        debug!(
            agent_id = %agent_id,
            status = %status,
            replaced = replaced.is_some(),
            "Registered agent card"
        );
        Ok(())
    }

    async fn deregister(&self, agent_id: &AgentId) -> Result<()> {
        if self.inner.write().await.remove(agent_id).is_none() {
            debug!(agent_id = %agent_id, "Deregistering unknown agent");
        }
        Ok(())
    }

    async fn find_agent(&self, agent_type: AgentType) -> Result<Option<AgentCard>> {
        Ok(self.inner.read().await.find(agent_type).cloned())
    }

    async fn find_agents_by_capability(&self, capability: &str) -> Result<Vec<AgentCard>> {
        Ok(self.inner.read().await.with_capability(capability))
    }

    async fn get_healthy_agents(&self) -> Result<Vec<AgentCard>> {
        Ok(self.inner.read().await.healthy())
    }
}
