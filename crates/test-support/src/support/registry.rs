//! Registry double that records calls and can be told to fail.

use a2a_rt_agent::ports::AgentRegistry;
use a2a_rt_core::ids::AgentId;
use a2a_rt_core::{A2aRtError, Result};
use a2a_rt_protocol::{AgentCard, AgentStatus, AgentType};
use async_trait::async_trait;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryCall {
    Register { agent_id: AgentId, status: AgentStatus },
    Deregister(AgentId),
}

type Callback = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct RecordingRegistry {
    cards: Mutex<Vec<AgentCard>>,
    calls: Mutex<Vec<RegistryCall>>,
    on_deregister: Mutex<Option<Callback>>,
    fail_register: bool,
    fail_deregister: bool,
    yield_on_register: bool,
}

impl RecordingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a card, e.g. a peer that `find_agent` should resolve.
    pub fn with_card(self, card: AgentCard) -> Self {
        self.cards.lock().unwrap().push(card);
        self
    }

    pub fn failing_register(mut self) -> Self {
        self.fail_register = true;
        self
    }

    pub fn failing_deregister(mut self) -> Self {
        self.fail_deregister = true;
        self
    }

    /// Yield to the runtime before each `register`, so concurrent callers
    /// interleave.
    pub fn yielding_register(mut self) -> Self {
        self.yield_on_register = true;
        self
    }

    /// Run `callback` at the moment `deregister` is called.
    pub fn on_deregister(&self, callback: impl Fn() + Send + Sync + 'static) {
        *self.on_deregister.lock().unwrap() = Some(Box::new(callback));
    }

    pub fn calls(&self) -> Vec<RegistryCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn card(&self, agent_id: &AgentId) -> Option<AgentCard> {
        self.cards
            .lock()
            .unwrap()
            .iter()
            .find(|card| &card.agent_id == agent_id)
            .cloned()
    }
}

#[async_trait]
impl AgentRegistry for RecordingRegistry {
    async fn register(&self, card: AgentCard) -> Result<()> {
        if self.yield_on_register {
            tokio::task::yield_now().await;
        }
        self.calls.lock().unwrap().push(RegistryCall::Register {
            agent_id: card.agent_id.clone(),
            status: card.status,
        });
        if self.fail_register {
            return Err(A2aRtError::Registry("register refused".to_string()));
        }
        let mut cards = self.cards.lock().unwrap();
        match cards.iter_mut().find(|existing| existing.agent_id == card.agent_id) {
            Some(existing) => *existing = card,
            None => cards.push(card),
        }
        Ok(())
    }

    async fn deregister(&self, agent_id: &AgentId) -> Result<()> {
        if let Some(callback) = self.on_deregister.lock().unwrap().as_ref() {
            callback();
        }
        self.calls
            .lock()
            .unwrap()
            .push(RegistryCall::Deregister(agent_id.clone()));
        if self.fail_deregister {
            return Err(A2aRtError::Registry("deregister refused".to_string()));
        }
        self.cards
            .lock()
            .unwrap()
            .retain(|card| &card.agent_id != agent_id);
        Ok(())
    }

    async fn find_agent(&self, agent_type: AgentType) -> Result<Option<AgentCard>> {
        Ok(self
            .cards
            .lock()
            .unwrap()
            .iter()
            .find(|card| card.agent_type == agent_type && card.status != AgentStatus::Unhealthy)
            .cloned())
    }

    async fn find_agents_by_capability(&self, capability: &str) -> Result<Vec<AgentCard>> {
        Ok(self
            .cards
            .lock()
            .unwrap()
            .iter()
            .filter(|card| card.has_capability(capability))
            .cloned()
            .collect())
    }

    async fn get_healthy_agents(&self) -> Result<Vec<AgentCard>> {
        Ok(self
            .cards
            .lock()
            .unwrap()
            .iter()
            .filter(|card| card.status == AgentStatus::Healthy)
            .cloned()
            .collect())
    }
}
