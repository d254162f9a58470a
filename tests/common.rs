//! Common test utilities shared by the root test suites.
#![allow(dead_code, unused_imports)]

use a2a_rt::protocol::{A2aMessage, AgentCard, AgentStatus, AgentType};
use a2a_rt::{AgentConfig, AgentRegistry, BaseAgent, Intent, MessageBroker};
use std::sync::Arc;
use test_support::common::agent_card;

pub use test_support::common::{
    RecordingBroker, RecordingRegistry, RegistryCall, envelope_between, identity, reply_to,
    request_envelope,
};

/// Config with a fixed id so envelopes can be addressed without a lookup.
pub fn test_config(agent_type: AgentType) -> AgentConfig {
    AgentConfig::new(agent_type, "1.0.0", format!("http://localhost/{}", agent_type))
        .with_agent_id(format!("{}-test", agent_type))
}

/// A healthy card for a peer the agent under test can discover.
pub fn peer_card(agent_type: AgentType) -> AgentCard {
    agent_card(&format!("{}-peer", agent_type), agent_type, AgentStatus::Healthy)
}

pub async fn start<I: Intent>(
    agent: BaseAgent<I>,
    broker: &Arc<RecordingBroker>,
    registry: &Arc<RecordingRegistry>,
) -> Arc<BaseAgent<I>> {
    let agent = Arc::new(agent);
    let broker: Arc<dyn MessageBroker> = broker.clone();
    let registry: Arc<dyn AgentRegistry> = registry.clone();
    agent
        .start(broker, registry)
        .await
        .expect("agent should start");
    agent
}

/// Terminal envelopes sent through the broker, in order.
pub fn terminals(broker: &RecordingBroker) -> Vec<A2aMessage> {
    broker
        .sent()
        .into_iter()
        .filter(|message| message.is_terminal())
        .collect()
}
