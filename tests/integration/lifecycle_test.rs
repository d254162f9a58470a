//! Integration tests for agent start, stop and health transitions

#[path = "../common.rs"]
mod common;

use a2a_rt::protocol::events::{TOPIC_AGENT_HEALTH, TOPIC_AGENT_LIFECYCLE};
use a2a_rt::{
    A2aRtError, AgentEvent, AgentHooks, AgentIdentity, AgentRegistry, AgentStatus, AgentType,
    BaseAgent, MessageBroker, define_intents,
};
use anyhow::anyhow;
use async_trait::async_trait;
use common::{RecordingBroker, RecordingRegistry, RegistryCall, start, test_config};
use std::sync::{Arc, Mutex};
use tracing_test::traced_test;

define_intents! {
    enum QuoteIntent {
        GenerateQuote => "generate_quote",
    }
}

fn quoting() -> BaseAgent<QuoteIntent> {
    BaseAgent::new(test_config(AgentType::Quoting)).expect("agent")
}

fn ports(
    broker: &Arc<RecordingBroker>,
    registry: &Arc<RecordingRegistry>,
) -> (Arc<dyn MessageBroker>, Arc<dyn AgentRegistry>) {
    (broker.clone(), registry.clone())
}

struct FailingStart;

#[async_trait]
impl AgentHooks for FailingStart {
    async fn on_start(&self, _agent: &AgentIdentity) -> anyhow::Result<()> {
        Err(anyhow!("catalog unreachable"))
    }
}

struct FailingStop;

#[async_trait]
impl AgentHooks for FailingStop {
    async fn on_stop(&self, _agent: &AgentIdentity) -> anyhow::Result<()> {
        Err(anyhow!("flush failed"))
    }
}

#[tokio::test]
async fn test_start_registers_healthy_and_announces() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());

    let agent = start(quoting(), &broker, &registry).await;

    assert_eq!(agent.status(), AgentStatus::Healthy);
    assert!(broker.is_subscribed(agent.id()));
    assert_eq!(
        registry.calls(),
        vec![
            RegistryCall::Register {
                agent_id: agent.id().clone(),
                status: AgentStatus::Unknown
            },
            RegistryCall::Register {
                agent_id: agent.id().clone(),
                status: AgentStatus::Healthy
            },
        ]
    );
    assert_eq!(
        registry.card(agent.id()).map(|card| card.status),
        Some(AgentStatus::Healthy)
    );

    let published = broker.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, TOPIC_AGENT_LIFECYCLE);
    assert!(matches!(
        &published[0].1,
        AgentEvent::AgentRegistered(card) if card.status == AgentStatus::Healthy
    ));
}

#[tokio::test]
async fn test_second_start_is_rejected() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());
    let agent = start(quoting(), &broker, &registry).await;

    let (b, r) = ports(&broker, &registry);
    let err = agent.start(b, r).await.unwrap_err();

    assert!(matches!(
        err,
        A2aRtError::InvalidTransition { from: "healthy", to: "healthy" }
    ));
    assert_eq!(agent.status(), AgentStatus::Healthy);
}

#[tokio::test]
async fn test_concurrent_starts_admit_exactly_one() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new().yielding_register());
    let agent = Arc::new(quoting());

    let (b1, r1) = ports(&broker, &registry);
    let (b2, r2) = ports(&broker, &registry);
    let (first, second) = tokio::join!(agent.start(b1, r1), agent.start(b2, r2));

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|outcome| outcome.is_ok()).count(), 1);
    assert!(outcomes.iter().any(|outcome| matches!(
        outcome,
        Err(A2aRtError::InvalidTransition { to: "healthy", .. })
    )));

    assert_eq!(agent.status(), AgentStatus::Healthy);
    assert!(broker.is_subscribed(agent.id()));
    assert!(
        !registry
            .calls()
            .iter()
            .any(|call| matches!(call, RegistryCall::Deregister(_)))
    );
    assert_eq!(
        registry.card(agent.id()).map(|card| card.status),
        Some(AgentStatus::Healthy)
    );
    let registered = broker
        .published()
        .iter()
        .filter(|(_, event)| matches!(event, AgentEvent::AgentRegistered(_)))
        .count();
    assert_eq!(registered, 1);
}

#[tokio::test]
async fn test_registration_failure_leaves_agent_unknown() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new().failing_register());
    let agent = Arc::new(quoting());

    let (b, r) = ports(&broker, &registry);
    let err = agent.start(b, r).await.unwrap_err();

    assert!(matches!(err, A2aRtError::Registry(_)));
    assert_eq!(agent.status(), AgentStatus::Unknown);
    assert!(!broker.is_subscribed(agent.id()));
}

#[tokio::test]
async fn test_subscribe_failure_rolls_back_registration() {
    let broker = Arc::new(RecordingBroker::new().failing_subscribe());
    let registry = Arc::new(RecordingRegistry::new());
    let agent = Arc::new(quoting());

    let (b, r) = ports(&broker, &registry);
    let err = agent.start(b, r).await.unwrap_err();

    assert!(matches!(err, A2aRtError::Broker(_)));
    assert_eq!(agent.status(), AgentStatus::Unknown);
    assert_eq!(
        registry.calls().last(),
        Some(&RegistryCall::Deregister(agent.id().clone()))
    );
    assert!(registry.card(agent.id()).is_none());
    assert!(broker.published().is_empty());
}

#[tokio::test]
async fn test_start_hook_failure_aborts_start() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());
    let agent = Arc::new(quoting().with_hooks(FailingStart));

    let (b, r) = ports(&broker, &registry);
    let err = agent.start(b, r).await.unwrap_err();

    assert!(matches!(err, A2aRtError::Hook(ref message) if message == "catalog unreachable"));
    assert_eq!(agent.status(), AgentStatus::Unknown);
    assert!(registry.card(agent.id()).is_none());
}

#[tokio::test]
async fn test_stop_reports_unhealthy_before_deregistering() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());
    let agent = start(quoting(), &broker, &registry).await;

    let observed = Arc::new(Mutex::new(None));
    let slot = Arc::clone(&observed);
    let watched = Arc::downgrade(&agent);
    registry.on_deregister(move || {
        *slot.lock().unwrap() = watched.upgrade().map(|agent| agent.status());
    });

    agent.stop().await;

    assert_eq!(*observed.lock().unwrap(), Some(AgentStatus::Unhealthy));
    assert_eq!(agent.status(), AgentStatus::Unhealthy);
    assert!(registry.card(agent.id()).is_none());
    assert!(broker.published().iter().any(|(topic, event)| {
        topic == TOPIC_AGENT_LIFECYCLE && matches!(event, AgentEvent::AgentDeregistered { .. })
    }));
}

#[tokio::test]
async fn test_second_stop_is_a_no_op() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());
    let agent = start(quoting(), &broker, &registry).await;

    agent.stop().await;
    agent.stop().await;

    assert_eq!(agent.status(), AgentStatus::Unhealthy);
    let deregisters = registry
        .calls()
        .iter()
        .filter(|call| matches!(call, RegistryCall::Deregister(_)))
        .count();
    assert_eq!(deregisters, 1);
    let announced = broker
        .published()
        .iter()
        .filter(|(_, event)| matches!(event, AgentEvent::AgentDeregistered { .. }))
        .count();
    assert_eq!(announced, 1);
}

#[tokio::test]
#[traced_test]
async fn test_stop_logs_deregistration_failure() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new().failing_deregister());
    let agent = start(quoting(), &broker, &registry).await;

    agent.stop().await;

    assert_eq!(agent.status(), AgentStatus::Unhealthy);
    assert!(logs_contain("Failed to deregister agent"));
    assert!(
        !broker
            .published()
            .iter()
            .any(|(_, event)| matches!(event, AgentEvent::AgentDeregistered { .. }))
    );
}

#[tokio::test]
#[traced_test]
async fn test_stop_hook_failure_does_not_block_deregistration() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());
    let agent = start(quoting().with_hooks(FailingStop), &broker, &registry).await;

    agent.stop().await;

    assert!(logs_contain("Agent stop hook failed"));
    assert_eq!(
        registry.calls().last(),
        Some(&RegistryCall::Deregister(agent.id().clone()))
    );
}

#[tokio::test]
async fn test_degrade_and_recover_refresh_card() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());
    let agent = start(quoting(), &broker, &registry).await;

    agent.set_degraded(true).await.expect("degrade");
    assert_eq!(agent.status(), AgentStatus::Degraded);
    assert_eq!(
        registry.card(agent.id()).map(|card| card.status),
        Some(AgentStatus::Degraded)
    );

    // Already degraded: nothing new is registered or published.
    let calls = registry.calls().len();
    agent.set_degraded(true).await.expect("degrade again");
    assert_eq!(registry.calls().len(), calls);

    agent.set_degraded(false).await.expect("recover");
    assert_eq!(
        registry.card(agent.id()).map(|card| card.status),
        Some(AgentStatus::Healthy)
    );

    let health: Vec<AgentStatus> = broker
        .published()
        .into_iter()
        .filter(|(topic, _)| topic == TOPIC_AGENT_HEALTH)
        .filter_map(|(_, event)| match event {
            AgentEvent::HealthChanged { status, .. } => Some(status),
            _ => None,
        })
        .collect();
    assert_eq!(health, vec![AgentStatus::Degraded, AgentStatus::Healthy]);
}

#[tokio::test]
async fn test_degrade_after_stop_is_rejected() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());
    let agent = start(quoting(), &broker, &registry).await;
    agent.stop().await;

    let err = agent.set_degraded(true).await.unwrap_err();
    assert!(matches!(err, A2aRtError::InvalidTransition { .. }));
}

#[tokio::test]
async fn test_publish_failure_does_not_fail_start() {
    let broker = Arc::new(RecordingBroker::new().failing_publish());
    let registry = Arc::new(RecordingRegistry::new());

    let agent = start(quoting(), &broker, &registry).await;

    assert_eq!(agent.status(), AgentStatus::Healthy);
}
