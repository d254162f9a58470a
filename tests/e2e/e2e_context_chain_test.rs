//! End-to-end tests: shared context threaded through a chain of agents

use a2a_rt::memory::{InMemoryBroker, InMemoryRegistry};
use a2a_rt::protocol::{Constraint, ConstraintType};
use a2a_rt::{
    AgentConfig, AgentContext, AgentRegistry, AgentType, BaseAgent, MessageBroker,
    MessageHandler, SharedContext, define_intents,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

define_intents! {
    enum HopIntent {
        Hop => "hop",
        FanOut => "fan_out",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HopRequest {
    visited: Vec<String>,
}

/// Records a decision, then forwards to `next` if there is one.
struct Hop {
    next: Option<AgentType>,
}

#[async_trait]
impl MessageHandler for Hop {
    type Request = HopRequest;
    type Response = HopRequest;

    async fn handle(&self, mut request: HopRequest, ctx: AgentContext) -> anyhow::Result<HopRequest> {
        let me = ctx.agent().agent_type.to_string();
        ctx.record_decision(format!("{} saw the request", me), 0.9, "chain step");
        ctx.set_fact(format!("trace:{}", me), json!(ctx.trace().trace_id.as_str()));
        request.visited.push(me);

        match self.next {
            Some(next) => Ok(ctx.send_request(next, "hop", &request).await?),
            None => Ok(request),
        }
    }
}

/// Asks two peers in parallel and folds both branches back in.
struct FanOut;

#[async_trait]
impl MessageHandler for FanOut {
    type Request = HopRequest;
    type Response = Vec<HopRequest>;

    async fn handle(&self, request: HopRequest, ctx: AgentContext) -> anyhow::Result<Vec<HopRequest>> {
        ctx.add_constraint(Constraint::new(
            ConstraintType::Budget,
            "maxMonthly",
            json!(50),
            "coordinator",
        ));
        let (left, right) = tokio::join!(
            ctx.send_request::<_, HopRequest>(AgentType::Compliance, "hop", &request),
            ctx.send_request::<_, HopRequest>(AgentType::Quoting, "hop", &request),
        );
        Ok(vec![left?, right?])
    }
}

struct Network {
    broker: Arc<InMemoryBroker>,
    registry: Arc<InMemoryRegistry>,
}

impl Network {
    fn new() -> Self {
        Self {
            broker: Arc::new(InMemoryBroker::new()),
            registry: Arc::new(InMemoryRegistry::new()),
        }
    }

    async fn join(&self, agent: BaseAgent<HopIntent>) -> Arc<BaseAgent<HopIntent>> {
        let agent = Arc::new(agent);
        let broker: Arc<dyn MessageBroker> = self.broker.clone();
        let registry: Arc<dyn AgentRegistry> = self.registry.clone();
        agent.start(broker, registry).await.expect("agent should start");
        agent
    }

    async fn hop(&self, agent_type: AgentType, next: Option<AgentType>) -> Arc<BaseAgent<HopIntent>> {
        let mut agent = BaseAgent::new(config(agent_type)).expect("agent");
        agent.register_handler(HopIntent::Hop, Hop { next });
        agent.register_handler(HopIntent::FanOut, FanOut);
        self.join(agent).await
    }
}

fn config(agent_type: AgentType) -> AgentConfig {
    AgentConfig::new(agent_type, "1.0.0", format!("http://localhost/{}", agent_type))
        .with_timeout_ms(2_000)
}

#[tokio::test]
async fn test_decisions_accumulate_along_chain() {
    let network = Network::new();
    let _agents = vec![
        network.hop(AgentType::Coordinator, Some(AgentType::Compliance)).await,
        network.hop(AgentType::Compliance, Some(AgentType::Personalization)).await,
        network.hop(AgentType::Personalization, Some(AgentType::Quoting)).await,
        network.hop(AgentType::Quoting, None).await,
    ];
    let client = network.hop(AgentType::CustomerData, None).await;

    let mut context = SharedContext::new_session().with_customer("cust-9");
    let session = context.session_id.clone();
    let result: HopRequest = client
        .send_request_in_context(
            AgentType::Coordinator,
            "hop",
            HopRequest { visited: Vec::new() },
            &mut context,
            None,
        )
        .await
        .expect("chain result");

    let expected = ["coordinator", "compliance", "personalization", "quoting"];
    assert_eq!(result.visited, expected);
    let decisions: Vec<String> = context
        .decisions()
        .iter()
        .map(|decision| decision.decision.clone())
        .collect();
    assert_eq!(
        decisions,
        expected
            .iter()
            .map(|agent| format!("{} saw the request", agent))
            .collect::<Vec<_>>()
    );
    assert_eq!(context.session_id, session);
    assert_eq!(context.customer_id.as_deref(), Some("cust-9"));
}

#[tokio::test]
async fn test_chain_shares_one_trace() {
    let network = Network::new();
    let _agents = vec![
        network.hop(AgentType::Coordinator, Some(AgentType::Compliance)).await,
        network.hop(AgentType::Compliance, Some(AgentType::Quoting)).await,
        network.hop(AgentType::Quoting, None).await,
    ];
    let client = network.hop(AgentType::CustomerData, None).await;

    let mut context = SharedContext::new_session();
    let _: HopRequest = client
        .send_request_in_context(
            AgentType::Coordinator,
            "hop",
            HopRequest { visited: Vec::new() },
            &mut context,
            None,
        )
        .await
        .expect("chain result");

    let traces: Vec<_> = ["coordinator", "compliance", "quoting"]
        .iter()
        .map(|agent| context.fact(&format!("trace:{}", agent)).cloned())
        .collect();
    assert!(traces.iter().all(Option::is_some));
    assert!(traces.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn test_parallel_branches_merge_into_working_context() {
    let network = Network::new();
    let _agents = vec![
        network.hop(AgentType::Coordinator, None).await,
        network.hop(AgentType::Compliance, None).await,
        network.hop(AgentType::Quoting, None).await,
    ];
    let client = network.hop(AgentType::CustomerData, None).await;

    let mut context = SharedContext::new_session();
    let branches: Vec<HopRequest> = client
        .send_request_in_context(
            AgentType::Coordinator,
            "fan_out",
            HopRequest { visited: Vec::new() },
            &mut context,
            None,
        )
        .await
        .expect("fan out result");

    assert_eq!(branches.len(), 2);
    assert_eq!(branches[0].visited, vec!["compliance".to_string()]);
    assert_eq!(branches[1].visited, vec!["quoting".to_string()]);

    let mut deciders: Vec<&str> = context
        .decisions()
        .iter()
        .map(|decision| decision.decision.as_str())
        .collect();
    deciders.sort_unstable();
    assert_eq!(
        deciders,
        vec!["compliance saw the request", "quoting saw the request"]
    );
    assert!(context.fact("trace:compliance").is_some());
    assert!(context.fact("trace:quoting").is_some());
    assert_eq!(context.constraints_named("maxMonthly").count(), 1);
}
