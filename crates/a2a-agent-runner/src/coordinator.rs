//! Coordinator that fronts the network for the runner.
//!
//! It forwards a customer message to the intent analyst through its handler
//! context, so the analyst's decisions flow back into the coordinator's
//! working context before the coordinator records its own.

use a2a_rt_agent::{AgentConfig, AgentContext, BaseAgent, define_intents, handler_fn};
use a2a_rt_core::Result;
use a2a_rt_protocol::AgentType;
use a2a_rt_protocol::payloads::{AnalyzeIntentRequest, AnalyzeIntentResponse};
use serde_json::json;
use tracing::info;

define_intents! {
    pub enum CoordinatorIntent {
        ProcessIntent => "process_intent",
    }
}

pub const DEFAULT_ENDPOINT: &str = "http://localhost:3000";

pub fn create_coordinator(timeout_ms: u64) -> Result<BaseAgent<CoordinatorIntent>> {
    let config = AgentConfig::new(
        AgentType::Coordinator,
        env!("CARGO_PKG_VERSION"),
        DEFAULT_ENDPOINT,
    )
    .with_capability("intent_orchestration")
    .with_timeout_ms(timeout_ms);

    let mut agent = BaseAgent::new(config)?;
    agent.register_handler(CoordinatorIntent::ProcessIntent, handler_fn(process_intent));
    Ok(agent)
}

async fn process_intent(
    request: AnalyzeIntentRequest,
    ctx: AgentContext,
) -> anyhow::Result<AnalyzeIntentResponse> {
    ctx.set_fact("lastCustomerMessage", json!(request.text));

    let analysis: AnalyzeIntentResponse = ctx
        .send_request(AgentType::IntentAnalyst, "analyze_intent", &request)
        .await?;

    let next_step = if analysis.product_types.is_empty() {
        "ask a clarifying question"
    } else {
        "gather offers"
    };
    ctx.record_decision(
        format!("Route conversation to {}", next_step),
        analysis.confidence,
        format!("Product types detected: {:?}", analysis.product_types),
    );
    info!(
        conversation_id = %ctx.conversation_id(),
        next_step,
        "Coordinator processed intent"
    );
    Ok(analysis)
}
