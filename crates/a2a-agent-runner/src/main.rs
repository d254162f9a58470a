//! A2A Agent Runner
//!
//! Starts an in-process agent network (coordinator plus intent analyst) on
//! the in-memory broker and registry, sends one request through it and prints
//! the outcome.

mod coordinator;
mod keyword_analyzer;

use a2a_rt_agent::agents::intent_analyst::{self, IntentAnalystIntent};
use a2a_rt_agent::ports::{AgentRegistry, MessageBroker};
use a2a_rt_agent::{BaseAgent, Intent, agents::create_intent_analyst_agent};
use a2a_rt_core::ids::SessionId;
use a2a_rt_memory::{InMemoryBroker, InMemoryRegistry};
use a2a_rt_observability::tracing_setup;
use a2a_rt_protocol::payloads::{AnalyzeIntentRequest, AnalyzeIntentResponse};
use a2a_rt_protocol::{AgentType, SharedContext};
use anyhow::Context;
use clap::{Parser, Subcommand};
use coordinator::{CoordinatorIntent, create_coordinator};
use keyword_analyzer::KeywordAnalyzer;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "a2a-agent-runner")]
#[command(about = "Run an in-process A2A agent network", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a customer message through the coordinator and intent analyst
    Analyze {
        /// Customer message
        text: String,

        /// Language hint passed to the analyst
        #[arg(short, long)]
        language: Option<String>,

        /// Earlier intent of this conversation (repeatable)
        #[arg(long = "previous-intent")]
        previous_intents: Vec<String>,

        /// Continue an existing session instead of starting a new one
        #[arg(long)]
        session_id: Option<String>,

        /// Request timeout in milliseconds
        #[arg(long, default_value_t = 30_000)]
        timeout_ms: u64,
    },
}

struct Network {
    coordinator: Arc<BaseAgent<CoordinatorIntent>>,
    analyst: Arc<BaseAgent<IntentAnalystIntent>>,
}

impl Network {
    async fn start(timeout_ms: u64) -> anyhow::Result<Self> {
        let broker: Arc<dyn MessageBroker> = Arc::new(InMemoryBroker::new());
        let registry: Arc<dyn AgentRegistry> = Arc::new(InMemoryRegistry::new());

        let analyst = Arc::new(create_intent_analyst_agent(
            Arc::new(KeywordAnalyzer),
            intent_analyst::default_config(),
        )?);
        analyst
            .start(Arc::clone(&broker), Arc::clone(&registry))
            .await
            .context("Failed to start intent analyst")?;

        let coordinator = Arc::new(create_coordinator(timeout_ms)?);
        coordinator
            .start(broker, registry)
            .await
            .context("Failed to start coordinator")?;

        Ok(Self {
            coordinator,
            analyst,
        })
    }

    async fn stop(&self) {
        self.coordinator.stop().await;
        self.analyst.stop().await;
    }
}

async fn analyze(
    text: String,
    language: Option<String>,
    previous_intents: Vec<String>,
    session_id: Option<String>,
    timeout_ms: u64,
) -> anyhow::Result<()> {
    let network = Network::start(timeout_ms).await?;

    let mut context = match session_id {
        Some(id) => SharedContext::new(SessionId::from(id)),
        None => SharedContext::new_session(),
    };
    let request = AnalyzeIntentRequest {
        text,
        language,
        previous_intents: (!previous_intents.is_empty()).then_some(previous_intents),
    };

    let result: a2a_rt_core::Result<AnalyzeIntentResponse> = network
        .coordinator
        .send_request_in_context(
            AgentType::Coordinator,
            CoordinatorIntent::ProcessIntent.as_str(),
            request,
            &mut context,
            None,
        )
        .await;
    network.stop().await;

    let analysis = result.context("Intent analysis failed")?;
    let output = json!({
        "sessionId": context.session_id,
        "analysis": analysis,
        "decisions": context.decisions(),
        "facts": context.facts(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    info!(session_id = %context.session_id, "Analysis complete");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_setup::init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze {
            text,
            language,
            previous_intents,
            session_id,
            timeout_ms,
        } => analyze(text, language, previous_intents, session_id, timeout_ms).await,
    }
}
