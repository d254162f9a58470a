//! Intent analyst: classifies what a customer is asking for.
//!
//! The language understanding itself sits behind [`IntentAnalyzer`], which
//! returns the model's raw JSON. This module only normalizes that output into
//! the protocol payloads and records the classification in the shared context.

use crate::agent::{AgentHooks, BaseAgent};
use crate::config::AgentConfig;
use crate::context::AgentContext;
use crate::handlers::MessageHandler;
use a2a_rt_core::Result;
use a2a_rt_protocol::{AgentIdentity, AgentType};
use a2a_rt_protocol::payloads::{
    AnalyzeIntentRequest, AnalyzeIntentResponse, Entity, MergeIntentsRequest,
    MergeIntentsResponse, Sentiment,
};
use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

crate::define_intents! {
    /// Intents served by the intent analyst.
    pub enum IntentAnalystIntent {
        AnalyzeIntent => "analyze_intent",
        MergeIntents => "merge_intents",
    }
}

pub const ENDPOINT_ENV_VAR: &str = "INTENT_ANALYST_ENDPOINT";
pub const DEFAULT_ENDPOINT: &str = "http://localhost:3001";
pub const VERSION: &str = "2.0.0";
pub const CAPABILITIES: [&str; 4] = [
    "intent_classification",
    "entity_extraction",
    "sentiment_analysis",
    "multi_turn_context",
];
pub const VALID_PRODUCT_TYPES: [&str; 6] =
    ["broadband", "mobile", "tv", "landline", "security", "bundle"];

const MAX_TAGS: usize = 10;
const MAX_ENTITIES: usize = 20;
const DEFAULT_CONFIDENCE: f64 = 0.5;
const DEFAULT_REASONING: &str = "No reasoning provided";

/// Natural-language backend of the intent analyst.
///
/// Both methods return the analysis object as produced by the model, e.g.
/// `{"tags": [...], "entities": [...], "productTypes": [...], "sentiment": "...",
/// "confidence": 0.8, "reasoning": "..."}`. Missing or malformed fields are
/// tolerated.
#[async_trait]
pub trait IntentAnalyzer: Send + Sync + 'static {
    async fn analyze(&self, request: &AnalyzeIntentRequest) -> anyhow::Result<Value>;

    /// Fold several intents of one conversation into a single analysis.
    async fn merge(&self, intents: &[String]) -> anyhow::Result<Value>;
}

pub fn default_config() -> AgentConfig {
    AgentConfig::new(AgentType::IntentAnalyst, VERSION, DEFAULT_ENDPOINT)
        .with_capabilities(CAPABILITIES)
        .with_endpoint_from_env(ENDPOINT_ENV_VAR)
        .with_max_concurrent(20)
        .with_timeout_ms(5_000)
}

/// Build an intent analyst with both intents bound to `analyzer`.
pub fn create_intent_analyst_agent(
    analyzer: Arc<dyn IntentAnalyzer>,
    config: AgentConfig,
) -> Result<BaseAgent<IntentAnalystIntent>> {
    let mut agent = BaseAgent::new(config)?.with_hooks(IntentAnalystHooks);
    agent.register_handler(
        IntentAnalystIntent::AnalyzeIntent,
        AnalyzeIntentHandler {
            analyzer: Arc::clone(&analyzer),
        },
    );
    agent.register_handler(IntentAnalystIntent::MergeIntents, MergeIntentsHandler { analyzer });
    Ok(agent)
}

struct IntentAnalystHooks;

#[async_trait]
impl AgentHooks for IntentAnalystHooks {
    async fn on_start(&self, agent: &AgentIdentity) -> anyhow::Result<()> {
        info!(agent_id = %agent.agent_id, "Intent Analyst Agent initialized");
        Ok(())
    }

    async fn on_stop(&self, agent: &AgentIdentity) -> anyhow::Result<()> {
        info!(agent_id = %agent.agent_id, "Intent Analyst Agent stopping");
        Ok(())
    }
}

struct AnalyzeIntentHandler {
    analyzer: Arc<dyn IntentAnalyzer>,
}

#[async_trait]
impl MessageHandler for AnalyzeIntentHandler {
    type Request = AnalyzeIntentRequest;
    type Response = AnalyzeIntentResponse;

    async fn handle(
        &self,
        request: AnalyzeIntentRequest,
        ctx: AgentContext,
    ) -> anyhow::Result<AnalyzeIntentResponse> {
        info!(
            agent_id = %ctx.agent().agent_id,
            text_length = request.text.len(),
            language = ?request.language,
            has_previous_context = request
                .previous_intents
                .as_ref()
                .is_some_and(|intents| !intents.is_empty()),
            "Analyzing customer intent"
        );

        let raw = self.analyzer.analyze(&request).await?;
        let Some(result) = normalize_analysis(&raw) else {
            error!(response = %raw, "Failed to parse intent analysis");
            return Err(anyhow!("Failed to parse intent analysis response"));
        };

        ctx.record_decision(
            format!("Classified intent with tags: {}", result.tags.join(", ")),
            result.confidence,
            result.reasoning.clone(),
        );

        info!(
            agent_id = %ctx.agent().agent_id,
            tags = ?result.tags,
            confidence = result.confidence,
            "Intent analysis complete"
        );
        Ok(result)
    }
}

struct MergeIntentsHandler {
    analyzer: Arc<dyn IntentAnalyzer>,
}

#[async_trait]
impl MessageHandler for MergeIntentsHandler {
    type Request = MergeIntentsRequest;
    type Response = MergeIntentsResponse;

    async fn handle(
        &self,
        request: MergeIntentsRequest,
        _ctx: AgentContext,
    ) -> anyhow::Result<MergeIntentsResponse> {
        let raw = self.analyzer.merge(&request.intents).await?;
        let merged = normalize_analysis(&raw)
            .ok_or_else(|| anyhow!("Failed to parse merged intent analysis"))?;
        Ok(MergeIntentsResponse { merged })
    }
}

/// `None` when the analysis is not a JSON object.
pub fn normalize_analysis(raw: &Value) -> Option<AnalyzeIntentResponse> {
    let analysis = raw.as_object()?;
    Some(AnalyzeIntentResponse {
        tags: validate_tags(analysis.get("tags")),
        entities: validate_entities(analysis.get("entities")),
        product_types: validate_product_types(analysis.get("productTypes")),
        sentiment: validate_sentiment(analysis.get("sentiment")),
        confidence: validate_confidence(analysis.get("confidence")),
        reasoning: analysis
            .get("reasoning")
            .and_then(Value::as_str)
            .filter(|reasoning| !reasoning.is_empty())
            .unwrap_or(DEFAULT_REASONING)
            .to_string(),
    })
}

fn validate_tags(tags: Option<&Value>) -> Vec<String> {
    let Some(tags) = tags.and_then(Value::as_array) else {
        return Vec::new();
    };
    tags.iter()
        .filter_map(Value::as_str)
        .take(MAX_TAGS)
        .map(str::to_string)
        .collect()
}

fn validate_entities(entities: Option<&Value>) -> Vec<Entity> {
    let Some(entities) = entities.and_then(Value::as_array) else {
        return Vec::new();
    };
    entities
        .iter()
        .filter_map(|entity| {
            let entity_type = entity.get("type")?.as_str()?;
            let value = entity.get("value")?.as_str()?;
            Some(Entity {
                entity_type: entity_type.to_string(),
                value: value.to_string(),
                confidence: entity
                    .get("confidence")
                    .and_then(Value::as_f64)
                    .unwrap_or(DEFAULT_CONFIDENCE),
            })
        })
        .take(MAX_ENTITIES)
        .collect()
}

fn validate_product_types(types: Option<&Value>) -> Vec<String> {
    let Some(types) = types.and_then(Value::as_array) else {
        return Vec::new();
    };
    types
        .iter()
        .filter_map(Value::as_str)
        .filter(|kind| VALID_PRODUCT_TYPES.contains(kind))
        .map(str::to_string)
        .collect()
}

fn validate_sentiment(sentiment: Option<&Value>) -> Sentiment {
    match sentiment.and_then(Value::as_str) {
        Some("positive") => Sentiment::Positive,
        Some("negative") => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}

fn validate_confidence(confidence: Option<&Value>) -> f64 {
    confidence
        .and_then(Value::as_f64)
        .filter(|value| (0.0..=1.0).contains(value))
        .unwrap_or(DEFAULT_CONFIDENCE)
}
