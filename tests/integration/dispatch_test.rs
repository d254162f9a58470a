//! Integration tests for inbound request dispatch

#[path = "../common.rs"]
mod common;

use a2a_rt::agent::agents::intent_analyst::{IntentAnalyzer, create_intent_analyst_agent};
use a2a_rt::protocol::payloads::{AnalyzeIntentRequest, AnalyzeIntentResponse};
use a2a_rt::protocol::{AgentType, MessageType};
use a2a_rt::{A2aError, AgentContext, BaseAgent, ErrorCode, define_intents, handler_fn};
use anyhow::anyhow;
use async_trait::async_trait;
use common::{RecordingBroker, RecordingRegistry, request_envelope, start, terminals, test_config};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct FixedAnalyzer;

#[async_trait]
impl IntentAnalyzer for FixedAnalyzer {
    async fn analyze(&self, _request: &AnalyzeIntentRequest) -> anyhow::Result<Value> {
        Ok(json!({
            "tags": ["upgrade"],
            "entities": [],
            "productTypes": ["broadband"],
            "sentiment": "positive",
            "confidence": 0.8,
            "reasoning": "asks for faster speeds"
        }))
    }

    async fn merge(&self, _intents: &[String]) -> anyhow::Result<Value> {
        Err(anyhow!("parse failure"))
    }
}

async fn analyst() -> (
    Arc<BaseAgent<a2a_rt::agent::agents::intent_analyst::IntentAnalystIntent>>,
    Arc<RecordingBroker>,
) {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());
    let agent = create_intent_analyst_agent(
        Arc::new(FixedAnalyzer),
        test_config(AgentType::IntentAnalyst),
    )
    .expect("agent");
    (start(agent, &broker, &registry).await, broker)
}

fn error_of(reply: &a2a_rt::A2aMessage) -> A2aError {
    reply.error_payload().expect("error payload")
}

#[tokio::test]
async fn test_success_reply_echoes_request() {
    let (agent, broker) = analyst().await;
    let request = request_envelope("analyze_intent", json!({"text": "faster internet please"}));

    agent.handle_message(request.clone()).await;

    let replies = terminals(&broker);
    assert_eq!(replies.len(), 1);
    let reply = &replies[0];
    assert_eq!(reply.message_type, MessageType::Response);
    assert_eq!(reply.correlation_id, request.correlation_id);
    assert_eq!(reply.parent_message_id.as_ref(), Some(&request.message_id));
    assert_eq!(reply.conversation_id, request.conversation_id);
    assert_eq!(reply.to, request.from);
    assert_eq!(&reply.from.agent_id, agent.id());
    assert_eq!(reply.intent, "analyze_intent");

    let analysis: AnalyzeIntentResponse = reply.decode_content().expect("analysis");
    assert_eq!(analysis.tags, vec!["upgrade".to_string()]);
    assert_eq!(analysis.product_types, vec!["broadband".to_string()]);
}

#[tokio::test]
async fn test_handler_decisions_travel_in_reply_context() {
    let (agent, broker) = analyst().await;
    let request = request_envelope("analyze_intent", json!({"text": "faster internet please"}));

    agent.handle_message(request).await;

    let reply = terminals(&broker).remove(0);
    let decisions = reply.context.decisions();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].decision, "Classified intent with tags: upgrade");
    assert_eq!(&decisions[0].agent_id, agent.id());
}

#[tokio::test]
async fn test_unknown_intent_yields_capability_not_found() {
    let (agent, broker) = analyst().await;
    let request = request_envelope("generate_quote", json!({}));

    agent.handle_message(request.clone()).await;

    let replies = terminals(&broker);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].message_type, MessageType::Error);
    assert_eq!(replies[0].correlation_id, request.correlation_id);
    let error = error_of(&replies[0]);
    assert_eq!(error.code, ErrorCode::CapabilityNotFound);
    assert_eq!(error.message, "Unknown intent: generate_quote");
    assert!(!error.retryable);
}

#[tokio::test]
async fn test_handler_error_yields_internal_error() {
    let (agent, broker) = analyst().await;
    let request = request_envelope("merge_intents", json!({"intents": ["a", "b"]}));

    agent.handle_message(request).await;

    let replies = terminals(&broker);
    assert_eq!(replies.len(), 1);
    let error = error_of(&replies[0]);
    assert_eq!(error.code, ErrorCode::InternalError);
    assert_eq!(error.message, "parse failure");
    assert!(!error.retryable);
    assert_eq!(&error.agent_id, agent.id());
}

#[tokio::test]
async fn test_undecodable_content_yields_invalid_message() {
    let (agent, broker) = analyst().await;
    let request = request_envelope("analyze_intent", json!({"words": 4}));

    agent.handle_message(request).await;

    let replies = terminals(&broker);
    assert_eq!(replies.len(), 1);
    assert_eq!(error_of(&replies[0]).code, ErrorCode::InvalidMessage);
}

#[tokio::test]
async fn test_each_request_gets_exactly_one_reply() {
    let (agent, broker) = analyst().await;
    let requests = vec![
        request_envelope("analyze_intent", json!({"text": "one"})),
        request_envelope("merge_intents", json!({"intents": []})),
        request_envelope("nope", json!({})),
        request_envelope("analyze_intent", json!(null)),
    ];

    for request in &requests {
        agent.handle_message(request.clone()).await;
    }

    let replies = terminals(&broker);
    assert_eq!(replies.len(), requests.len());
    for (request, reply) in requests.iter().zip(&replies) {
        assert_eq!(reply.correlation_id, request.correlation_id);
    }
}

#[tokio::test]
async fn test_terminal_envelopes_are_not_dispatched() {
    let (agent, broker) = analyst().await;
    let mut stray = request_envelope("analyze_intent", json!({"text": "late"}));
    stray.message_type = MessageType::Response;

    agent.handle_message(stray).await;

    assert!(broker.sent().is_empty());
}

define_intents! {
    enum NotifyIntent {
        OfferExpired => "offer_expired",
    }
}

#[tokio::test]
async fn test_events_run_without_reply() {
    let broker = Arc::new(RecordingBroker::new());
    let registry = Arc::new(RecordingRegistry::new());
    let seen = Arc::new(AtomicUsize::new(0));

    let mut agent: BaseAgent<NotifyIntent> =
        BaseAgent::new(test_config(AgentType::Negotiation)).expect("agent");
    let counter = Arc::clone(&seen);
    agent.register_handler(
        NotifyIntent::OfferExpired,
        handler_fn(move |_event: Value, _ctx: AgentContext| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(json!({"ignored": true}))
            }
        }),
    );
    let agent = start(agent, &broker, &registry).await;

    let mut event = request_envelope("offer_expired", json!({"offerId": "o-1"}));
    event.message_type = MessageType::Event;
    agent.handle_message(event).await;

    assert_eq!(seen.load(Ordering::SeqCst), 1);
    assert!(terminals(&broker).is_empty());
}

#[tokio::test]
async fn test_messages_arrive_through_subscription() {
    let (agent, broker) = analyst().await;
    assert!(broker.is_subscribed(agent.id()));

    broker
        .deliver(request_envelope("analyze_intent", json!({"text": "hello"})))
        .await;

    assert_eq!(terminals(&broker).len(), 1);
}
