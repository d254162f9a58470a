//! Tests for the A2A envelope wire format

#[path = "../common.rs"]
mod common;

use a2a_rt::protocol::payloads::AnalyzeIntentRequest;
use a2a_rt::protocol::{MessageType, Priority, TraceContext};
use a2a_rt::{A2aMessage, ErrorCode};
use common::request_envelope;
use serde_json::json;

#[test]
fn test_envelope_serializes_camel_case() {
    let message = request_envelope("analyze_intent", json!({"text": "hi"}));
    let json = serde_json::to_value(&message).expect("serialize");

    for field in [
        "messageId",
        "correlationId",
        "timestamp",
        "from",
        "to",
        "type",
        "intent",
        "content",
        "conversationId",
        "context",
        "priority",
        "ttl",
        "trace",
    ] {
        assert!(json.get(field).is_some(), "missing field {}", field);
    }
    assert_eq!(json["type"], "request");
    assert_eq!(json["priority"], "normal");
    assert_eq!(json["from"]["agentType"], "coordinator");
    assert_eq!(json["context"]["sessionId"], json["conversationId"]);
    assert!(json.get("parentMessageId").is_none());
    assert!(json.get("replyTo").is_none());
}

#[test]
fn test_envelope_parses_from_wire() {
    let message = request_envelope("analyze_intent", json!({"text": "hi"}));
    let wire = serde_json::to_string(&message).expect("serialize");
    let parsed: A2aMessage = serde_json::from_str(&wire).expect("parse");

    assert_eq!(parsed, message);
    assert_eq!(parsed.message_type, MessageType::Request);
    assert!(!parsed.is_terminal());
}

#[test]
fn test_decode_content_into_payload() {
    let message = request_envelope(
        "analyze_intent",
        json!({"text": "cheaper broadband", "previousIntents": ["billing"]}),
    );
    let request: AnalyzeIntentRequest = message.decode_content().expect("decode");

    assert_eq!(request.text, "cheaper broadband");
    assert_eq!(request.language, None);
    assert_eq!(request.previous_intents, Some(vec!["billing".to_string()]));
}

#[test]
fn test_decode_content_mismatch_is_invalid_message() {
    let message = request_envelope("analyze_intent", json!({"words": 3}));
    let err = message
        .decode_content::<AnalyzeIntentRequest>()
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::InvalidMessage);
}

#[test]
fn test_child_trace_stays_in_trace() {
    let root = TraceContext::new_root();
    let child = root.child();

    assert_eq!(child.trace_id, root.trace_id);
    assert_eq!(child.parent_span_id.as_ref(), Some(&root.span_id));
    assert_ne!(child.span_id, root.span_id);
    assert_eq!(child.sampled, root.sampled);
}

#[test]
fn test_priority_ordering() {
    assert!(Priority::Critical > Priority::High);
    assert!(Priority::High > Priority::Normal);
    assert!(Priority::Normal > Priority::Low);
    assert_eq!(Priority::default(), Priority::Normal);
}

#[test]
fn test_error_payload_only_on_error_envelopes() {
    let request = request_envelope("analyze_intent", json!({"code": "TIMEOUT"}));
    assert!(request.error_payload().is_none());
}
