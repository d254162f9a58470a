//! Tests for the error code taxonomy

use a2a_rt::core::ids::AgentId;
use a2a_rt::protocol::A2aError;
use a2a_rt::{A2aRtError, ErrorCode, is_retryable};

#[test]
fn test_retryable_table() {
    let retryable: Vec<ErrorCode> = ErrorCode::ALL
        .into_iter()
        .filter(|code| is_retryable(*code))
        .collect();

    assert_eq!(
        retryable,
        vec![
            ErrorCode::AgentUnavailable,
            ErrorCode::Timeout,
            ErrorCode::RateLimited
        ]
    );
}

#[test]
fn test_error_payload_derives_retryable_from_code() {
    for code in ErrorCode::ALL {
        let error = A2aError::new(code, "failure", AgentId::from("compliance-1"));
        assert_eq!(error.retryable, code.is_retryable(), "code {}", code);
    }
}

#[test]
fn test_error_payload_wire_shape() {
    let error = A2aError::new(
        ErrorCode::CapabilityNotFound,
        "Unknown intent: quote",
        AgentId::from("intent-analyst-1"),
    );
    let json = serde_json::to_value(&error).expect("serialize");

    assert_eq!(json["code"], "CAPABILITY_NOT_FOUND");
    assert_eq!(json["message"], "Unknown intent: quote");
    assert_eq!(json["agentId"], "intent-analyst-1");
    assert_eq!(json["retryable"], false);
    assert!(json.get("timestamp").is_some());
    assert!(json.get("details").is_none());
}

#[test]
fn test_runtime_errors_carry_codes() {
    let cases = [
        (A2aRtError::AgentUnavailable("negotiation".into()), ErrorCode::AgentUnavailable),
        (A2aRtError::Timeout { ttl_ms: 100 }, ErrorCode::Timeout),
        (A2aRtError::InvalidMessage("bad".into()), ErrorCode::InvalidMessage),
        (A2aRtError::NotStarted, ErrorCode::InternalError),
        (A2aRtError::Hook("boom".into()), ErrorCode::InternalError),
    ];

    for (error, code) in cases {
        assert_eq!(error.code(), code, "{}", error);
    }
}

#[test]
fn test_remote_error_keeps_sender_code() {
    let payload = A2aError::new(
        ErrorCode::ConsensusFailed,
        "no quorum",
        AgentId::from("coordinator-1"),
    );
    let error = A2aRtError::from(payload);

    assert_eq!(error.code(), ErrorCode::ConsensusFailed);
    assert!(!error.is_retryable());
    assert!(error.to_string().contains("coordinator-1"));
}
