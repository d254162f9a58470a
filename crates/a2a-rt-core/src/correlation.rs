//! Correlation ID propagation for async handler flows.
//!
//! The runtime scopes every handler invocation with the correlation id of the
//! inbound message, so spans and log lines emitted from inside a handler can
//! be tied back to the request being answered.

use crate::ids::CorrelationId;

tokio::task_local! {
    static CORRELATION_ID: CorrelationId;
}

pub fn generate_correlation_id() -> CorrelationId {
    CorrelationId::generate()
}

pub fn current_correlation_id() -> Option<CorrelationId> {
    CORRELATION_ID.try_with(|id| id.clone()).ok()
}

pub async fn with_correlation_id<F, T>(id: CorrelationId, fut: F) -> T
where
    F: std::future::Future<Output = T>,
{
    CORRELATION_ID.scope(id, fut).await
}
