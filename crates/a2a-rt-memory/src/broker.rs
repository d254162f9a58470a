//! Broker that delivers envelopes between agents living in the same process.

use a2a_rt_agent::ports::{InboundHandler, MessageBroker};
use a2a_rt_core::ids::{AgentId, CorrelationId};
use a2a_rt_core::{A2aRtError, Result};
use a2a_rt_protocol::{A2aMessage, AgentEvent, MessageType};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, Semaphore, broadcast, oneshot};
use tracing::{Instrument, debug, warn};

/// Handlers each subscriber may run at once, unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENT: usize = 10;
/// Published events kept for inspection, unless configured otherwise.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 1024;
const EVENT_CHANNEL_CAPACITY: usize = 256;

type PendingMap = HashMap<CorrelationId, oneshot::Sender<A2aMessage>>;

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub topic: String,
    pub event: AgentEvent,
}

/// Removes its correlation id from the pending map when dropped, so a
/// request abandoned by its caller does not linger.
struct PendingRequest<'a> {
    pending: &'a Mutex<PendingMap>,
    correlation_id: CorrelationId,
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.correlation_id);
    }
}

struct Subscription {
    handler: Arc<dyn InboundHandler>,
    permits: Arc<Semaphore>,
}

/// Routes requests and events to the subscriber named in `to.agent_id` and
/// resolves terminal envelopes against pending requests by correlation id.
///
/// Every delivery runs on its own task, bounded per subscriber by a
/// semaphore. A terminal envelope with no waiting requester (already
/// answered, timed out or abandoned) is dropped. Only the most recent
/// published events are kept in the inspection log.
pub struct InMemoryBroker {
    subscriptions: RwLock<HashMap<AgentId, Subscription>>,
    pending: Mutex<PendingMap>,
    published: Mutex<VecDeque<PublishedEvent>>,
    event_log_capacity: usize,
    events: broadcast::Sender<PublishedEvent>,
    max_concurrent: usize,
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBroker {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            published: Mutex::new(VecDeque::new()),
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
            events,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
        }
    }

    /// Applies to subscriptions made after the call.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Number of published events [`InMemoryBroker::published`] retains.
    pub fn with_event_log_capacity(mut self, capacity: usize) -> Self {
        self.event_log_capacity = capacity.max(1);
        self
    }

    /// Live feed of published events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<PublishedEvent> {
        self.events.subscribe()
    }

    /// Most recent published events, oldest first.
    pub async fn published(&self) -> Vec<PublishedEvent> {
        self.event_log().iter().cloned().collect()
    }

    pub async fn published_on(&self, topic: &str) -> Vec<AgentEvent> {
        self.event_log()
            .iter()
            .filter(|published| published.topic == topic)
            .map(|published| published.event.clone())
            .collect()
    }

    /// Returns whether the agent had a subscription.
    pub async fn unsubscribe(&self, agent_id: &AgentId) -> bool {
        self.subscriptions.write().await.remove(agent_id).is_some()
    }

    pub async fn is_subscribed(&self, agent_id: &AgentId) -> bool {
        self.subscriptions.read().await.contains_key(agent_id)
    }

    /// Requests still waiting for their terminal envelope.
    pub async fn pending_requests(&self) -> usize {
        self.pending_map().len()
    }

    fn pending_map(&self) -> MutexGuard<'_, PendingMap> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn event_log(&self) -> MutexGuard<'_, VecDeque<PublishedEvent>> {
        self.published.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, reply: A2aMessage) {
        let waiter = self.pending_map().remove(&reply.correlation_id);
        match waiter {
            Some(waiter) => {
                if waiter.send(reply).is_err() {
                    debug!("Requester stopped waiting before the reply arrived");
                }
            }
            None => debug!(
                correlation_id = %reply.correlation_id,
                message_type = reply.message_type.as_str(),
                "Dropping terminal envelope with no pending request"
            ),
        }
    }

    async fn deliver(&self, message: A2aMessage) -> Result<()> {
        let target = {
            let subscriptions = self.subscriptions.read().await;
            subscriptions
                .get(&message.to.agent_id)
                .map(|sub| (Arc::clone(&sub.handler), Arc::clone(&sub.permits)))
        };
        let Some((handler, permits)) = target else {
            return Err(A2aRtError::Broker(format!(
                "No subscriber for agent {}",
                message.to.agent_id
            )));
        };

        tokio::spawn(
            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                handler.on_message(message).await;
            }
            .in_current_span(),
        );
        Ok(())
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    async fn subscribe(&self, agent_id: &AgentId, handler: Arc<dyn InboundHandler>) -> Result<()> {
        let subscription = Subscription {
            handler,
            permits: Arc::new(Semaphore::new(self.max_concurrent)),
        };
        let previous = self
            .subscriptions
            .write()
            .await
            .insert(agent_id.clone(), subscription);
        if previous.is_some() {
            debug!(agent_id = %agent_id, "Replaced existing subscription");
        }
        Ok(())
    }

    async fn send(&self, message: A2aMessage) -> Result<()> {
        if message.is_terminal() {
            self.resolve(message);
            return Ok(());
        }
        self.deliver(message).await
    }

    async fn request(&self, message: A2aMessage) -> Result<A2aMessage> {
        if message.message_type != MessageType::Request {
            return Err(A2aRtError::InvalidMessage(format!(
                "Cannot await a reply to a '{}' envelope",
                message.message_type.as_str()
            )));
        }

        let correlation_id = message.correlation_id.clone();
        let ttl_ms = message.ttl;
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending_map();
            if pending.contains_key(&correlation_id) {
                return Err(A2aRtError::InvalidMessage(format!(
                    "Correlation id {} is already awaiting a reply",
                    correlation_id
                )));
            }
            pending.insert(correlation_id.clone(), tx);
        }
        let _guard = PendingRequest {
            pending: &self.pending,
            correlation_id: correlation_id.clone(),
        };

        self.deliver(message).await?;

        match tokio::time::timeout(Duration::from_millis(ttl_ms), rx).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(A2aRtError::Broker(
                "Pending request was dropped without a reply".to_string(),
            )),
            Err(_) => {
                warn!(correlation_id = %correlation_id, ttl_ms, "Request timed out");
                Err(A2aRtError::Timeout { ttl_ms })
            }
        }
    }

    async fn publish(&self, topic: &str, event: AgentEvent) -> Result<()> {
        let published = PublishedEvent {
            topic: topic.to_string(),
            event,
        };
        {
            let mut log = self.event_log();
            if log.len() >= self.event_log_capacity {
                log.pop_front();
            }
            log.push_back(published.clone());
        }
        // No live receivers is fine; the log above keeps the event.
        let _ = self.events.send(published);
        Ok(())
    }
}
