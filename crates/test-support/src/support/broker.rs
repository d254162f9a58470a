//! Broker double that records traffic instead of delivering it.

use a2a_rt_agent::ports::{InboundHandler, MessageBroker};
use a2a_rt_core::ids::AgentId;
use a2a_rt_core::{A2aRtError, Result};
use a2a_rt_protocol::{A2aMessage, AgentEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Produces the terminal envelope for an awaited request.
pub type Responder = Box<dyn Fn(&A2aMessage) -> Result<A2aMessage> + Send + Sync>;

/// Records `send`, `request` and `publish` calls. `request` answers through
/// the configured [`Responder`], or fails with a broker error when none is
/// set. Subscribed handlers can be driven with [`RecordingBroker::deliver`].
#[derive(Default)]
pub struct RecordingBroker {
    sent: Mutex<Vec<A2aMessage>>,
    requests: Mutex<Vec<A2aMessage>>,
    published: Mutex<Vec<(String, AgentEvent)>>,
    subscribers: Mutex<HashMap<AgentId, Arc<dyn InboundHandler>>>,
    request_calls: AtomicUsize,
    responder: Option<Responder>,
    fail_subscribe: bool,
    fail_publish: bool,
}

impl RecordingBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responder(
        mut self,
        responder: impl Fn(&A2aMessage) -> Result<A2aMessage> + Send + Sync + 'static,
    ) -> Self {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn failing_subscribe(mut self) -> Self {
        self.fail_subscribe = true;
        self
    }

    pub fn failing_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    pub fn sent(&self) -> Vec<A2aMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn requests(&self) -> Vec<A2aMessage> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_calls(&self) -> usize {
        self.request_calls.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<(String, AgentEvent)> {
        self.published.lock().unwrap().clone()
    }

    pub fn is_subscribed(&self, agent_id: &AgentId) -> bool {
        self.subscribers.lock().unwrap().contains_key(agent_id)
    }

    /// Hand `message` to the handler subscribed under `message.to`.
    pub async fn deliver(&self, message: A2aMessage) {
        let handler = self
            .subscribers
            .lock()
            .unwrap()
            .get(&message.to.agent_id)
            .cloned()
            .expect("no subscriber for message recipient");
        handler.on_message(message).await;
    }
}

#[async_trait]
impl MessageBroker for RecordingBroker {
    async fn subscribe(&self, agent_id: &AgentId, handler: Arc<dyn InboundHandler>) -> Result<()> {
        if self.fail_subscribe {
            return Err(A2aRtError::Broker("subscribe refused".to_string()));
        }
        self.subscribers
            .lock()
            .unwrap()
            .insert(agent_id.clone(), handler);
        Ok(())
    }

    async fn send(&self, message: A2aMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn request(&self, message: A2aMessage) -> Result<A2aMessage> {
        self.request_calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(message.clone());
        match &self.responder {
            Some(responder) => responder(&message),
            None => Err(A2aRtError::Broker("no responder configured".to_string())),
        }
    }

    async fn publish(&self, topic: &str, event: AgentEvent) -> Result<()> {
        if self.fail_publish {
            return Err(A2aRtError::Broker("publish refused".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), event));
        Ok(())
    }
}
