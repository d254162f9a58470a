//! The agent runtime: registration, dispatch and outbound requests.

use crate::config::{AgentConfig, DEFAULT_AVAILABILITY, DEFAULT_REQUESTS_PER_MINUTE};
use crate::context::{AgentContext, Outbound, decode_reply};
use crate::handlers::{DynHandler, HandlerFailure, HandlerTable, Intent, MessageHandler};
use crate::lifecycle::Lifecycle;
use crate::ports::{AgentRegistry, InboundHandler, MessageBroker};
use crate::response::{EnvelopeFormatter, ResponseFormatter};
use a2a_rt_core::correlation::{generate_correlation_id, with_correlation_id};
use a2a_rt_core::ids::{AgentId, ConversationId, CorrelationId, MessageId};
use a2a_rt_core::{A2aRtError, ErrorCode, Result};
use a2a_rt_observability::{metrics, spans};
use a2a_rt_protocol::events::{TOPIC_AGENT_HEALTH, TOPIC_AGENT_LIFECYCLE};
use a2a_rt_protocol::{
    A2aError, A2aMessage, AgentCard, AgentEvent, AgentIdentity, AgentStatus, AgentType,
    AuthConfig, AuthType, MessageType, PROTOCOL_VERSION, Priority, RateLimitConfig,
    SharedContext, SlaConfig, TraceContext,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use std::time::Instant;
use tracing::{Instrument, debug, error, info, warn};

/// Agent-specific setup and teardown run during [`BaseAgent::start`] and
/// [`BaseAgent::stop`].
#[async_trait]
pub trait AgentHooks: Send + Sync + 'static {
    /// Runs after subscription, before the agent reports healthy. An error
    /// aborts the start.
    async fn on_start(&self, _agent: &AgentIdentity) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs after the agent reports unhealthy, before deregistration. An
    /// error is logged and the stop continues.
    async fn on_stop(&self, _agent: &AgentIdentity) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl AgentHooks for NoopHooks {}

#[derive(Clone)]
struct Ports {
    broker: Arc<dyn MessageBroker>,
    registry: Arc<dyn AgentRegistry>,
}

/// A participant in the A2A network answering the intents in `I`.
///
/// Handlers are bound with [`register_handler`](Self::register_handler)
/// before the agent is shared behind an `Arc` and started.
pub struct BaseAgent<I: Intent> {
    identity: Arc<AgentIdentity>,
    config: AgentConfig,
    handlers: HandlerTable<I>,
    hooks: Arc<dyn AgentHooks>,
    formatter: Arc<dyn ResponseFormatter>,
    lifecycle: RwLock<Lifecycle>,
    ports: RwLock<Option<Ports>>,
}

impl<I: Intent> BaseAgent<I> {
    pub fn new(config: AgentConfig) -> Result<Self> {
        config.validate()?;
        let agent_id = config
            .agent_id
            .clone()
            .unwrap_or_else(|| AgentId::for_agent_type(config.agent_type.as_str()));
        let identity = AgentIdentity {
            agent_id,
            agent_type: config.agent_type,
            version: config.version.clone(),
            endpoint: config.endpoint.clone(),
            capabilities: config.capabilities.clone(),
        };

        Ok(Self {
            identity: Arc::new(identity),
            config,
            handlers: HandlerTable::new(),
            hooks: Arc::new(NoopHooks),
            formatter: Arc::new(EnvelopeFormatter),
            lifecycle: RwLock::new(Lifecycle::new()),
            ports: RwLock::new(None),
        })
    }

    pub fn with_hooks(mut self, hooks: impl AgentHooks) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn with_formatter(mut self, formatter: impl ResponseFormatter + 'static) -> Self {
        self.formatter = Arc::new(formatter);
        self
    }

    /// Bind `handler` to `intent`, replacing any earlier binding.
    pub fn register_handler<H: MessageHandler>(&mut self, intent: I, handler: H) {
        if self.handlers.register(intent, handler) {
            debug!(
                agent_id = %self.identity.agent_id,
                intent = intent.as_str(),
                "Replaced existing handler"
            );
        }
    }

    pub fn id(&self) -> &AgentId {
        &self.identity.agent_id
    }

    pub fn agent_type(&self) -> AgentType {
        self.identity.agent_type
    }

    pub fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn handlers(&self) -> &HandlerTable<I> {
        &self.handlers
    }

    pub fn status(&self) -> AgentStatus {
        self.lifecycle_read().status()
    }

    fn lifecycle_read(&self) -> RwLockReadGuard<'_, Lifecycle> {
        self.lifecycle.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn lifecycle_write(&self) -> RwLockWriteGuard<'_, Lifecycle> {
        self.lifecycle.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ports(&self) -> Option<Ports> {
        self.ports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_ports(&self, ports: Option<Ports>) {
        *self.ports.write().unwrap_or_else(PoisonError::into_inner) = ports;
    }

    /// Discovery card reflecting the current configuration and status.
    pub fn get_agent_card(&self) -> AgentCard {
        let identity = &self.identity;
        AgentCard {
            agent_id: identity.agent_id.clone(),
            agent_type: identity.agent_type,
            name: identity.agent_type.as_str().to_string(),
            description: format!("{} agent", identity.agent_type),
            version: identity.version.clone(),
            capabilities: identity.capabilities.clone(),
            protocols: vec![PROTOCOL_VERSION.to_string()],
            endpoint: identity.endpoint.clone(),
            authentication: AuthConfig {
                auth_type: AuthType::Mtls,
                token_url: None,
                scopes: None,
            },
            rate_limit: RateLimitConfig {
                requests_per_minute: DEFAULT_REQUESTS_PER_MINUTE,
                max_concurrent: self.config.max_concurrent_or_default(),
                burst_limit: None,
            },
            sla: SlaConfig {
                max_latency_ms: self.config.sla_latency_ms(),
                availability: DEFAULT_AVAILABILITY,
                error_budget: None,
            },
            health_endpoint: format!("{}/health", identity.endpoint),
            status: self.status(),
        }
    }

    /// Register, subscribe, run the setup hook and report healthy.
    ///
    /// On failure after registration the agent deregisters again and stays
    /// `unknown`.
    pub async fn start(
        self: &Arc<Self>,
        broker: Arc<dyn MessageBroker>,
        registry: Arc<dyn AgentRegistry>,
    ) -> Result<()> {
        let span = spans::agent_start(self.id().as_str(), self.agent_type().as_str());
        self.start_inner(broker, registry).instrument(span).await
    }

    async fn start_inner(
        self: &Arc<Self>,
        broker: Arc<dyn MessageBroker>,
        registry: Arc<dyn AgentRegistry>,
    ) -> Result<()> {
        self.lifecycle_write().begin_start()?;

        info!(
            agent_id = %self.id(),
            agent_type = %self.agent_type(),
            "Starting agent"
        );

        if let Err(err) = registry.register(self.get_agent_card()).await {
            self.lifecycle_write().abort_start();
            return Err(err);
        }
        self.set_ports(Some(Ports {
            broker: Arc::clone(&broker),
            registry: Arc::clone(&registry),
        }));

        let inbound: Arc<dyn InboundHandler> = Arc::new(Dispatcher {
            agent: Arc::downgrade(self),
        });
        if let Err(err) = broker.subscribe(self.id(), inbound).await {
            self.abort_start(registry.as_ref()).await;
            return Err(err);
        }

        if let Err(err) = self.hooks.on_start(&self.identity).await {
            self.abort_start(registry.as_ref()).await;
            return Err(A2aRtError::Hook(err.to_string()));
        }

        let transition = self.lifecycle_write().start();
        if let Err(err) = transition {
            self.abort_start(registry.as_ref()).await;
            return Err(err);
        }

        let card = self.get_agent_card();
        if let Err(err) = registry.register(card.clone()).await {
            warn!(agent_id = %self.id(), error = %err, "Failed to refresh agent card");
        }
        self.publish(TOPIC_AGENT_LIFECYCLE, AgentEvent::AgentRegistered(card))
            .await;

        info!(
            agent_id = %self.id(),
            capabilities = ?self.identity.capabilities,
            intents = self.handlers.len(),
            "Agent started"
        );
        Ok(())
    }

    async fn abort_start(&self, registry: &dyn AgentRegistry) {
        if let Err(err) = registry.deregister(self.id()).await {
            warn!(
                agent_id = %self.id(),
                error = %err,
                "Failed to deregister agent after aborted start"
            );
        }
        self.set_ports(None);
        self.lifecycle_write().abort_start();
    }

    /// Report unhealthy, run the teardown hook and deregister.
    ///
    /// Never fails; teardown and deregistration errors are logged.
    pub async fn stop(&self) {
        let span = spans::agent_stop(self.id().as_str());
        self.stop_inner().instrument(span).await
    }

    async fn stop_inner(&self) {
        let previous = self.lifecycle_write().stop();
        if previous == AgentStatus::Unhealthy {
            debug!(agent_id = %self.id(), "Agent already stopped");
            return;
        }
        info!(agent_id = %self.id(), previous = %previous, "Stopping agent");

        if let Err(err) = self.hooks.on_stop(&self.identity).await {
            warn!(agent_id = %self.id(), error = %err, "Agent stop hook failed");
        }

        let Some(ports) = self.ports() else {
            return;
        };
        match ports.registry.deregister(self.id()).await {
            Ok(()) => {
                self.publish(
                    TOPIC_AGENT_LIFECYCLE,
                    AgentEvent::AgentDeregistered {
                        agent_id: self.id().clone(),
                    },
                )
                .await;
            }
            Err(err) => {
                warn!(agent_id = %self.id(), error = %err, "Failed to deregister agent");
            }
        }
        info!(agent_id = %self.id(), "Agent stopped");
    }

    /// Move between `healthy` and `degraded`, refreshing the registered card.
    pub async fn set_degraded(&self, degraded: bool) -> Result<()> {
        let changed = {
            let mut lifecycle = self.lifecycle_write();
            if degraded {
                lifecycle.degrade()?
            } else {
                lifecycle.recover()?
            }
        };
        if !changed {
            return Ok(());
        }

        let status = self.status();
        warn!(agent_id = %self.id(), status = %status, "Agent health changed");

        if let Some(ports) = self.ports() {
            if let Err(err) = ports.registry.register(self.get_agent_card()).await {
                warn!(agent_id = %self.id(), error = %err, "Failed to refresh agent card");
            }
            self.publish(
                TOPIC_AGENT_HEALTH,
                AgentEvent::HealthChanged {
                    agent_id: self.id().clone(),
                    status,
                },
            )
            .await;
        }
        Ok(())
    }

    async fn publish(&self, topic: &str, event: AgentEvent) {
        let Some(ports) = self.ports() else {
            return;
        };
        let event_type = event.event_type();
        if let Err(err) = ports.broker.publish(topic, event).await {
            warn!(topic, event_type, error = %err, "Failed to publish event");
        }
    }

    /// Dispatch one inbound envelope inside its correlation scope.
    ///
    /// Requests always produce exactly one terminal envelope. Events run
    /// their handler without a reply.
    pub async fn handle_message(self: &Arc<Self>, message: A2aMessage) {
        let correlation_id = message.correlation_id.clone();
        with_correlation_id(correlation_id, self.dispatch(message)).await
    }

    async fn dispatch(self: &Arc<Self>, message: A2aMessage) {
        let span = spans::handle_message(
            self.id().as_str(),
            &message.intent,
            message.message_type.as_str(),
        );
        async move {
            match message.message_type {
                MessageType::Request => self.dispatch_request(message).await,
                MessageType::Event => self.dispatch_event(message).await,
                MessageType::Response | MessageType::Error => {
                    debug!(
                        message_id = %message.message_id,
                        "Ignoring terminal envelope delivered as inbound message"
                    );
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn dispatch_request(self: &Arc<Self>, message: A2aMessage) {
        let started = Instant::now();

        let Some((intent, handler)) = self.handlers.resolve(&message.intent) else {
            warn!(
                agent_id = %self.id(),
                intent = %message.intent,
                "No handler registered for intent"
            );
            metrics::record_message_handled(&message.intent, "unknown_intent", started.elapsed());
            let error = A2aError::new(
                ErrorCode::CapabilityNotFound,
                format!("Unknown intent: {}", message.intent),
                self.id().clone(),
            );
            self.reply_error(&message, message.context.clone(), error).await;
            return;
        };

        let ctx = AgentContext::new(Arc::clone(&self.identity), &message, self.outbound());
        let outcome = run_handler(
            handler,
            message.content.clone(),
            ctx.clone(),
            message.correlation_id.clone(),
        )
        .await;
        let context = ctx.shared_context();
        drop(ctx);

        match outcome {
            Ok(content) => {
                let elapsed = started.elapsed();
                info!(
                    agent_id = %self.id(),
                    intent = intent.as_str(),
                    duration_ms = elapsed.as_millis() as u64,
                    "Message handled"
                );
                metrics::record_message_handled(intent.as_str(), "ok", elapsed);
                let reply = self
                    .formatter
                    .format_response(&self.identity, &message, content, context);
                self.send_reply(reply).await;
            }
            Err(HandlerFailure::InvalidContent(detail)) => {
                warn!(
                    agent_id = %self.id(),
                    intent = intent.as_str(),
                    error = %detail,
                    "Request content does not match the intent's payload"
                );
                metrics::record_message_handled(intent.as_str(), "invalid", started.elapsed());
                let error = A2aError::new(
                    ErrorCode::InvalidMessage,
                    format!("Invalid content for intent '{}': {}", intent.as_str(), detail),
                    self.id().clone(),
                );
                self.reply_error(&message, context, error).await;
            }
            Err(HandlerFailure::Failed(reason)) => {
                error!(
                    agent_id = %self.id(),
                    intent = intent.as_str(),
                    error = %reason,
                    "Message handling failed"
                );
                metrics::record_message_handled(intent.as_str(), "error", started.elapsed());
                let error = A2aError::new(ErrorCode::InternalError, reason, self.id().clone());
                self.reply_error(&message, context, error).await;
            }
        }
    }

    async fn dispatch_event(self: &Arc<Self>, message: A2aMessage) {
        let Some((intent, handler)) = self.handlers.resolve(&message.intent) else {
            debug!(intent = %message.intent, "No handler registered for event");
            return;
        };

        let ctx = AgentContext::new(Arc::clone(&self.identity), &message, self.outbound());
        match run_handler(handler, message.content, ctx, message.correlation_id).await {
            Ok(_) => debug!(intent = intent.as_str(), "Event handled"),
            Err(failure) => {
                warn!(intent = intent.as_str(), failure = ?failure, "Event handler failed")
            }
        }
    }

    fn outbound(self: &Arc<Self>) -> Arc<dyn Outbound> {
        Arc::clone(self) as Arc<dyn Outbound>
    }

    async fn reply_error(&self, request: &A2aMessage, context: SharedContext, error: A2aError) {
        metrics::record_error(&request.intent, error.code.as_str());
        let reply = self
            .formatter
            .format_error(&self.identity, request, context, error);
        self.send_reply(reply).await;
    }

    async fn send_reply(&self, reply: A2aMessage) {
        let Some(ports) = self.ports() else {
            warn!(
                agent_id = %self.id(),
                correlation_id = %reply.correlation_id,
                "Agent is not started, dropping reply"
            );
            return;
        };
        if let Err(err) = ports.broker.send(reply).await {
            error!(agent_id = %self.id(), error = %err, "Failed to send reply");
        }
    }

    /// Send a request to some agent of type `to` and wait for its reply.
    ///
    /// Without a `context` a fresh session is started and its id becomes the
    /// conversation id.
    pub async fn send_request<T, R>(
        &self,
        to: AgentType,
        intent: &str,
        content: T,
        context: Option<SharedContext>,
        priority: Option<Priority>,
    ) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let content = serde_json::to_value(content)?;
        let (reply, _) = self
            .request_value(
                to,
                intent,
                content,
                context,
                priority.unwrap_or_default(),
                TraceContext::new_root(),
            )
            .await?;
        decode_reply(intent, reply)
    }

    /// Like [`send_request`](Self::send_request), but threads `context`
    /// through the call: the peer's appends are merged back into it.
    pub async fn send_request_in_context<T, R>(
        &self,
        to: AgentType,
        intent: &str,
        content: T,
        context: &mut SharedContext,
        priority: Option<Priority>,
    ) -> Result<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let content = serde_json::to_value(content)?;
        let (reply, reply_context) = self
            .request_value(
                to,
                intent,
                content,
                Some(context.clone()),
                priority.unwrap_or_default(),
                TraceContext::new_root(),
            )
            .await?;
        context.merge(reply_context);
        decode_reply(intent, reply)
    }

    async fn request_value(
        &self,
        to: AgentType,
        intent: &str,
        content: Value,
        context: Option<SharedContext>,
        priority: Priority,
        trace: TraceContext,
    ) -> Result<(Value, SharedContext)> {
        let ports = self.ports().ok_or(A2aRtError::NotStarted)?;
        let target = ports
            .registry
            .find_agent(to)
            .await?
            .ok_or_else(|| A2aRtError::AgentUnavailable(to.to_string()))?;

        let correlation_id = generate_correlation_id();
        let message = self.envelope(
            target.identity(),
            MessageType::Request,
            correlation_id.clone(),
            intent,
            content,
            context.unwrap_or_else(SharedContext::new_session),
            priority,
            trace,
        );

        let span = spans::send_request(
            self.id().as_str(),
            to.as_str(),
            intent,
            correlation_id.as_str(),
        );
        let started = Instant::now();
        let result = async {
            debug!(to_agent = %target.agent_id, ttl_ms = message.ttl, "Sending A2A request");
            ports.broker.request(message).await
        }
        .instrument(span)
        .await
        .and_then(|reply| terminal_content(&correlation_id, reply));

        match &result {
            Ok(_) => metrics::record_request(to.as_str(), intent, "ok", started.elapsed()),
            Err(err) => {
                debug!(to = %to, intent, error = %err, "A2A request failed");
                metrics::record_request(to.as_str(), intent, "error", started.elapsed());
                metrics::record_error(intent, err.code().as_str());
            }
        }
        result
    }

    /// Fire-and-forget notification to some agent of type `to`.
    pub async fn send_event<T: Serialize>(
        &self,
        to: AgentType,
        intent: &str,
        content: T,
        context: Option<SharedContext>,
    ) -> Result<()> {
        let ports = self.ports().ok_or(A2aRtError::NotStarted)?;
        let target = ports
            .registry
            .find_agent(to)
            .await?
            .ok_or_else(|| A2aRtError::AgentUnavailable(to.to_string()))?;

        let message = self.envelope(
            target.identity(),
            MessageType::Event,
            generate_correlation_id(),
            intent,
            serde_json::to_value(content)?,
            context.unwrap_or_else(SharedContext::new_session),
            Priority::Normal,
            TraceContext::new_root(),
        );
        ports.broker.send(message).await
    }

    #[allow(clippy::too_many_arguments)]
    fn envelope(
        &self,
        to: AgentIdentity,
        message_type: MessageType,
        correlation_id: CorrelationId,
        intent: &str,
        content: Value,
        context: SharedContext,
        priority: Priority,
        trace: TraceContext,
    ) -> A2aMessage {
        A2aMessage {
            message_id: MessageId::generate(),
            correlation_id,
            timestamp: Utc::now(),
            from: self.identity.as_ref().clone(),
            to,
            reply_to: None,
            message_type,
            intent: intent.to_string(),
            content,
            conversation_id: ConversationId::from(context.session_id.clone()),
            parent_message_id: None,
            context,
            priority,
            ttl: self.config.request_timeout_ms(),
            trace: Some(trace),
        }
    }
}

#[async_trait]
impl<I: Intent> Outbound for BaseAgent<I> {
    async fn request(
        &self,
        to: AgentType,
        intent: &str,
        content: Value,
        context: SharedContext,
        priority: Priority,
        trace: TraceContext,
    ) -> Result<(Value, SharedContext)> {
        self.request_value(to, intent, content, Some(context), priority, trace)
            .await
    }
}

/// Broker-facing adapter. Holds the agent weakly so a subscription does not
/// keep a dropped agent alive.
struct Dispatcher<I: Intent> {
    agent: Weak<BaseAgent<I>>,
}

#[async_trait]
impl<I: Intent> InboundHandler for Dispatcher<I> {
    async fn on_message(&self, message: A2aMessage) {
        match self.agent.upgrade() {
            Some(agent) => agent.handle_message(message).await,
            None => debug!(
                message_id = %message.message_id,
                "Dropping message for released agent"
            ),
        }
    }
}

/// Run a handler on its own task so a panic surfaces as a failure instead of
/// tearing down the dispatcher.
async fn run_handler(
    handler: Arc<dyn DynHandler>,
    content: Value,
    ctx: AgentContext,
    correlation_id: CorrelationId,
) -> std::result::Result<Value, HandlerFailure> {
    let task = tokio::spawn(
        with_correlation_id(correlation_id, async move { handler.call(content, ctx).await })
            .in_current_span(),
    );
    match task.await {
        Ok(outcome) => outcome,
        Err(err) if err.is_panic() => Err(HandlerFailure::Failed(panic_message(err.into_panic()))),
        Err(_) => Err(HandlerFailure::Failed("Handler task was cancelled".to_string())),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Handler panicked".to_string()
    }
}

fn terminal_content(
    correlation_id: &CorrelationId,
    reply: A2aMessage,
) -> Result<(Value, SharedContext)> {
    if &reply.correlation_id != correlation_id {
        return Err(A2aRtError::InvalidMessage(format!(
            "Reply correlation {} does not match request {}",
            reply.correlation_id, correlation_id
        )));
    }
    match reply.message_type {
        MessageType::Response => Ok((reply.content, reply.context)),
        MessageType::Error => Err(reply
            .error_payload()
            .map(A2aRtError::from)
            .unwrap_or_else(|| {
                A2aRtError::InvalidMessage("Malformed error envelope".to_string())
            })),
        other => Err(A2aRtError::InvalidMessage(format!(
            "Expected a terminal envelope, got '{}'",
            other.as_str()
        ))),
    }
}
