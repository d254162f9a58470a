//! Typed intent handlers.
//!
//! Each agent declares a closed set of intents with [`define_intents!`] and
//! binds one [`MessageHandler`] per intent. Handlers see decoded request
//! payloads and return typed responses; the table erases both to JSON at the
//! dispatch boundary.

use crate::context::AgentContext;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;

/// A closed set of intent names an agent answers to.
pub trait Intent: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {
    /// Wire name carried in the envelope `intent` field.
    fn as_str(&self) -> &'static str;

    fn all() -> &'static [Self];

    fn parse(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|intent| intent.as_str() == name)
    }
}

/// Declare an intent enum and its wire names.
///
/// ```
/// a2a_rt_agent::define_intents! {
///     pub enum QuotingIntent {
///         GenerateQuote => "generate_quote",
///     }
/// }
///
/// use a2a_rt_agent::Intent;
/// assert_eq!(QuotingIntent::parse("generate_quote"), Some(QuotingIntent::GenerateQuote));
/// ```
#[macro_export]
macro_rules! define_intents {
    (
        $(#[$doc:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vdoc:meta])* $variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$vdoc])* $variant),+
        }

        impl $crate::handlers::Intent for $name {
            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::handlers::Intent::as_str(self))
            }
        }
    };
}

/// Business logic bound to one intent.
///
/// An `Err` becomes an `INTERNAL_ERROR` envelope whose message is the error's
/// display text.
#[async_trait]
pub trait MessageHandler: Send + Sync + 'static {
    type Request: DeserializeOwned + Send + 'static;
    type Response: Serialize + Send + 'static;

    async fn handle(
        &self,
        request: Self::Request,
        ctx: AgentContext,
    ) -> anyhow::Result<Self::Response>;
}

/// Handler backed by an async closure. Built with [`handler_fn`].
pub struct FnHandler<F, Req, Resp> {
    f: F,
    _marker: PhantomData<fn(Req) -> Resp>,
}

pub fn handler_fn<F, Fut, Req, Resp>(f: F) -> FnHandler<F, Req, Resp>
where
    F: Fn(Req, AgentContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Resp>> + Send + 'static,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    FnHandler {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, Req, Resp> MessageHandler for FnHandler<F, Req, Resp>
where
    F: Fn(Req, AgentContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Resp>> + Send + 'static,
    Req: DeserializeOwned + Send + 'static,
    Resp: Serialize + Send + 'static,
{
    type Request = Req;
    type Response = Resp;

    async fn handle(&self, request: Req, ctx: AgentContext) -> anyhow::Result<Resp> {
        (self.f)(request, ctx).await
    }
}

/// Why an erased handler call produced no response payload.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum HandlerFailure {
    /// The content did not decode into the handler's request type.
    InvalidContent(String),
    /// The handler returned an error or panicked.
    Failed(String),
}

#[async_trait]
pub(crate) trait DynHandler: Send + Sync {
    async fn call(&self, content: Value, ctx: AgentContext) -> Result<Value, HandlerFailure>;
}

struct Erased<H>(H);

#[async_trait]
impl<H: MessageHandler> DynHandler for Erased<H> {
    async fn call(&self, content: Value, ctx: AgentContext) -> Result<Value, HandlerFailure> {
        let request: H::Request = serde_json::from_value(content)
            .map_err(|err| HandlerFailure::InvalidContent(err.to_string()))?;
        let response = self
            .0
            .handle(request, ctx)
            .await
            .map_err(|err| HandlerFailure::Failed(err.to_string()))?;
        serde_json::to_value(response).map_err(|err| {
            HandlerFailure::Failed(format!("Failed to serialize handler response: {}", err))
        })
    }
}

/// Intent to handler bindings. Registering an intent twice replaces the
/// earlier handler.
pub struct HandlerTable<I: Intent> {
    handlers: HashMap<I, Arc<dyn DynHandler>>,
}

impl<I: Intent> Default for HandlerTable<I> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<I: Intent> HandlerTable<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when an earlier handler was replaced.
    pub fn register<H: MessageHandler>(&mut self, intent: I, handler: H) -> bool {
        self.handlers
            .insert(intent, Arc::new(Erased(handler)))
            .is_some()
    }

    pub fn contains(&self, intent: I) -> bool {
        self.handlers.contains_key(&intent)
    }

    /// Registered intents in declaration order.
    pub fn intents(&self) -> Vec<I> {
        I::all()
            .iter()
            .copied()
            .filter(|intent| self.handlers.contains_key(intent))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Look up the handler for a wire intent name.
    pub(crate) fn resolve(&self, wire: &str) -> Option<(I, Arc<dyn DynHandler>)> {
        let intent = I::parse(wire)?;
        let handler = self.handlers.get(&intent)?;
        Some((intent, Arc::clone(handler)))
    }
}
