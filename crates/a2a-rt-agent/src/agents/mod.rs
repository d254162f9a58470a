//! Specialized agents built on [`BaseAgent`](crate::BaseAgent).

pub mod intent_analyst;

pub use intent_analyst::{IntentAnalystIntent, IntentAnalyzer, create_intent_analyst_agent};
