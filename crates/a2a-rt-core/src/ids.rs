//! Strongly-typed ID wrappers for protocol concepts.
//!
//! These newtypes keep message, correlation and conversation identifiers from
//! being mixed up at compile time while staying plain strings on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! define_id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: String) -> Self {
                Self(id)
            }

            /// Mint a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

define_id_type!(
    /// Globally unique identifier of an agent instance
    AgentId
);

define_id_type!(
    /// Identifier of a single envelope
    MessageId
);

define_id_type!(
    /// Links one request to its terminal response or error
    CorrelationId
);

define_id_type!(
    /// Spans a whole multi-agent, possibly multi-turn interaction
    ConversationId
);

define_id_type!(
    /// Session carried in the shared context
    SessionId
);

define_id_type!(
    /// Distributed trace identifier
    TraceId
);

define_id_type!(
    /// Distributed span identifier
    SpanId
);

impl AgentId {
    /// Default agent id: the agent type followed by a short random suffix.
    pub fn for_agent_type(agent_type: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!("{}-{}", agent_type, &suffix[..8]))
    }
}

impl From<SessionId> for ConversationId {
    fn from(session: SessionId) -> Self {
        Self(session.into_string())
    }
}
