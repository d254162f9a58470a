//! In-process implementations of the runtime's transport and discovery
//! ports, for embedding several agents in one process and for tests.

pub mod broker;
pub mod registry;

pub use broker::{DEFAULT_EVENT_LOG_CAPACITY, InMemoryBroker, PublishedEvent};
pub use registry::InMemoryRegistry;
