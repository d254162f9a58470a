pub mod broker;
pub mod registry;
