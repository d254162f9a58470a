//! Shared fixtures and port doubles for the workspace test suites.

pub mod common;
pub mod support;
