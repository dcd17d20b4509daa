//! meetcheck - conformance harness for the meeting-recorder backend
//!
//! Certifies that a running backend answers its HTTP probes, speaks the
//! WebSocket audio protocol, and persists users and meetings the way the
//! browser extension expects.

pub mod cli;
pub mod commands;
pub mod common;
pub mod mock;
pub mod net;
pub mod protocol;
pub mod store;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, ErrorKind, Result};
pub use testing::{run_suite, RunSummary, ScenarioEngine, ScenarioResult, Suite};
