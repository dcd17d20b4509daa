//! Conformance suites
//!
//! Reads YAML suites, runs their scenarios against a live backend through
//! the protocol driver and the state store, and reports per-scenario
//! verdicts.

pub mod config;
pub mod report;
mod runner;
mod scenario;
mod session;

pub use config::{PayloadFormat, ScenarioSpec, Suite, BUILTIN_SUITES};
pub use report::Output;
pub use runner::{run_suite, RunSummary};
pub use scenario::{MeetingPolicy, ScenarioEngine, ScenarioResult};
pub use session::Session;
