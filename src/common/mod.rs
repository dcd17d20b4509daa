//! Common utilities shared by the harness, the CLI and the mock backend

pub mod config;
pub mod error;
pub mod logging;
pub mod paths;

pub use error::{Error, ErrorKind, Result};

/// Current time as whole seconds since the Unix epoch
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
