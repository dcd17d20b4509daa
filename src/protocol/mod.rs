//! Meeting audio WebSocket protocol
//!
//! Message types, the JSON codec and the driver that sends and awaits
//! messages over an open connection.

pub mod codec;
pub mod driver;
pub mod types;

pub use driver::ProtocolDriver;
pub use types::{MessageKind, ProtocolMessage};
