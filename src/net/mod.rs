//! Connection layer: reachability probes and text-frame transports

pub mod probe;
pub mod transport;

use std::time::Duration;

use async_trait::async_trait;

use crate::common::Result;

pub use probe::{open_websocket, HttpProbe};
pub use transport::{Transport, WsTransport};

/// Opens a fresh protocol connection for each scenario
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn Transport>>;
}

/// Connects to the backend's WebSocket audio endpoint
pub struct WsConnector {
    url: String,
    timeout: Duration,
}

impl WsConnector {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>> {
        let transport = open_websocket(&self.url, self.timeout).await?;
        Ok(Box::new(transport))
    }
}
