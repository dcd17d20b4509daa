//! Protocol driver
//!
//! Sends typed messages over an open transport and waits, with a deadline,
//! for the next typed reply. Frames are handed back in arrival order, one
//! per `receive` call; nothing is buffered or reordered here.

use std::time::Duration;

use tokio::time::timeout;

use crate::common::{Error, Result};
use crate::net::Transport;

use super::codec;
use super::types::ProtocolMessage;

/// Driver over one open connection
pub struct ProtocolDriver {
    transport: Box<dyn Transport>,
    frames_sent: usize,
}

impl ProtocolDriver {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            frames_sent: 0,
        }
    }

    /// Serialize and write one message
    pub async fn send(&mut self, message: &ProtocolMessage) -> Result<()> {
        let json = codec::encode(message)?;
        tracing::debug!("WS >>> {}", json);

        self.transport
            .send_text(json)
            .await
            .map_err(|e| Error::send_failed(message.kind.as_str(), e))?;
        self.frames_sent += 1;
        Ok(())
    }

    /// Wait up to `limit` for the next message
    ///
    /// Returns `Error::Timeout` when nothing arrives in time,
    /// `Error::ConnectionClosed` when the peer hangs up, and `Error::Decode`
    /// for frames that are not protocol messages. The driver stays usable
    /// after any of these.
    pub async fn receive(&mut self, limit: Duration) -> Result<ProtocolMessage> {
        let frame = match timeout(limit, self.transport.recv_text()).await {
            Ok(frame) => frame?,
            Err(_) => return Err(Error::Timeout(limit)),
        };

        let text = frame.ok_or(Error::ConnectionClosed)?;
        tracing::debug!("WS <<< {}", text);
        codec::decode(&text)
    }

    /// Number of frames written so far
    pub fn frames_sent(&self) -> usize {
        self.frames_sent
    }

    /// Close the underlying connection
    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }
}
