//! Text-frame transport abstraction
//!
//! The protocol driver only needs "send a text frame" and "receive the next
//! text frame". WebSocket connections implement this for real backends; an
//! in-memory pair implements it for unit tests.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::common::{Error, Result};

/// A bidirectional channel of text frames
#[async_trait]
pub trait Transport: Send {
    /// Write one text frame
    async fn send_text(&mut self, text: String) -> Result<()>;

    /// Wait for the next text frame; `None` once the peer has closed
    async fn recv_text(&mut self) -> Result<Option<String>>;

    /// Close the channel; closing twice is not an error
    async fn close(&mut self) -> Result<()>;
}

/// Client-side WebSocket stream as returned by `connect_async`
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Transport over an open WebSocket connection
pub struct WsTransport {
    stream: WsStream,
    closed: bool,
}

impl WsTransport {
    pub fn new(stream: WsStream) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

fn ws_error(e: tungstenite::Error) -> Error {
    match e {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            Error::ConnectionClosed
        }
        tungstenite::Error::Io(e) => Error::Io(e),
        other => Error::ProtocolViolation(other.to_string()),
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<()> {
        if self.closed {
            return Err(Error::ConnectionClosed);
        }
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(ws_error)
    }

    async fn recv_text(&mut self) -> Result<Option<String>> {
        loop {
            let frame = match self.stream.next().await {
                None => return Ok(None),
                Some(Err(
                    tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed,
                )) => return Ok(None),
                Some(Err(e)) => return Err(ws_error(e)),
                Some(Ok(frame)) => frame,
            };

            match frame {
                Message::Text(text) => return Ok(Some(text.to_string())),
                Message::Binary(bytes) => {
                    return String::from_utf8(bytes.to_vec()).map(Some).map_err(|e| {
                        Error::Decode(format!("binary frame is not UTF-8: {}", e))
                    });
                }
                Message::Close(_) => return Ok(None),
                // Ping/pong are answered by tungstenite itself
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.stream.close(None).await {
            Ok(()) => Ok(()),
            Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(e) => Err(ws_error(e)),
        }
    }
}
