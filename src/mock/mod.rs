//! In-process mock backend
//!
//! Serves the two HTTP probe endpoints and the WebSocket audio endpoint from
//! one axum router, backed by a `MemoryStore`. Used by the integration tests
//! and by the `mock-backend` binary for trying suites without the real
//! service.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;

use crate::common::{Error, Result};
use crate::protocol::{codec, MessageKind, ProtocolMessage};
use crate::store::MemoryStore;

/// Behaviour switches for failure-path testing
#[derive(Debug, Clone, Copy, Default)]
pub struct MockOptions {
    /// Create meetings on `recording_started` but never reply
    pub silent: bool,
}

/// A backend that speaks the audio protocol and records what it receives
pub struct MockBackend {
    store: MemoryStore,
    options: MockOptions,
    received: Mutex<Vec<ProtocolMessage>>,
}

impl MockBackend {
    pub fn new(store: MemoryStore, options: MockOptions) -> Arc<Self> {
        Arc::new(Self {
            store,
            options,
            received: Mutex::new(Vec::new()),
        })
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Every decoded protocol message received so far, in arrival order
    pub fn received(&self) -> Vec<ProtocolMessage> {
        self.received
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Received messages of one kind
    pub fn received_of(&self, kind: MessageKind) -> Vec<ProtocolMessage> {
        self.received()
            .into_iter()
            .filter(|m| m.kind == kind)
            .collect()
    }

    /// Routes: `/api/health`, `/api/audio/websocket` and the `/audio` socket
    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/api/health", get(health_handler))
            .route("/api/audio/websocket", get(audio_endpoint_handler))
            .route("/audio", get(ws_handler))
            .with_state(self)
    }

    /// Serve until the listener fails
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            tracing::debug!("Mock backend serving on {}", addr);
        }
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    async fn handle_socket(&self, mut socket: WebSocket) -> Result<()> {
        while let Some(frame) = socket.recv().await {
            let text = match frame {
                Ok(Message::Text(text)) => text,
                Ok(Message::Close(_)) => break,
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("Mock backend socket error: {}", e);
                    break;
                }
            };

            let message = match codec::decode(&text) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!("Mock backend ignoring frame: {}", e);
                    continue;
                }
            };

            if let Ok(mut received) = self.received.lock() {
                received.push(message.clone());
            }

            if let Some(reply) = self.respond(&message)? {
                let text = codec::encode(&reply)?;
                socket
                    .send(Message::Text(text))
                    .await
                    .map_err(|e| Error::send_failed(reply.kind.as_str(), e))?;
            }
        }
        Ok(())
    }

    /// Apply a message to the store and build the reply, if any
    fn respond(&self, message: &ProtocolMessage) -> Result<Option<ProtocolMessage>> {
        match &message.kind {
            MessageKind::RecordingStarted => {
                let meeting_id = uuid::Uuid::new_v4().to_string();
                let title = format!("Meeting {}", chrono::Utc::now().format("%Y-%m-%d %H:%M"));
                self.store
                    .create_meeting(&meeting_id, &message.user_id, &title)?;
                tracing::info!(user_id = %message.user_id, meeting_id = %meeting_id, "Meeting created");

                if self.options.silent {
                    return Ok(None);
                }
                Ok(Some(ProtocolMessage::meeting_created(
                    &message.user_id,
                    &meeting_id,
                )))
            }
            MessageKind::RecordingStopped => {
                if let Some(meeting_id) = message.meeting_id() {
                    if !self.store.set_meeting_status(meeting_id, "completed")? {
                        tracing::warn!("recording_stopped for unknown meeting {}", meeting_id);
                    }
                }
                Ok(None)
            }
            MessageKind::AudioChunk => {
                tracing::debug!(
                    meeting_id = message.meeting_id().unwrap_or("-"),
                    bytes = message.data.as_ref().map(|d| d.len()).unwrap_or(0),
                    "Audio chunk"
                );
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn audio_endpoint_handler() -> impl IntoResponse {
    Json(json!({ "endpoint": "/audio", "protocol": "websocket" }))
}

async fn ws_handler(
    State(backend): State<Arc<MockBackend>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| async move {
        if let Err(e) = backend.handle_socket(socket).await {
            tracing::debug!("Mock backend connection ended: {}", e);
        }
    })
}
