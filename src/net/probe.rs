//! Connection probes
//!
//! Reachability checks against the backend's HTTP and WebSocket endpoints.
//! Every failure mode (refused, DNS, TLS, handshake, timeout) is reported as
//! `Error::Unreachable`; nothing here retries.

use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;

use crate::common::{Error, Result};

use super::transport::WsTransport;

/// HTTP probe with a fixed per-request deadline
#[derive(Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    /// `GET url` must answer 200
    pub async fn check_http_health(&self, url: &str) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest(url, self.timeout, e))?;

        let status = response.status();
        tracing::debug!("GET {} -> {}", url, status);
        if status != reqwest::StatusCode::OK {
            return Err(Error::HttpStatus {
                target: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(())
    }

    /// `GET url` must answer 200 with a JSON body, which is returned
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_reqwest(url, self.timeout, e))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::HttpStatus {
                target: url.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Decode(format!("{} did not return JSON: {}", url, e)))
    }
}

fn classify_reqwest(url: &str, limit: Duration, e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::unreachable(url, format!("timed out after {:?}", limit))
    } else {
        Error::unreachable(url, e)
    }
}

/// Open a WebSocket connection, bounded by `limit`
pub async fn open_websocket(url: &str, limit: Duration) -> Result<WsTransport> {
    match timeout(limit, tokio_tungstenite::connect_async(url)).await {
        Ok(Ok((stream, response))) => {
            tracing::debug!("WebSocket {} opened ({})", url, response.status());
            Ok(WsTransport::new(stream))
        }
        Ok(Err(e)) => Err(Error::unreachable(url, e)),
        Err(_) => Err(Error::unreachable(
            url,
            format!("handshake timed out after {:?}", limit),
        )),
    }
}
