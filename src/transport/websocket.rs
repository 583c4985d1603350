//! WebSocket transport.
//!
//! Alternative to the process pipe: the browser exposes the same protocol
//! on a `ws://` endpoint (endpoint discovery is the caller's concern, per
//! the launcher flag or the browser's version endpoint). One text frame
//! carries one envelope.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

use super::{TransportRx, TransportTx};

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// WsTx
// ============================================================================

/// Write half of a WebSocket transport.
#[derive(Debug)]
pub struct WsTx {
    sink: SplitSink<WsStream, Message>,
}

#[async_trait]
impl TransportTx for WsTx {
    async fn send(&mut self, frame: String) -> Result<()> {
        self.sink.send(Message::Text(frame.into())).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.sink.close().await?;
        Ok(())
    }
}

// ============================================================================
// WsRx
// ============================================================================

/// Read half of a WebSocket transport.
#[derive(Debug)]
pub struct WsRx {
    stream: SplitStream<WsStream>,
}

#[async_trait]
impl TransportRx for WsRx {
    async fn receive(&mut self) -> Option<Result<String>> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(text.to_string())),

                Some(Ok(Message::Close(_))) => {
                    debug!("WebSocket closed by remote");
                    return None;
                }

                // Ignore Binary, Ping, Pong, Frame
                Some(Ok(_)) => continue,

                Some(Err(e)) => return Some(Err(Error::WebSocket(e))),

                None => return None,
            }
        }
    }
}

// ============================================================================
// Connect
// ============================================================================

/// Connects to a browser DevTools WebSocket endpoint.
///
/// # Arguments
///
/// * `endpoint` - A `ws://` or `wss://` URL
///
/// # Errors
///
/// - [`Error::Config`] if the endpoint is not a valid WebSocket URL
/// - [`Error::WebSocket`] if the connection or handshake fails
pub async fn connect(endpoint: &str) -> Result<(WsTx, WsRx)> {
    let url = Url::parse(endpoint)
        .map_err(|e| Error::config(format!("Invalid WebSocket endpoint '{endpoint}': {e}")))?;

    match url.scheme() {
        "ws" | "wss" => {}
        scheme => {
            return Err(Error::config(format!(
                "WebSocket endpoint must use ws:// or wss://, got '{scheme}'"
            )));
        }
    }

    let (ws_stream, _) = connect_async(endpoint).await?;
    debug!(endpoint, "WebSocket connection established");

    let (sink, stream) = ws_stream.split();
    Ok((WsTx { sink }, WsRx { stream }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_rejects_http_scheme() {
        let result = connect("http://127.0.0.1:9222/devtools").await;
        let err = result.expect_err("http scheme must be rejected");
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_connect_rejects_garbage() {
        let result = connect("not a url").await;
        assert!(result.is_err());
    }
}
