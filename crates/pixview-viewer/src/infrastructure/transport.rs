//! Socket transport for the pixel server.
//!
//! A [`Connector`] opens one [`Link`]: a binary frame stream from the server
//! and a binary frame sink towards it.  The production connector speaks
//! WebSocket (`ws://` or `wss://`) through `tokio-tungstenite`; tests swap in
//! the loopback connector from [`super::mock`].
//!
//! Only binary messages carry data.  Text messages are dropped, and
//! ping/pong/close control frames are handled by tungstenite itself.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::{future, Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::debug;

/// Errors raised by a transport.  None of them reach the collaborator: the
/// runtime logs them and hands the loss to the session controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The socket could not be opened.
    #[error("failed to open {url}: {reason}")]
    OpenFailed { url: String, reason: String },

    /// The open socket failed.
    #[error("connection closed abnormally: {0}")]
    AbnormalClose(String),

    /// An outbound frame could not be written.
    #[error("send failed: {0}")]
    Send(String),
}

/// Outbound half of a link.
pub type FrameSink = Pin<Box<dyn Sink<Vec<u8>, Error = TransportError> + Send>>;

/// Inbound half of a link.  Ends (`None`) when the server closes cleanly.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send>>;

/// One open, bidirectional binary connection.
pub struct Link {
    pub outbound: FrameSink,
    pub inbound: FrameStream,
}

impl std::fmt::Debug for Link {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Link").finish_non_exhaustive()
    }
}

/// Opens links to a URL.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a new link to `url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::OpenFailed`] if the socket cannot be opened.
    async fn connect(&self, url: &str) -> Result<Link, TransportError>;
}

// ── WebSocket connector ───────────────────────────────────────────────────────

/// [`Connector`] speaking binary WebSocket via `tokio-tungstenite`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, url: &str) -> Result<Link, TransportError> {
        // `connect_async` performs the TCP (and TLS for wss://) handshake and
        // the HTTP upgrade before returning the framed stream.
        let (ws_stream, _response) =
            connect_async(url)
                .await
                .map_err(|e| TransportError::OpenFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        let (ws_sink, ws_source) = ws_stream.split();

        let outbound = ws_sink
            .sink_map_err(|e| TransportError::Send(e.to_string()))
            .with(|frame: Vec<u8>| future::ready(Ok::<_, TransportError>(WsMessage::Binary(frame))));
        let inbound = ws_source.filter_map(|msg| future::ready(binary_payload(msg)));

        Ok(Link {
            outbound: Box::pin(outbound),
            inbound: Box::pin(inbound),
        })
    }
}

/// Keeps binary payloads and errors; drops everything else.
fn binary_payload(msg: Result<WsMessage, WsError>) -> Option<Result<Vec<u8>, TransportError>> {
    match msg {
        Ok(WsMessage::Binary(data)) => Some(Ok(data)),
        Ok(WsMessage::Text(text)) => {
            debug!("ignoring {} byte text frame", text.len());
            None
        }
        Ok(WsMessage::Close(frame)) => {
            debug!("server sent close: {frame:?}");
            None
        }
        Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_)) => None,
        Err(e) => Some(Err(TransportError::AbnormalClose(e.to_string()))),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
