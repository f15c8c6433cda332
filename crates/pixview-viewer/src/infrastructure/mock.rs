//! In-memory doubles for the collaborator and the pixel server.
//!
//! [`RecordingSink`] stands in for a canvas: it records every status change
//! and keeps a copy of the last painted frame.  [`LoopbackConnector`] stands
//! in for the network: each accepted connect hands the test a
//! [`LoopbackServer`] with both ends of the link, so a test can push frames
//! to the viewer and read the touch commands it sends back.
//!
//! # Usage in tests
//!
//! ```ignore
//! let (connector, mut servers) = LoopbackConnector::new();
//! let sink = RecordingSink::new();
//! let (handle, _task) = spawn_viewer(ViewerConfig::default(), connector, sink.clone())?;
//!
//! handle.set_intent(true)?;
//! let mut server = servers.recv().await.unwrap();
//! server.push_frame(encode_pixel_update(0, 0xF800).to_vec());
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::{future, sink, stream};
use tokio::sync::mpsc;

use pixview_core::FrameView;

use crate::application::sink::ViewerSink;
use crate::infrastructure::transport::{Connector, Link, TransportError};

// ── RecordingSink ─────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Recorded {
    statuses: Vec<bool>,
    frames: usize,
    last_frame: Option<(u32, u32, Vec<u32>)>,
}

/// A [`ViewerSink`] that records everything it is given.
///
/// Clones share the same record, so a test keeps one clone and hands the
/// other to the viewer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every status change, in order.
    pub fn statuses(&self) -> Vec<bool> {
        self.inner.lock().unwrap().statuses.clone()
    }

    /// Number of frames painted so far.
    pub fn frames(&self) -> usize {
        self.inner.lock().unwrap().frames
    }

    /// Packed pixels of the last painted frame.
    pub fn last_frame(&self) -> Option<Vec<u32>> {
        self.inner
            .lock()
            .unwrap()
            .last_frame
            .as_ref()
            .map(|(_, _, pixels)| pixels.clone())
    }

    /// Packed pixel at `(x, y)` in the last painted frame.
    pub fn last_pixel(&self, x: u32, y: u32) -> Option<u32> {
        let inner = self.inner.lock().unwrap();
        let (width, height, pixels) = inner.last_frame.as_ref()?;
        FrameView {
            width: *width,
            height: *height,
            pixels,
        }
        .pixel(x, y)
    }
}

impl ViewerSink for RecordingSink {
    fn on_status_change(&mut self, connected: bool) {
        self.inner.lock().unwrap().statuses.push(connected);
    }

    fn on_frame_ready(&mut self, frame: FrameView<'_>) {
        let mut inner = self.inner.lock().unwrap();
        inner.frames += 1;
        inner.last_frame = Some((frame.width, frame.height, frame.pixels.to_vec()));
    }
}

// ── LoopbackConnector ─────────────────────────────────────────────────────────

/// How the next [`LoopbackConnector::connect`] behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopbackMode {
    /// Open a link and hand its far end to the test.
    #[default]
    Accept,
    /// Fail with [`TransportError::OpenFailed`].
    Refuse,
    /// Never complete.
    Stall,
}

/// The server side of one accepted loopback link.
#[derive(Debug)]
pub struct LoopbackServer {
    /// Items sent here arrive on the viewer's inbound stream.  Dropping it
    /// closes the link cleanly; an `Err` item is an abnormal close.
    pub to_viewer: mpsc::UnboundedSender<Result<Vec<u8>, TransportError>>,
    /// Frames the viewer wrote.
    pub from_viewer: mpsc::UnboundedReceiver<Vec<u8>>,
}

impl LoopbackServer {
    /// Pushes one binary frame to the viewer.  Returns `false` once the
    /// viewer has dropped the link.
    pub fn push_frame(&self, frame: Vec<u8>) -> bool {
        self.to_viewer.send(Ok(frame)).is_ok()
    }

    /// Fails the link from the server side.
    pub fn fail(&self, reason: &str) {
        let _ = self
            .to_viewer
            .send(Err(TransportError::AbnormalClose(reason.to_string())));
    }
}

/// A [`Connector`] that never touches the network.
#[derive(Debug, Clone)]
pub struct LoopbackConnector {
    mode: Arc<Mutex<LoopbackMode>>,
    attempts: Arc<AtomicUsize>,
    urls: Arc<Mutex<Vec<String>>>,
    servers: mpsc::UnboundedSender<LoopbackServer>,
}

impl LoopbackConnector {
    /// Creates a connector in [`LoopbackMode::Accept`] plus the receiver on
    /// which accepted links are delivered.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LoopbackServer>) {
        let (servers, rx) = mpsc::unbounded_channel();
        let connector = Self {
            mode: Arc::new(Mutex::new(LoopbackMode::Accept)),
            attempts: Arc::new(AtomicUsize::new(0)),
            urls: Arc::new(Mutex::new(Vec::new())),
            servers,
        };
        (connector, rx)
    }

    pub fn set_mode(&self, mode: LoopbackMode) {
        *self.mode.lock().unwrap() = mode;
    }

    /// Number of connect attempts so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Every URL a connect was attempted against, in order.
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for LoopbackConnector {
    async fn connect(&self, url: &str) -> Result<Link, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().unwrap().push(url.to_string());
        let mode = *self.mode.lock().unwrap();

        match mode {
            LoopbackMode::Refuse => Err(TransportError::OpenFailed {
                url: url.to_string(),
                reason: "connection refused".into(),
            }),
            LoopbackMode::Stall => future::pending().await,
            LoopbackMode::Accept => {
                let (to_viewer, inbound_rx) = mpsc::unbounded_channel();
                let (outbound_tx, from_viewer) = mpsc::unbounded_channel();

                let inbound = stream::unfold(inbound_rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                });
                let outbound = sink::unfold(outbound_tx, |tx, frame: Vec<u8>| async move {
                    tx.send(frame)
                        .map_err(|_| TransportError::Send("loopback server gone".into()))?;
                    Ok::<_, TransportError>(tx)
                });

                let _ = self.servers.send(LoopbackServer {
                    to_viewer,
                    from_viewer,
                });
                Ok(Link {
                    outbound: Box::pin(outbound),
                    inbound: Box::pin(inbound),
                })
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
