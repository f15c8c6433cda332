//! pixview-viewer library crate.
//!
//! A thin remote-framebuffer viewer: it keeps one binary WebSocket open to a
//! pixel server, paints the pixel updates it receives into a local
//! framebuffer, and sends pointer contacts back as touch commands.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Collaborator (canvas, window, test)
//!         ↕  ViewerHandle / ViewerSink
//! [pixview-viewer]
//!   ├── domain/           ViewerConfig, Endpoint
//!   ├── application/      SessionController (pure state machine), ViewerSink
//!   └── infrastructure/
//!         ├── runtime/      driver task: select! over commands, socket, timers
//!         ├── transport/    Connector + WebSocket client (tokio-tungstenite)
//!         └── render_clock/ fixed-period repaint ticker
//!         ↕  binary frames
//! Pixel server
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O and no async.
//! - `application` depends on `domain` and `pixview-core` only.  The
//!   session controller returns actions instead of performing them.
//! - `infrastructure` depends on all other layers plus `tokio` and
//!   `tungstenite`.
//!
//! # Quick start
//!
//! ```ignore
//! let (handle, _task) = spawn_viewer(ViewerConfig::default(), WebSocketConnector::new(), my_sink)?;
//! handle.set_intent(true)?;
//! handle.pointer_down(10, 20)?;
//! handle.teardown();
//! ```

/// Domain layer: configuration types.
pub mod domain;

/// Application layer: session state machine and the collaborator port.
pub mod application;

/// Infrastructure layer: transport, timers and the driver task.
pub mod infrastructure;

pub use application::{SessionError, SessionState, ViewerSink};
pub use domain::{ConfigError, ViewerConfig};
pub use infrastructure::{spawn_viewer, ViewerError, ViewerHandle, WebSocketConnector};
