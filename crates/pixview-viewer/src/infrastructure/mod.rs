//! Infrastructure layer for pixview-viewer.
//!
//! Contains everything that touches sockets, timers or tasks.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `pixview_core`, but MUST NOT be imported by the application or domain
//! layers.
//!
//! # Sub-modules
//!
//! - **`transport`** – the `Connector` trait and its WebSocket implementation
//!   on `tokio-tungstenite`.
//!
//! - **`render_clock`** – the fixed-period ticker that drives repaints.
//!
//! - **`runtime`** – the single driver task, `spawn_viewer` and the
//!   `ViewerHandle` the collaborator holds.
//!
//! - **`mock`** – a recording sink and a loopback connector for tests that
//!   need neither a canvas nor a server.

pub mod mock;
pub mod render_clock;
pub mod runtime;
pub mod transport;

pub use render_clock::RenderClock;
pub use runtime::{spawn_viewer, ViewerError, ViewerHandle};
pub use transport::{Connector, Link, TransportError, WebSocketConnector};
