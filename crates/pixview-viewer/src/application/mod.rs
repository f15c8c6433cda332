//! Application layer for pixview-viewer.
//!
//! Knows *what* the viewer does with connection events and *who* it reports
//! to, but leaves sockets, timers and tasks to the infrastructure layer.
//!
//! - `session` – the connection lifecycle state machine.
//! - `sink`    – the [`ViewerSink`] port the collaborator implements.

pub mod session;
pub mod sink;

pub use session::{SessionAction, SessionController, SessionError, SessionState};
pub use sink::ViewerSink;
