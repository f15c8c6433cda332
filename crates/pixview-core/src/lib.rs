//! # pixview-core
//!
//! Shared library for PixView containing the pixel-streaming wire codec, the
//! framebuffer it paints into, and the pointer contact gate.
//!
//! It has no dependencies on sockets, async runtimes, or UI frameworks, so
//! everything here can be tested without a server.
//!
//! - **`protocol`** – The two fixed-size wire records: 8-byte pixel updates
//!   (server → viewer) and 5-byte touch commands (viewer → server).
//!
//! - **`domain`** – The [`Framebuffer`] (a 320 x 240 opaque surface by
//!   default) and the [`InputGate`] that turns pointer events into touch
//!   commands.

pub mod domain;
pub mod protocol;

pub use domain::framebuffer::{FrameStats, FrameView, Framebuffer};
pub use domain::input::InputGate;
pub use protocol::codec::{
    decode_pixel_updates, decode_touch_command, encode_touch_command, ProtocolError,
};
pub use protocol::messages::{CommandKind, PixelUpdate, TouchCommand};
