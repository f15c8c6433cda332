//! Domain entities for PixView.
//!
//! Pure state with no I/O: the pixel surface the server paints into and the
//! contact counter that turns pointer events into touch commands.  Both are
//! owned by exactly one viewer and mutated from a single task.

/// The fixed-size pixel surface.
pub mod framebuffer;

/// Pointer contact tracking.
pub mod input;
