//! The collaborator-facing output port.
//!
//! Whatever presents the viewer (a canvas, a window, a test recorder)
//! implements [`ViewerSink`].  The runtime calls it from its single driver
//! task, so implementations need no locking of their own.

use pixview_core::FrameView;

/// Receives connection status changes and frames to paint.
pub trait ViewerSink: Send + 'static {
    /// The "connected" status flipped.  Called only on change.
    fn on_status_change(&mut self, connected: bool);

    /// A render tick fired; paint `frame`.
    ///
    /// The view borrows the live framebuffer and is only valid for the
    /// duration of the call.  Copy out whatever must outlive it.
    fn on_frame_ready(&mut self, frame: FrameView<'_>);
}
