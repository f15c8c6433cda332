//! The local copy of the remote screen.
//!
//! A [`Framebuffer`] is a row-major array of `width * height` packed pixels in
//! `0xAABBGGRR` order.  It is cleared to opaque black on creation and only
//! ever written by decoded pixel-update frames.  Readers get a borrowed
//! [`FrameView`]; there is no internal locking, so the owner must serialise
//! writes and reads (the viewer runtime does this by owning the buffer on a
//! single task).

use tracing::trace;

use crate::protocol::codec::decode_pixel_updates;
use crate::protocol::messages::{ALPHA_MASK, OPAQUE_BLACK};

/// Default framebuffer width in pixels.
pub const DEFAULT_WIDTH: u32 = 320;

/// Default framebuffer height in pixels.
pub const DEFAULT_HEIGHT: u32 = 240;

/// Outcome of applying one frame, used for trace logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Records written into the buffer.
    pub applied: usize,
    /// Records whose index fell outside the buffer.
    pub out_of_range: usize,
    /// Bytes after the last complete record.
    pub trailing_bytes: usize,
}

/// Fixed-size pixel surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl Framebuffer {
    /// Allocates a `width` x `height` buffer filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        let mut fb = Self {
            width,
            height,
            pixels: vec![0; len],
        };
        fb.reset();
        fb
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels (`width * height`).
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// `true` for a zero-sized buffer.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Fills every pixel with opaque black.
    pub fn reset(&mut self) {
        self.pixels.fill(OPAQUE_BLACK);
    }

    /// Writes one packed pixel.
    ///
    /// Out-of-range indices are discarded.  The alpha byte is forced to
    /// `0xFF` whatever `packed` carries.  Returns `true` if the pixel was
    /// written.
    pub fn write(&mut self, index: u32, packed: u32) -> bool {
        match self.pixels.get_mut(index as usize) {
            Some(pixel) => {
                *pixel = packed | ALPHA_MASK;
                true
            }
            None => false,
        }
    }

    /// Decodes `frame` and writes every record into the buffer in wire order.
    ///
    /// Never fails: out-of-range records and trailing bytes are dropped and
    /// only counted in the returned [`FrameStats`].
    pub fn apply_frame(&mut self, frame: &[u8]) -> FrameStats {
        let updates = decode_pixel_updates(frame);
        let mut stats = FrameStats {
            trailing_bytes: updates.trailing_len(),
            ..FrameStats::default()
        };

        for update in updates {
            if self.write(update.index, update.packed) {
                stats.applied += 1;
            } else {
                stats.out_of_range += 1;
            }
        }

        trace!(
            "frame of {} bytes: {} applied, {} out of range, {} trailing bytes",
            frame.len(),
            stats.applied,
            stats.out_of_range,
            stats.trailing_bytes
        );
        stats
    }

    /// Returns a read-only view of the current pixels without copying.
    pub fn snapshot(&self) -> FrameView<'_> {
        FrameView {
            width: self.width,
            height: self.height,
            pixels: &self.pixels,
        }
    }
}

impl Default for Framebuffer {
    /// A 320 x 240 opaque-black buffer.
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH, DEFAULT_HEIGHT)
    }
}

/// Borrowed, read-only view of a [`Framebuffer`] handed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameView<'a> {
    pub width: u32,
    pub height: u32,
    /// Row-major packed `0xAABBGGRR` pixels.
    pub pixels: &'a [u32],
}

impl FrameView<'_> {
    /// Returns the packed pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels.get(index).copied()
    }

    /// Copies the pixels out as raster bytes in R, G, B, A order.
    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|p| p.to_le_bytes()).collect()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::codec::encode_pixel_update;

    #[test]
    fn test_new_framebuffer_is_opaque_black() {
        // Arrange / Act
        let fb = Framebuffer::default();

        // Assert
        assert_eq!(fb.len(), 320 * 240);
        assert!(fb.snapshot().pixels.iter().all(|&p| p == OPAQUE_BLACK));
    }

    #[test]
    fn test_write_in_range_updates_pixel() {
        let mut fb = Framebuffer::new(4, 4);

        assert!(fb.write(5, 0xFF11_2233));

        assert_eq!(fb.snapshot().pixel(1, 1), Some(0xFF11_2233));
    }

    #[test]
    fn test_write_forces_full_alpha() {
        let mut fb = Framebuffer::new(2, 2);

        fb.write(0, 0x0012_3456);

        assert_eq!(fb.snapshot().pixels[0], 0xFF12_3456);
    }

    #[test]
    fn test_write_out_of_range_is_noop() {
        // Arrange
        let mut fb = Framebuffer::new(2, 2);
        let before = fb.clone();

        // Act
        let written = fb.write(4, 0xFFFF_FFFF);

        // Assert
        assert!(!written);
        assert_eq!(fb, before);
    }

    #[test]
    fn test_apply_frame_red_pixel_scenario() {
        let mut fb = Framebuffer::default();

        let stats = fb.apply_frame(&[0x00, 0x00, 0x00, 0x00, 0x00, 0xF8, 0x00, 0x00]);

        assert_eq!(stats.applied, 1);
        assert_eq!(fb.snapshot().pixels[0], 0xFF00_00FF);
        assert_eq!(fb.snapshot().pixels[1], OPAQUE_BLACK);
    }

    #[test]
    fn test_apply_frame_counts_drops_without_mutating() {
        // Arrange: one good record, one out of range, then 3 stray bytes.
        let mut fb = Framebuffer::new(8, 8);
        let mut frame = encode_pixel_update(63, 0xFFFF).to_vec();
        frame.extend_from_slice(&encode_pixel_update(64, 0xFFFF));
        frame.extend_from_slice(&[1, 2, 3]);

        // Act
        let stats = fb.apply_frame(&frame);

        // Assert
        assert_eq!(
            stats,
            FrameStats {
                applied: 1,
                out_of_range: 1,
                trailing_bytes: 3
            }
        );
        assert_eq!(fb.snapshot().pixels[63], 0xFFFF_FFFF);
        assert_eq!(fb.snapshot().pixels.iter().filter(|&&p| p != OPAQUE_BLACK).count(), 1);
    }

    #[test]
    fn test_later_record_in_same_frame_wins() {
        let mut fb = Framebuffer::new(2, 1);
        let mut frame = encode_pixel_update(0, 0xF800).to_vec();
        frame.extend_from_slice(&encode_pixel_update(0, 0x001F));

        fb.apply_frame(&frame);

        assert_eq!(fb.snapshot().pixels[0], 0xFFFF_0000);
    }

    #[test]
    fn test_reset_restores_black() {
        let mut fb = Framebuffer::new(2, 2);
        fb.write(3, 0xFFFF_FFFF);

        fb.reset();

        assert!(fb.snapshot().pixels.iter().all(|&p| p == OPAQUE_BLACK));
    }

    #[test]
    fn test_rgba_bytes_are_red_green_blue_alpha() {
        let mut fb = Framebuffer::new(1, 1);
        fb.apply_frame(&encode_pixel_update(0, 0xF800));

        assert_eq!(fb.snapshot().to_rgba_bytes(), vec![0xFF, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_view_pixel_outside_surface_is_none() {
        let fb = Framebuffer::new(3, 2);
        let view = fb.snapshot();

        assert_eq!(view.pixel(3, 0), None);
        assert_eq!(view.pixel(0, 2), None);
        assert_eq!(view.pixel(2, 1), Some(OPAQUE_BLACK));
    }

    #[test]
    fn test_view_pixel_index_does_not_overflow_u32() {
        // Arrange: dimensions whose product does not fit in a u32
        let pixels = [OPAQUE_BLACK; 4];
        let view = FrameView {
            width: 70_000,
            height: 70_000,
            pixels: &pixels,
        };

        // Act / Assert
        assert_eq!(view.pixel(69_999, 69_999), None);
        assert_eq!(view.pixel(3, 0), Some(OPAQUE_BLACK));
    }
}
