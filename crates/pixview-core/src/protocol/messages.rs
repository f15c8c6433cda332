//! PixView wire message types.
//!
//! Two fixed-size little-endian records travel over the socket:
//!
//! ```text
//! server -> viewer   [index:4][rgb565:2][ignored:2]      PIXEL_RECORD_SIZE = 8
//! viewer -> server   [command:1][x:2][y:2]               TOUCH_COMMAND_SIZE = 5
//! ```
//!
//! There is no header, no version byte and no length prefix: a binary frame
//! is simply a run of records.

// ── Protocol constants ────────────────────────────────────────────────────────

/// Size of one inbound pixel-update record in bytes.
pub const PIXEL_RECORD_SIZE: usize = 8;

/// Size of one outbound touch command in bytes.
pub const TOUCH_COMMAND_SIZE: usize = 5;

/// Alpha byte mask of a packed pixel (`0xAABBGGRR`).
pub const ALPHA_MASK: u32 = 0xFF00_0000;

/// Packed value of an opaque black pixel.
pub const OPAQUE_BLACK: u32 = ALPHA_MASK;

// ── Inbound ───────────────────────────────────────────────────────────────────

/// One decoded framebuffer write.
///
/// `packed` is laid out as alpha, blue, green, red from the most significant
/// byte down, so `packed.to_le_bytes()` yields `[r, g, b, a]` for raster
/// consumers.  The alpha byte is always `0xFF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelUpdate {
    /// Position in the framebuffer's pixel array (row-major).  Not validated
    /// against any framebuffer size.
    pub index: u32,
    /// Packed `0xAABBGGRR` colour.
    pub packed: u32,
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// Touch command byte sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandKind {
    /// At least one contact is still held (press or drag).
    ContactActive = 0x01,
    /// The last contact was lifted.
    ContactReleased = 0x02,
}

impl TryFrom<u8> for CommandKind {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(CommandKind::ContactActive),
            0x02 => Ok(CommandKind::ContactReleased),
            _ => Err(()),
        }
    }
}

/// A pointer/touch report in framebuffer coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchCommand {
    pub kind: CommandKind,
    pub x: u16,
    pub y: u16,
}

impl TouchCommand {
    /// Creates a command of the given kind at `(x, y)`.
    pub fn new(kind: CommandKind, x: u16, y: u16) -> Self {
        Self { kind, x, y }
    }
}
