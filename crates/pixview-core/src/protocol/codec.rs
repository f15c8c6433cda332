//! Binary codec for PixView wire records.
//!
//! Inbound wire format (one record, repeated):
//! ```text
//! [index:4][color:4]   little-endian; only the low 16 bits of color are RGB565
//! ```
//! Outbound wire format:
//! ```text
//! [command:1][x:2][y:2]   little-endian
//! ```
//!
//! Decoding is a best-effort filter over a trusted stream: it never fails.
//! A trailing run of fewer than [`PIXEL_RECORD_SIZE`] bytes is ignored.

use std::iter::FusedIterator;
use std::slice::ChunksExact;

use thiserror::Error;

use crate::protocol::messages::{
    CommandKind, PixelUpdate, TouchCommand, ALPHA_MASK, PIXEL_RECORD_SIZE, TOUCH_COMMAND_SIZE,
};

/// Errors that can occur while decoding a touch command.
///
/// Pixel-update decoding has no error type: malformed input is dropped.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// The byte slice is shorter than a full command.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The command byte is neither `1` nor `2`.
    #[error("unknown touch command: 0x{0:02X}")]
    UnknownCommand(u8),
}

// ── Colour expansion ──────────────────────────────────────────────────────────

/// Expands a 5-bit channel to 8 bits by replicating its high bits.
///
/// `expand5(31) == 255`, `expand5(0) == 0`.
#[inline]
pub const fn expand5(v: u8) -> u8 {
    let v = v & 0x1F;
    (v << 3) | (v >> 2)
}

/// Expands a 6-bit channel to 8 bits by replicating its high bits.
///
/// `expand6(63) == 255`, `expand6(0) == 0`.
#[inline]
pub const fn expand6(v: u8) -> u8 {
    let v = v & 0x3F;
    (v << 2) | (v >> 4)
}

/// Converts an RGB565 word into a packed `0xAABBGGRR` pixel with full alpha.
///
/// Red occupies bits 15..11, green bits 10..5 and blue bits 4..0.
///
/// # Examples
///
/// ```rust
/// use pixview_core::protocol::codec::rgb565_to_packed;
///
/// assert_eq!(rgb565_to_packed(0xF800), 0xFF00_00FF); // pure red
/// assert_eq!(rgb565_to_packed(0x001F), 0xFFFF_0000); // pure blue
/// ```
#[inline]
pub const fn rgb565_to_packed(color: u16) -> u32 {
    let r = expand5((color >> 11) as u8) as u32;
    let g = expand6(((color >> 5) & 0x3F) as u8) as u32;
    let b = expand5((color & 0x1F) as u8) as u32;
    ALPHA_MASK | (b << 16) | (g << 8) | r
}

// ── Pixel updates (inbound) ───────────────────────────────────────────────────

/// Iterator over the complete pixel-update records of a frame.
///
/// Created by [`decode_pixel_updates`].
#[derive(Debug, Clone)]
pub struct PixelUpdates<'a> {
    records: ChunksExact<'a, u8>,
}

impl<'a> PixelUpdates<'a> {
    /// Number of trailing bytes that do not form a complete record.
    pub fn trailing_len(&self) -> usize {
        self.records.remainder().len()
    }
}

impl Iterator for PixelUpdates<'_> {
    type Item = PixelUpdate;

    fn next(&mut self) -> Option<PixelUpdate> {
        self.records.next().map(decode_record)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}

impl ExactSizeIterator for PixelUpdates<'_> {}
impl FusedIterator for PixelUpdates<'_> {}

/// Decodes a binary frame into pixel updates, in wire order.
///
/// Only complete 8-byte records are yielded; anything left over is ignored.
///
/// # Examples
///
/// ```rust
/// use pixview_core::protocol::codec::decode_pixel_updates;
///
/// let frame = [0x00, 0x00, 0x00, 0x00, 0x00, 0xF8, 0x00, 0x00, 0xAA];
/// let updates: Vec<_> = decode_pixel_updates(&frame).collect();
/// assert_eq!(updates.len(), 1);
/// assert_eq!(updates[0].index, 0);
/// assert_eq!(updates[0].packed, 0xFF00_00FF);
/// ```
pub fn decode_pixel_updates(frame: &[u8]) -> PixelUpdates<'_> {
    PixelUpdates {
        records: frame.chunks_exact(PIXEL_RECORD_SIZE),
    }
}

fn decode_record(record: &[u8]) -> PixelUpdate {
    let index = u32::from_le_bytes([record[0], record[1], record[2], record[3]]);
    // Bytes 6..8 are the high half of the colour word and carry nothing.
    let color = u16::from_le_bytes([record[4], record[5]]);
    PixelUpdate {
        index,
        packed: rgb565_to_packed(color),
    }
}

/// Encodes one pixel-update record.
///
/// Viewers never send these; this exists for test servers and benchmarks.
/// The ignored upper half of the colour word is written as zero.
pub fn encode_pixel_update(index: u32, color: u16) -> [u8; PIXEL_RECORD_SIZE] {
    let mut buf = [0u8; PIXEL_RECORD_SIZE];
    buf[0..4].copy_from_slice(&index.to_le_bytes());
    buf[4..6].copy_from_slice(&color.to_le_bytes());
    buf
}

// ── Touch commands (outbound) ─────────────────────────────────────────────────

/// Encodes a touch command into its 5-byte wire form.
///
/// # Examples
///
/// ```rust
/// use pixview_core::protocol::codec::encode_touch_command;
/// use pixview_core::protocol::messages::CommandKind;
///
/// let bytes = encode_touch_command(CommandKind::ContactActive, 10, 20);
/// assert_eq!(bytes, [0x01, 0x0A, 0x00, 0x14, 0x00]);
/// ```
pub fn encode_touch_command(kind: CommandKind, x: u16, y: u16) -> [u8; TOUCH_COMMAND_SIZE] {
    let x = x.to_le_bytes();
    let y = y.to_le_bytes();
    [kind as u8, x[0], x[1], y[0], y[1]]
}

/// Decodes a touch command from the start of `bytes`.
///
/// # Errors
///
/// Returns [`ProtocolError::InsufficientData`] if fewer than 5 bytes are
/// available and [`ProtocolError::UnknownCommand`] for a command byte other
/// than `1` or `2`.
pub fn decode_touch_command(bytes: &[u8]) -> Result<TouchCommand, ProtocolError> {
    if bytes.len() < TOUCH_COMMAND_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: TOUCH_COMMAND_SIZE,
            available: bytes.len(),
        });
    }

    let kind = CommandKind::try_from(bytes[0]).map_err(|_| ProtocolError::UnknownCommand(bytes[0]))?;
    let x = u16::from_le_bytes([bytes[1], bytes[2]]);
    let y = u16::from_le_bytes([bytes[3], bytes[4]]);
    Ok(TouchCommand { kind, x, y })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
