//! Protocol module containing the wire record types and the binary codec.

pub mod codec;
pub mod messages;

pub use codec::{
    decode_pixel_updates, decode_touch_command, encode_pixel_update, encode_touch_command,
    expand5, expand6, rgb565_to_packed, PixelUpdates, ProtocolError,
};
pub use messages::*;
