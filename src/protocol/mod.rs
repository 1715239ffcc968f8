//! Length-prefixed framing
//!
//! Every message on the wire is a length prefix followed by exactly that many
//! payload bytes. There are no other framing rules.

pub mod constants;
pub mod decode;
pub mod encode;
pub mod message;

pub use decode::{decode_frame, FrameDecoder};
pub use encode::{encode_frame, encode_frames, put_prefix};
pub use message::{decode_payload, is_null_sentinel, LengthPrefix};
