//! Frame encoding

use super::message::LengthPrefix;
use bytes::{BufMut, BytesMut};

/// Append a length prefix for a payload of `len` bytes
pub fn put_prefix(buf: &mut BytesMut, prefix: LengthPrefix, len: usize) {
    let encoded = prefix.encode(len);
    buf.put_slice(&encoded[..prefix.width()]);
}

/// Encode one payload into a complete frame
pub fn encode_frame(prefix: LengthPrefix, payload: &[u8]) -> BytesMut {
    encode_frames(prefix, &[payload])
}

/// Encode several fragments as a single frame.
///
/// The prefix carries the summed length, followed by each fragment in order,
/// so the result is byte-identical to framing the concatenation.
pub fn encode_frames(prefix: LengthPrefix, fragments: &[&[u8]]) -> BytesMut {
    let total: usize = fragments.iter().map(|f| f.len()).sum();
    let mut buf = BytesMut::with_capacity(prefix.width() + total);

    put_prefix(&mut buf, prefix, total);
    for fragment in fragments {
        buf.put_slice(fragment);
    }

    buf
}
