//! Frame decoding

use super::constants::DEFAULT_MAX_MESSAGE_LENGTH;
use super::message::LengthPrefix;
use bytes::{Buf, Bytes, BytesMut};
use std::io;

/// Largest single buffer reservation made for a pending frame
const RESERVE_LIMIT: usize = 64 * 1024;

/// Decode one frame from the front of `data`
///
/// # Returns
/// `Ok((payload, consumed))` - payload and number of bytes the frame occupied
/// `Err(e)` - `UnexpectedEof` if the frame is incomplete, `InvalidData` if the
/// declared length exceeds `max_len`
pub fn decode_frame(
    prefix: LengthPrefix,
    data: &[u8],
    max_len: usize,
) -> io::Result<(Bytes, usize)> {
    let width = prefix.width();
    if data.len() < width {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "incomplete length prefix",
        ));
    }

    let len = checked_length(prefix.decode(data), max_len)?;

    if data.len() - width < len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "incomplete message body",
        ));
    }

    let payload = Bytes::copy_from_slice(&data[width..width + len]);
    Ok((payload, width + len))
}

/// Validate a declared length against the maximum
pub(crate) fn checked_length(declared: u64, max_len: usize) -> io::Result<usize> {
    if declared > max_len as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "message length {} exceeds maximum allowed {}",
                declared, max_len
            ),
        ));
    }
    Ok(declared as usize)
}

/// Incremental decoder for a byte stream split at arbitrary points.
///
/// Bytes are appended as they arrive; complete payloads are taken out in order.
#[derive(Debug)]
pub struct FrameDecoder {
    prefix: LengthPrefix,
    max_len: usize,
    buf: BytesMut,
}

impl FrameDecoder {
    /// Create a decoder with the default maximum message length
    pub fn new(prefix: LengthPrefix) -> Self {
        Self::with_max_length(prefix, DEFAULT_MAX_MESSAGE_LENGTH)
    }

    /// Create a decoder with a custom maximum message length
    pub fn with_max_length(prefix: LengthPrefix, max_len: usize) -> Self {
        Self {
            prefix,
            max_len,
            buf: BytesMut::with_capacity(8192),
        }
    }

    /// Append received bytes
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet returned as a frame
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Take the next complete payload, if one is buffered.
    ///
    /// An oversized declared length is an error; the decoder should be
    /// discarded since the stream can no longer be resynchronised.
    pub fn next_frame(&mut self) -> io::Result<Option<Bytes>> {
        let width = self.prefix.width();
        if self.buf.len() < width {
            return Ok(None);
        }

        let len = checked_length(self.prefix.decode(&self.buf), self.max_len)?;
        let frame_len = width.checked_add(len).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("message length {} overflows the frame size", len),
            )
        })?;
        if self.buf.len() < frame_len {
            // Grow with the data actually received, not the declared length
            self.buf
                .reserve((frame_len - self.buf.len()).min(RESERVE_LIMIT));
            return Ok(None);
        }

        self.buf.advance(width);
        Ok(Some(self.buf.split_to(len).freeze()))
    }
}
