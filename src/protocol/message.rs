//! Message-level wire details: the length prefix format and the null sentinel

use super::constants::{MAX_PREFIX_WIDTH, NULL_SENTINEL};
use crate::Error;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::mem::size_of;

/// Encoding of the length that precedes every payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthPrefix {
    /// 8-byte unsigned integer, little-endian
    #[default]
    U64Le,
    /// Pointer-width unsigned integer in host byte order.
    ///
    /// Only interoperates with peers of the same word size and endianness.
    Native,
}

impl LengthPrefix {
    /// Number of bytes the prefix occupies on the wire
    pub fn width(self) -> usize {
        match self {
            Self::U64Le => 8,
            Self::Native => size_of::<usize>(),
        }
    }

    /// Encode `len` into a fixed buffer.
    ///
    /// Only the first [`width`](Self::width) bytes of the returned array are meaningful.
    pub fn encode(self, len: usize) -> [u8; MAX_PREFIX_WIDTH] {
        let mut out = [0u8; MAX_PREFIX_WIDTH];
        match self {
            Self::U64Le => out.copy_from_slice(&(len as u64).to_le_bytes()),
            Self::Native => {
                let bytes = len.to_ne_bytes();
                out[..bytes.len()].copy_from_slice(&bytes);
            }
        }
        out
    }

    /// Decode a length from the first [`width`](Self::width) bytes of `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than the prefix width.
    pub fn decode(self, bytes: &[u8]) -> u64 {
        match self {
            Self::U64Le => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&bytes[..8]);
                u64::from_le_bytes(raw)
            }
            Self::Native => {
                let mut raw = [0u8; size_of::<usize>()];
                raw.copy_from_slice(&bytes[..size_of::<usize>()]);
                usize::from_ne_bytes(raw) as u64
            }
        }
    }
}

impl std::fmt::Display for LengthPrefix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::U64Le => write!(f, "u64le"),
            Self::Native => write!(f, "native"),
        }
    }
}

impl std::str::FromStr for LengthPrefix {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "u64le" => Ok(Self::U64Le),
            "native" => Ok(Self::Native),
            _ => Err(Error::Config(format!(
                "invalid length prefix '{}': expected u64le or native",
                s
            ))),
        }
    }
}

/// Check whether a payload is the one-byte "no data" sentinel
pub fn is_null_sentinel(payload: &[u8]) -> bool {
    payload == NULL_SENTINEL
}

/// Map a raw payload to its application value (sentinel becomes empty)
pub fn decode_payload(payload: Bytes) -> Bytes {
    if is_null_sentinel(&payload) {
        Bytes::new()
    } else {
        payload
    }
}
