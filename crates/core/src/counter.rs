//! Counter codec
//!
//! Counters are `i64` values stored as 8 little-endian bytes. Every backend
//! reads and writes this one layout.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{KvError, KvResult};

/// Encoded width of a counter value
pub const COUNTER_WIDTH: usize = 8;

/// Encode a counter
pub fn pack_counter(value: i64) -> [u8; COUNTER_WIDTH] {
    let mut buf = [0u8; COUNTER_WIDTH];
    LittleEndian::write_i64(&mut buf, value);
    buf
}

/// Decode a counter
///
/// # Errors
///
/// `KvError::InvalidCounter` when `buf` is not exactly [`COUNTER_WIDTH`]
/// bytes long. A malformed counter is a programming error in the caller's
/// key layout.
pub fn parse_counter(buf: &[u8]) -> KvResult<i64> {
    if buf.len() != COUNTER_WIDTH {
        return Err(KvError::InvalidCounter(buf.len()));
    }
    Ok(LittleEndian::read_i64(buf))
}
