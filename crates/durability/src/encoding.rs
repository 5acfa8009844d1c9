//! WAL record encoding and decoding
//!
//! This module frames WAL records with a CRC32 checksum for corruption
//! detection.
//!
//! ## Entry Format
//!
//! ```text
//! [length: u32][type: u8][payload: bytes][crc32: u32]
//! ```
//!
//! - **length**: size of type + payload + crc (NOT including length itself),
//!   little-endian
//! - **type**: record type tag (1 = committed transaction)
//! - **payload**: bincode-serialized [`WalRecord`]
//! - **crc32**: CRC32 over \[type\]\[payload\], little-endian
//!
//! A record cut short at the end of the buffer is reported as
//! [`Decoded::Incomplete`]; a checksum mismatch or an undecodable payload is
//! `KvError::Corruption`.

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};
use crc32fast::Hasher;

use tkv_core::{KvError, KvResult};

use crate::wal::WalRecord;

/// Type tag of a committed-transaction record
const TYPE_COMMIT: u8 = 1;

/// Bytes taken by the length prefix
const LEN_PREFIX: usize = 4;

/// Smallest valid `length`: type(1) + crc(4)
const MIN_BODY: usize = 5;

/// Outcome of decoding one record from the front of a buffer
#[derive(Debug, PartialEq, Eq)]
pub enum Decoded {
    /// A complete record and the number of bytes it occupied
    Record(WalRecord, usize),
    /// The buffer ends before the record does (torn write)
    Incomplete,
}

/// Encode a record to bytes ready for appending
pub fn encode_record(record: &WalRecord) -> KvResult<Vec<u8>> {
    let payload = bincode::serialize(record)?;
    let total_len = 1 + payload.len() + 4;

    let mut buf = Vec::with_capacity(LEN_PREFIX + total_len);
    buf.write_u32::<LittleEndian>(total_len as u32)?;
    buf.write_u8(TYPE_COMMIT)?;
    buf.extend_from_slice(&payload);

    let mut hasher = Hasher::new();
    hasher.update(&[TYPE_COMMIT]);
    hasher.update(&payload);
    buf.write_u32::<LittleEndian>(hasher.finalize())?;

    Ok(buf)
}

/// Decode the record at the front of `buf`
///
/// `offset` is the file position of `buf[0]`, used in error messages.
pub fn decode_record(buf: &[u8], offset: u64) -> KvResult<Decoded> {
    if buf.len() < LEN_PREFIX {
        return Ok(Decoded::Incomplete);
    }
    let total_len = LittleEndian::read_u32(&buf[..LEN_PREFIX]) as usize;

    // Checked before any arithmetic on the length
    if total_len < MIN_BODY {
        return Err(KvError::Corruption(format!(
            "offset {}: invalid entry length {} (minimum is {})",
            offset, total_len, MIN_BODY
        )));
    }
    if buf.len() < LEN_PREFIX + total_len {
        return Ok(Decoded::Incomplete);
    }

    let body = &buf[LEN_PREFIX..LEN_PREFIX + total_len];
    let type_tag = body[0];
    let payload = &body[1..total_len - 4];
    let expected_crc = LittleEndian::read_u32(&body[total_len - 4..]);

    let mut hasher = Hasher::new();
    hasher.update(&[type_tag]);
    hasher.update(payload);
    let actual_crc = hasher.finalize();
    if actual_crc != expected_crc {
        return Err(KvError::Corruption(format!(
            "offset {}: CRC mismatch: expected {:08x}, got {:08x}",
            offset, expected_crc, actual_crc
        )));
    }

    if type_tag != TYPE_COMMIT {
        return Err(KvError::Corruption(format!(
            "offset {}: unknown record type {}",
            offset, type_tag
        )));
    }

    let record: WalRecord = bincode::deserialize(payload).map_err(|e| {
        KvError::Corruption(format!("offset {}: deserialization failed: {}", offset, e))
    })?;

    Ok(Decoded::Record(record, LEN_PREFIX + total_len))
}

/// Decode every complete record in `buf`
///
/// Returns the records and the length of the valid prefix. Bytes past the
/// valid prefix belong to an incomplete trailing record.
pub fn decode_all(buf: &[u8]) -> KvResult<(Vec<WalRecord>, usize)> {
    let mut records = Vec::new();
    let mut pos = 0;
    while pos < buf.len() {
        match decode_record(&buf[pos..], pos as u64)? {
            Decoded::Record(record, consumed) => {
                records.push(record);
                pos += consumed;
            }
            Decoded::Incomplete => break,
        }
    }
    Ok((records, pos))
}
