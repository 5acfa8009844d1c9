//! Key bounds for prefix scans
//!
//! A prefix scan over `p` is the half-open range `[p, next_key(p))`, where
//! `next_key(p)` is the smallest key greater than every key starting with `p`.

use crate::error::{KvError, KvResult};

/// Compute the exclusive upper bound of all keys sharing `key` as a prefix
///
/// Treats the key as a big-endian counter: the last byte that is not 0xFF is
/// incremented and every byte after it is dropped.
///
/// - empty key: `Ok(None)`, the range is open-ended
/// - all bytes 0xFF: `Err(KvError::KeyOverflow)`, no such key exists
///
/// # Example
///
/// ```
/// use tkv_core::bound::next_key;
///
/// assert_eq!(next_key(b"ab").unwrap(), Some(b"ac".to_vec()));
/// assert_eq!(next_key(&[0x01, 0xff]).unwrap(), Some(vec![0x02]));
/// assert_eq!(next_key(b"").unwrap(), None);
/// assert!(next_key(&[0xff, 0xff]).is_err());
/// ```
pub fn next_key(key: &[u8]) -> KvResult<Option<Vec<u8>>> {
    if key.is_empty() {
        return Ok(None);
    }
    match key.iter().rposition(|&b| b != 0xff) {
        Some(pos) => {
            let mut next = key[..=pos].to_vec();
            next[pos] += 1;
            Ok(Some(next))
        }
        None => Err(KvError::KeyOverflow(key.to_vec())),
    }
}

/// True when `[begin, end)` contains no key
///
/// `end == None` is unbounded and never empty.
pub fn is_empty_range(begin: &[u8], end: Option<&[u8]>) -> bool {
    matches!(end, Some(end) if begin >= end)
}

/// True when `key` lies inside `[begin, end)`
pub fn in_range(key: &[u8], begin: &[u8], end: Option<&[u8]>) -> bool {
    key >= begin && end.map_or(true, |end| key < end)
}
