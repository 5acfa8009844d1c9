//! Versioned values held by the native store

/// A value tagged with the commit version that wrote it
///
/// Versions are assigned by the commit path and increase monotonically.
/// Version 0 never appears on a stored value; it stands for "absent" in
/// read-set bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedValue {
    /// Opaque value bytes (may be empty)
    pub value: Vec<u8>,
    /// Commit version of the write
    pub version: u64,
}

impl VersionedValue {
    /// Create a new versioned value
    pub fn new(value: Vec<u8>, version: u64) -> Self {
        Self { value, version }
    }
}
