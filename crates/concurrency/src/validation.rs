//! Transaction validation for OCC
//!
//! Rules:
//! - First-committer-wins based on the READ-SET, not the write-set
//! - Blind writes (write without read) do NOT conflict
//! - Keys visited by scans are part of the read-set
//! - Write skew is ALLOWED

use std::collections::HashMap;
use std::fmt;

use tkv_core::Storage;

/// Conflicts that can fail validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// A key was read at one version but storage now holds another
    ReadWriteConflict {
        /// The key that has a conflict
        key: Vec<u8>,
        /// Version recorded in read_set when read (0 = absent)
        read_version: u64,
        /// Current version in storage at validation time (0 = absent)
        current_version: u64,
    },
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictType::ReadWriteConflict {
                key,
                read_version,
                current_version,
            } => write!(
                f,
                "key {:02x?} read at version {} is now at version {}",
                key, read_version, current_version
            ),
        }
    }
}

/// Result of transaction validation
///
/// A transaction commits only if `is_valid()` returns true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// All conflicts detected during validation
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// A successful validation result (no conflicts)
    pub fn ok() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }
}

/// Validate the read-set against current storage state
///
/// Every key whose current version differs from the version recorded when
/// it was read is reported. A key that was absent (version 0) and has since
/// been created conflicts too.
pub fn validate_read_set<S: Storage + ?Sized>(
    read_set: &HashMap<Vec<u8>, u64>,
    store: &S,
) -> ValidationResult {
    let mut result = ValidationResult::ok();
    for (key, &read_version) in read_set {
        let current_version = store.get_version(key);
        if current_version != read_version {
            result.conflicts.push(ConflictType::ReadWriteConflict {
                key: key.clone(),
                read_version,
                current_version,
            });
        }
    }
    result
}
