//! Error types for tkv
//!
//! Every layer reports failures through [`KvError`]. We use `thiserror` for
//! the `Display` and `Error` implementations.
//!
//! # Fatal vs. recoverable
//!
//! Storage faults are returned as values, never raised as panics. Whether a
//! fault is fatal is an explicit classification ([`KvError::is_fatal`]): the
//! layer cannot repair a broken engine handle or corrupted files, so the host
//! is expected to stop using the backend. Conflicts and caller aborts are
//! recoverable.

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for tkv operations
pub type KvResult<T> = std::result::Result<T, KvError>;

/// Error types for the transactional key-value layer
#[derive(Debug, Error)]
pub enum KvError {
    /// No backend constructor is registered under this name
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// I/O error (files, directories, locks)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fault reported by an embedded engine's native API
    #[error("{engine} engine error: {message}")]
    Engine {
        /// Backend name that reported the fault
        engine: &'static str,
        /// Native error message
        message: String,
    },

    /// On-disk data failed an integrity check
    #[error("data corruption: {0}")]
    Corruption(String),

    /// Commit lost an optimistic conflict; re-run the whole unit of work
    #[error("transaction conflict: {0}")]
    Conflict(String),

    /// No key sorts after every key with this prefix (all bytes are 0xFF)
    #[error("no upper bound exists for key {0:02x?}: every byte is 0xff")]
    KeyOverflow(Vec<u8>),

    /// A counter key holds a value that is not an 8-byte counter
    #[error("invalid counter value: expected 8 bytes, found {0}")]
    InvalidCounter(usize),

    /// Counter arithmetic left the i64 range
    #[error("counter overflow: {current} + {delta}")]
    CounterOverflow {
        /// Counter value before the increment
        current: i64,
        /// Requested delta
        delta: i64,
    },

    /// Operation on a transaction that already left the active state
    #[error("transaction is not active: {0}")]
    NotActive(String),

    /// Invalid or unreadable configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Rollback requested by the unit of work itself
    #[error("transaction aborted: {0}")]
    Aborted(String),
}

impl KvError {
    /// Wrap a native engine error
    pub fn engine(engine: &'static str, err: impl fmt::Display) -> Self {
        KvError::Engine {
            engine,
            message: err.to_string(),
        }
    }

    /// Caller-side rollback with a reason
    pub fn aborted(reason: impl Into<String>) -> Self {
        KvError::Aborted(reason.into())
    }

    /// Whether the backend can no longer be trusted after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            KvError::Io(_)
                | KvError::Engine { .. }
                | KvError::Corruption(_)
                | KvError::KeyOverflow(_)
                | KvError::InvalidCounter(_)
                | KvError::Serialization(_)
        )
    }

    /// Whether re-running the unit of work from scratch may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, KvError::Conflict(_))
    }
}

impl From<bincode::Error> for KvError {
    fn from(e: bincode::Error) -> Self {
        KvError::Serialization(e.to_string())
    }
}
