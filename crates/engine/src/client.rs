//! Client: one opened backend plus the `txn` entry point
//!
//! Every call to [`Client::txn`] opens a fresh transaction, hands it to the
//! caller's closure and then commits or rolls back:
//!
//! ```text
//! Open -> Running -> Committing -> Committed
//!                 \-> RolledBack
//! ```
//!
//! A transaction is used exactly once. The client is cheap to clone and can
//! be shared between threads; each call gets an independent transaction.

use std::sync::Arc;
use std::thread;

use tracing::{error, warn};

use tkv_core::{Engine, KvError, KvResult, Transaction};

use crate::retry::RetryConfig;

/// Handle to one opened backend
#[derive(Clone)]
pub struct Client {
    engine: Arc<dyn Engine>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("backend", &self.engine.name())
            .finish()
    }
}

impl Client {
    /// Wrap an opened engine
    pub fn new(engine: impl Engine + 'static) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    /// Backend identity, e.g. `"native"`
    pub fn name(&self) -> &'static str {
        self.engine.name()
    }

    /// Run `work` in a fresh transaction and commit it if `work` succeeds
    ///
    /// If `work` returns an error the transaction is rolled back and the
    /// error is returned untouched. Commit failures are converted with
    /// `E::from`. Nothing is retried; a caller that sees
    /// `KvError::Conflict` re-runs its whole unit of work.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let n = client.txn(|tx| {
    ///     tx.set(b"a", &[1])?;
    ///     tx.incr_by(b"c", 5)
    /// })?;
    /// ```
    pub fn txn<T, E, F>(&self, work: F) -> Result<T, E>
    where
        E: From<KvError>,
        F: FnOnce(&mut dyn Transaction) -> Result<T, E>,
    {
        let mut tx = self.begin()?;

        match work(&mut *tx) {
            Ok(value) => {
                tx.commit().map_err(|e| E::from(self.report(e)))?;
                Ok(value)
            }
            Err(e) => {
                tx.rollback();
                Err(e)
            }
        }
    }

    /// Like [`Client::txn`], but re-runs `work` after a commit conflict
    ///
    /// Only `KvError::Conflict` is retried, at most `config.max_retries`
    /// times with exponential backoff. Every attempt starts from scratch.
    pub fn txn_with_retry<T, F>(&self, config: &RetryConfig, mut work: F) -> KvResult<T>
    where
        F: FnMut(&mut dyn Transaction) -> KvResult<T>,
    {
        let mut attempt = 0;
        loop {
            match self.txn(&mut work) {
                Err(e) if e.is_retryable() && attempt < config.max_retries => {
                    warn!(
                        target: "tkv::client",
                        backend = self.name(),
                        attempt = attempt + 1,
                        "Retrying after conflict"
                    );
                    thread::sleep(config.delay_for(attempt));
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn begin(&self) -> KvResult<Box<dyn Transaction + '_>> {
        self.engine.begin().map_err(|e| self.report(e))
    }

    fn report(&self, e: KvError) -> KvError {
        if e.is_fatal() {
            error!(target: "tkv::client", backend = self.name(), error = %e, "Fatal storage fault");
        }
        e
    }
}
