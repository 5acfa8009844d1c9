//! Shared helpers: run every check against every compiled-in backend.

#![allow(dead_code)]

use tempfile::TempDir;
use tkv::{backends, Client, KvResult, Registry};

/// A freshly opened backend in its own directory
pub struct Backend {
    pub name: &'static str,
    pub client: Client,
    pub dir: TempDir,
}

impl Backend {
    /// Drop the client and open the same directory again
    pub fn reopen(self) -> Backend {
        let Backend { name, client, dir } = self;
        drop(client);
        let client = Registry::with_builtin().open(name, dir.path()).unwrap();
        Backend { name, client, dir }
    }
}

/// Route library logs to the test writer; shown with `--nocapture`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

/// Open one instance of every backend compiled into this build
pub fn all_backends() -> Vec<Backend> {
    init_tracing();
    let registry = Registry::with_builtin();
    backends::builtin_names()
        .into_iter()
        .map(|name| {
            let dir = TempDir::new().unwrap();
            let client = registry.open(name, dir.path()).unwrap();
            Backend { name, client, dir }
        })
        .collect()
}

/// Commit one pair in its own transaction
pub fn seed(client: &Client, key: &[u8], value: &[u8]) {
    client.txn(|tx| tx.set(key, value)).unwrap();
}

/// Commit string pairs in one transaction
pub fn seed_all(client: &Client, pairs: &[(&str, &str)]) {
    client
        .txn(|tx| -> KvResult<()> {
            for (k, v) in pairs {
                tx.set(k.as_bytes(), v.as_bytes())?;
            }
            Ok(())
        })
        .unwrap();
}

/// Read one key in its own transaction
pub fn read(client: &Client, key: &[u8]) -> Option<Vec<u8>> {
    client.txn(|tx| tx.get(key)).unwrap()
}
