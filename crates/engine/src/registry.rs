//! Backend registry: name -> constructor
//!
//! A [`Registry`] is an explicit table built at startup and passed to
//! whoever opens backends. For hosts that want a process-wide table,
//! [`default_registry`] is initialized once with every compiled-in backend
//! and is read-only afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::debug;

use tkv_core::{KvError, KvResult};

use crate::backends;
use crate::client::Client;
use crate::config::TkvConfig;

/// Builds a client for a backend directory
pub type Constructor = Arc<dyn Fn(&Path, &TkvConfig) -> KvResult<Client> + Send + Sync>;

/// Table of named backend constructors
#[derive(Clone, Default)]
pub struct Registry {
    constructors: BTreeMap<String, Constructor>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("backends", &self.names())
            .finish()
    }
}

impl Registry {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table with every backend compiled into this build
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(backends::native::NAME, backends::native::open);
        #[cfg(feature = "redb")]
        registry.register(backends::redb::NAME, backends::redb::open);
        #[cfg(feature = "lmdb")]
        registry.register(backends::lmdb::NAME, backends::lmdb::open);
        registry
    }

    /// Record a constructor, replacing any earlier one with the same name
    pub fn register<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&Path, &TkvConfig) -> KvResult<Client> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.to_string(), Arc::new(constructor));
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// Open backend `name` in directory `address`
    ///
    /// The directory is created if missing and its `tkv.toml` loaded (or
    /// written with defaults) before the constructor runs.
    ///
    /// # Errors
    ///
    /// `KvError::UnknownBackend` if `name` was never registered; nothing
    /// touches the filesystem in that case. Otherwise whatever the directory
    /// setup or the constructor reports.
    pub fn open(&self, name: &str, address: impl AsRef<Path>) -> KvResult<Client> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| KvError::UnknownBackend(name.to_string()))?;

        let dir = address.as_ref();
        std::fs::create_dir_all(dir)?;
        let config = TkvConfig::load_or_create(dir)?;
        debug!(target: "tkv::registry", backend = name, path = %dir.display(), "Opening backend");
        constructor(dir, &config)
    }
}

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::with_builtin);

/// Process-wide registry holding the compiled-in backends
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Open a compiled-in backend by name
pub fn open(name: &str, address: impl AsRef<Path>) -> KvResult<Client> {
    default_registry().open(name, address)
}
