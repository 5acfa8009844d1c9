//! Backend configuration via `tkv.toml`
//!
//! Each backend directory carries a `tkv.toml`. On first open a default file
//! is written; to change settings, edit the file and reopen. Every backend
//! reads only its own section.

use serde::{Deserialize, Serialize};
use std::path::Path;

use tkv_core::{KvError, KvResult};
use tkv_durability::DurabilityMode;

/// Config file name placed in the backend directory.
pub const CONFIG_FILE_NAME: &str = "tkv.toml";

/// Settings of the `native` backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NativeConfig {
    /// `"strict"`, `"batched"` or `"cache"`
    #[serde(default = "default_durability")]
    pub durability: String,
    /// Commits between fsyncs in batched mode
    #[serde(default = "default_sync_batch_size")]
    pub sync_batch_size: usize,
    /// WAL size that triggers compaction after a commit
    ///
    /// The log must also have doubled since the previous compaction.
    #[serde(default = "default_compact_threshold")]
    pub compact_threshold_bytes: u64,
}

fn default_durability() -> String {
    "batched".to_string()
}

fn default_sync_batch_size() -> usize {
    64
}

fn default_compact_threshold() -> u64 {
    64 * 1024 * 1024
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            durability: default_durability(),
            sync_batch_size: default_sync_batch_size(),
            compact_threshold_bytes: default_compact_threshold(),
        }
    }
}

impl NativeConfig {
    /// Parse the durability string into a `DurabilityMode`.
    ///
    /// # Errors
    ///
    /// `KvError::Config` for an unknown mode or a zero batch size.
    pub fn durability_mode(&self) -> KvResult<DurabilityMode> {
        match self.durability.as_str() {
            "strict" => Ok(DurabilityMode::Strict),
            "batched" if self.sync_batch_size == 0 => Err(KvError::Config(
                "native.sync_batch_size must be at least 1".to_string(),
            )),
            "batched" => Ok(DurabilityMode::Batched {
                batch_size: self.sync_batch_size,
            }),
            "cache" => Ok(DurabilityMode::Cache),
            other => Err(KvError::Config(format!(
                "invalid durability mode '{}'; expected \"strict\", \"batched\" or \"cache\"",
                other
            ))),
        }
    }
}

/// Settings of the `redb` backend
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedbConfig {
    /// Page cache size in bytes (redb's default when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_size: Option<usize>,
}

/// Settings of the `lmdb` backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LmdbConfig {
    /// Maximum size of the memory map in bytes
    #[serde(default = "default_map_size")]
    pub map_size: usize,
    /// Maximum number of concurrent read transactions
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,
}

fn default_map_size() -> usize {
    1024 * 1024 * 1024
}

fn default_max_readers() -> u32 {
    126
}

impl Default for LmdbConfig {
    fn default() -> Self {
        Self {
            map_size: default_map_size(),
            max_readers: default_max_readers(),
        }
    }
}

/// Backend configuration loaded from `tkv.toml`.
///
/// # Example
///
/// ```toml
/// [native]
/// durability = "batched"
/// sync_batch_size = 64
///
/// [lmdb]
/// map_size = 1073741824
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TkvConfig {
    /// `[native]` section
    #[serde(default)]
    pub native: NativeConfig,
    /// `[redb]` section
    #[serde(default)]
    pub redb: RedbConfig,
    /// `[lmdb]` section
    #[serde(default)]
    pub lmdb: LmdbConfig,
}

impl TkvConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# tkv backend configuration
#
# Only the section of the backend opened in this directory is used.

[native]
# "strict"  = fsync every commit
# "batched" = fsync every `sync_batch_size` commits (default)
# "cache"   = leave syncing to the OS
durability = "batched"
sync_batch_size = 64
# Rewrite the log as a single record once it grows past this size
# and has at least doubled since the previous rewrite
compact_threshold_bytes = 67108864

[redb]
# Page cache size in bytes; redb's default when unset
# cache_size = 1073741824

[lmdb]
map_size = 1073741824
max_readers = 126
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// `KvError::Config` if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> KvResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KvError::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: TkvConfig = toml::from_str(&content).map_err(|e| {
            KvError::Config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> KvResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Load `tkv.toml` from `dir`, writing the default first if missing
    pub fn load_or_create(dir: &Path) -> KvResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        Self::write_default_if_missing(&path)?;
        Self::from_file(&path)
    }

    /// Check every value eagerly
    pub fn validate(&self) -> KvResult<()> {
        self.native.durability_mode()?;
        if self.redb.cache_size == Some(0) {
            return Err(KvError::Config("redb.cache_size must be positive".to_string()));
        }
        if self.lmdb.map_size == 0 {
            return Err(KvError::Config("lmdb.map_size must be positive".to_string()));
        }
        if self.lmdb.max_readers == 0 {
            return Err(KvError::Config("lmdb.max_readers must be positive".to_string()));
        }
        Ok(())
    }
}
