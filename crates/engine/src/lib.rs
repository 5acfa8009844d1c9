//! Backends, client and registry for tkv
//!
//! This crate turns the contract in `tkv-core` into something a host opens:
//! - Backend adapters: native (store + WAL + OCC), redb, lmdb
//! - Client: runs a closure in a fresh transaction and commits or rolls back
//! - Registry: resolves a backend name and directory to a Client
//! - Config: the `tkv.toml` file in each backend directory

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backends;
pub mod client;
pub mod config;
pub mod registry;
pub mod retry;

pub use client::Client;
pub use config::{LmdbConfig, NativeConfig, RedbConfig, TkvConfig};
pub use registry::{default_registry, open, Constructor, Registry};
pub use retry::RetryConfig;
