//! Opening backends by name.

use std::path::Path;

use tempfile::TempDir;
use tkv::{backends, default_registry, KvError, Registry, TkvConfig};

#[test]
fn every_builtin_backend_opens_by_name() {
    for name in backends::builtin_names() {
        let dir = TempDir::new().unwrap();
        let client = tkv::open(name, dir.path()).unwrap();
        assert_eq!(client.name(), name);
        assert!(dir.path().join("tkv.toml").exists());
    }
}

#[test]
fn unknown_name_fails_before_io() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("absent");
    let err = tkv::open("tikv", &target).unwrap_err();
    assert!(matches!(err, KvError::UnknownBackend(ref name) if name == "tikv"));
    assert!(!err.is_fatal());
    assert!(!target.exists());
}

#[test]
fn default_registry_lists_builtin_backends() {
    let mut expected = backends::builtin_names();
    expected.sort_unstable();
    assert_eq!(default_registry().names(), expected);
}

#[test]
fn invalid_config_is_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("tkv.toml"), "[lmdb]\nmax_readers = 0\n").unwrap();
    let err = tkv::open("native", dir.path()).unwrap_err();
    assert!(matches!(err, KvError::Config(_)));
}

#[test]
fn injected_table_can_alias_backends() {
    let mut registry = Registry::new();
    registry.register("meta", |dir: &Path, config: &TkvConfig| {
        backends::native::open(&dir.join("meta"), config)
    });

    let dir = TempDir::new().unwrap();
    let client = registry.open("meta", dir.path()).unwrap();
    assert_eq!(client.name(), "native");
    assert!(dir.path().join("meta").join("wal.log").exists());
}
