//! Backend adapters
//!
//! Every adapter exposes `NAME` and `open(dir, config) -> KvResult<Client>`.
//! `native` is always built; the embedded engines are behind features.

pub mod native;

#[cfg(feature = "redb")]
pub mod redb;

#[cfg(feature = "lmdb")]
pub mod lmdb;

/// Names of the adapters compiled into this build
pub fn builtin_names() -> Vec<&'static str> {
    let mut names = vec![native::NAME];
    #[cfg(feature = "redb")]
    names.push(self::redb::NAME);
    #[cfg(feature = "lmdb")]
    names.push(lmdb::NAME);
    names
}
