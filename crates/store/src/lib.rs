//! Persistence port for ztool's client-side records.
//!
//! Records live behind the [`RecordStore`] trait so the file-backed store
//! can be swapped for an in-memory fake in tests.

pub mod file;
pub mod memory;
pub mod records;

pub use {file::FileStore, memory::MemoryStore};

use anyhow::Result;

/// Key/value storage for named records.
pub trait RecordStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}
