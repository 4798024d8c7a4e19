use std::{
    collections::HashMap,
    sync::RwLock,
};

use anyhow::Result;

use crate::RecordStore;

/// In-memory record store for tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let records = self.records.read().unwrap();
        Ok(records.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut records = self.records.write().unwrap();
        records.remove(key);
        Ok(())
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let store = MemoryStore::new();
        store.set("selectedZaloAccountId", "42").unwrap();
        assert_eq!(
            store.get("selectedZaloAccountId").unwrap().as_deref(),
            Some("42")
        );
        store.remove("selectedZaloAccountId").unwrap();
        assert!(store.get("selectedZaloAccountId").unwrap().is_none());
    }
}
