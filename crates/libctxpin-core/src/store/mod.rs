//! Key-value persistence
//!
//! Values are JSON documents addressed by string key. [`SledStore`] is the
//! durable backend; [`MemoryStore`] backs tests and ephemeral sessions.

mod sled_store;

pub use sled_store::{LockedStore, SledStore, StoreStats};

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use crate::error::CtxpinError;

/// A single write in an atomic batch
#[derive(Debug, Clone, PartialEq)]
pub enum KvOp {
    Set { key: String, value: Value },
    Remove { key: String },
}

impl KvOp {
    pub fn set(key: impl Into<String>, value: Value) -> Self {
        KvOp::Set {
            key: key.into(),
            value,
        }
    }

    pub fn remove(key: impl Into<String>) -> Self {
        KvOp::Remove { key: key.into() }
    }
}

/// Generic JSON key-value store
pub trait KvStore: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<Value>, CtxpinError>;

    fn set_item(&self, key: &str, value: &Value) -> Result<(), CtxpinError>;

    fn remove_item(&self, key: &str) -> Result<(), CtxpinError>;

    /// Apply every op or none of them
    fn apply(&self, ops: Vec<KvOp>) -> Result<(), CtxpinError>;

    /// All keys, in byte order
    fn keys(&self) -> Result<Vec<String>, CtxpinError>;

    fn flush(&self) -> Result<(), CtxpinError> {
        Ok(())
    }
}

impl<S: KvStore + ?Sized> KvStore for &S {
    fn get_item(&self, key: &str) -> Result<Option<Value>, CtxpinError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &Value) -> Result<(), CtxpinError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), CtxpinError> {
        (**self).remove_item(key)
    }

    fn apply(&self, ops: Vec<KvOp>) -> Result<(), CtxpinError> {
        (**self).apply(ops)
    }

    fn keys(&self) -> Result<Vec<String>, CtxpinError> {
        (**self).keys()
    }

    fn flush(&self) -> Result<(), CtxpinError> {
        (**self).flush()
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> Result<MutexGuard<'_, BTreeMap<String, Value>>, CtxpinError> {
        self.items
            .lock()
            .map_err(|_| CtxpinError::Internal("memory store lock poisoned".to_string()))
    }
}

impl KvStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<Value>, CtxpinError> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &Value) -> Result<(), CtxpinError> {
        self.items()?.insert(key.to_string(), value.clone());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CtxpinError> {
        self.items()?.remove(key);
        Ok(())
    }

    fn apply(&self, ops: Vec<KvOp>) -> Result<(), CtxpinError> {
        // Single guard for the whole batch
        let mut items = self.items()?;
        for op in ops {
            match op {
                KvOp::Set { key, value } => {
                    items.insert(key, value);
                }
                KvOp::Remove { key } => {
                    items.remove(&key);
                }
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CtxpinError> {
        Ok(self.items()?.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memory_store_get_set_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get_item("savedContext").unwrap(), None);

        store.set_item("savedContext", &json!([1, 2])).unwrap();
        assert_eq!(store.get_item("savedContext").unwrap(), Some(json!([1, 2])));

        store.remove_item("savedContext").unwrap();
        assert_eq!(store.get_item("savedContext").unwrap(), None);
        // Removing an absent key is fine
        store.remove_item("savedContext").unwrap();
    }

    #[test]
    fn test_memory_store_batch() {
        let store = MemoryStore::new();
        store.set_item("b", &json!("old")).unwrap();

        store
            .apply(vec![KvOp::set("a", json!(1)), KvOp::remove("b"), KvOp::set("c", json!(3))])
            .unwrap();

        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "c".to_string()]);
    }

    fn write_flag<S: KvStore>(store: S) {
        store.set_item("k", &json!(true)).unwrap();
    }

    #[test]
    fn test_store_usable_through_reference() {
        let store = MemoryStore::new();
        write_flag(&store);
        assert_eq!(store.get_item("k").unwrap(), Some(json!(true)));
    }
}
