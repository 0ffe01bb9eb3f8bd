use std::fs::File;
use std::path::Path;
use std::time::{Duration, Instant};

use fs2::FileExt;
use serde_json::Value;
use tracing::debug;

use super::{KvOp, KvStore};
use crate::error::CtxpinError;

/// Statistics about the database
#[derive(Debug)]
pub struct StoreStats {
    pub path: String,
    pub size_bytes: u64,
    pub key_count: usize,
}

/// A SledStore with filesystem-level exclusive lock.
///
/// The lock is held for the lifetime of this struct and released when
/// dropped, so two processes never open the same sled database.
pub struct LockedStore {
    /// Lock file handle - flock released on drop
    _lock_file: File,
    store: SledStore,
}

impl std::fmt::Debug for LockedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockedStore")
            .field("store", &"SledStore { ... }")
            .finish()
    }
}

impl std::ops::Deref for LockedStore {
    type Target = SledStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl KvStore for LockedStore {
    fn get_item(&self, key: &str) -> Result<Option<Value>, CtxpinError> {
        self.store.get_item(key)
    }

    fn set_item(&self, key: &str, value: &Value) -> Result<(), CtxpinError> {
        self.store.set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), CtxpinError> {
        self.store.remove_item(key)
    }

    fn apply(&self, ops: Vec<KvOp>) -> Result<(), CtxpinError> {
        self.store.apply(ops)
    }

    fn keys(&self) -> Result<Vec<String>, CtxpinError> {
        self.store.keys()
    }

    fn flush(&self) -> Result<(), CtxpinError> {
        self.store.flush()
    }
}

/// Durable key-value store backed by sled
pub struct SledStore {
    db: sled::Db,
    items: sled::Tree,
}

impl SledStore {
    /// Open or create a store at the given path
    pub fn open(path: &Path) -> Result<Self, CtxpinError> {
        let db = sled::open(path)?;
        let items = db.open_tree("items")?;
        Ok(Self { db, items })
    }

    /// Open store with exclusive filesystem lock (non-blocking).
    ///
    /// Lock file is created at `<path>.lock`. Returns `CtxpinError::DbBusy`
    /// if another process holds the lock.
    pub fn open_locked(path: &Path) -> Result<LockedStore, CtxpinError> {
        let lock_path = path.with_extension("lock");
        let lock_file = File::create(&lock_path)?;

        lock_file.try_lock_exclusive().map_err(|e| {
            CtxpinError::database_locked(Some(&e.to_string()))
        })?;

        let store = Self::open(path)?;
        Ok(LockedStore {
            _lock_file: lock_file,
            store,
        })
    }

    /// Open store with exclusive filesystem lock, retrying with exponential
    /// backoff until `timeout` expires.
    pub fn open_locked_blocking(path: &Path, timeout: Duration) -> Result<LockedStore, CtxpinError> {
        let lock_path = path.with_extension("lock");
        let lock_file = File::create(&lock_path)?;

        let start = Instant::now();
        let mut delay = Duration::from_millis(10);

        loop {
            match lock_file.try_lock_exclusive() {
                Ok(()) => break,
                Err(_) if start.elapsed() < timeout => {
                    debug!(delay_ms = delay.as_millis() as u64, "store locked, retrying");
                    std::thread::sleep(delay);
                    delay = (delay * 2).min(Duration::from_millis(200));
                }
                Err(e) => {
                    return Err(CtxpinError::DbBusy(format!(
                        "Timeout waiting for database lock: {}",
                        e
                    )))
                }
            }
        }

        let store = Self::open(path)?;
        Ok(LockedStore {
            _lock_file: lock_file,
            store,
        })
    }

    pub fn stats(&self, path: &Path) -> Result<StoreStats, CtxpinError> {
        Ok(StoreStats {
            path: path.display().to_string(),
            size_bytes: dir_size(path)?,
            key_count: self.items.len(),
        })
    }
}

impl KvStore for SledStore {
    fn get_item(&self, key: &str) -> Result<Option<Value>, CtxpinError> {
        match self.items.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn set_item(&self, key: &str, value: &Value) -> Result<(), CtxpinError> {
        self.items.insert(key.as_bytes(), serde_json::to_vec(value)?)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), CtxpinError> {
        self.items.remove(key.as_bytes())?;
        Ok(())
    }

    fn apply(&self, ops: Vec<KvOp>) -> Result<(), CtxpinError> {
        let mut batch = sled::Batch::default();
        for op in ops {
            match op {
                KvOp::Set { key, value } => batch.insert(key.as_bytes(), serde_json::to_vec(&value)?),
                KvOp::Remove { key } => batch.remove(key.as_bytes()),
            }
        }
        self.items.apply_batch(batch)?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, CtxpinError> {
        let mut keys = Vec::new();
        for result in self.items.iter().keys() {
            let key = result?;
            keys.push(String::from_utf8_lossy(&key).into_owned());
        }
        Ok(keys)
    }

    fn flush(&self) -> Result<(), CtxpinError> {
        self.db.flush()?;
        Ok(())
    }
}

fn dir_size(path: &Path) -> std::io::Result<u64> {
    let mut size = 0;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if meta.is_dir() {
                size += dir_size(&entry.path())?;
            } else {
                size += meta.len();
            }
        }
    }
    Ok(size)
}
