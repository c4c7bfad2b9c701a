//! Durable backing store for lease records.
//!
//! As with the registry (see `dfsx_registry::store`), the durable backing is
//! treated as an opaque map; this module supplies a `sled`-backed
//! implementation plus an in-memory test double behind a common trait.

use std::collections::BTreeMap;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{LeaseError, LeaseResult};

/// A durable record of a single file's lease state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeaseRecord {
    /// The lease identifier, a bearer token opaque to everyone but the holder.
    pub lease_id: u64,
    /// Unix timestamp (seconds) of the initial grant.
    pub granted_at_secs: u64,
    /// Unix timestamp (seconds) of the last successful validation or refresh.
    pub last_used_at_secs: u64,
}

/// Durable (or in-memory, for tests) `file path -> lease record` map.
///
/// Implementations must return [`LeaseStore::scan_all`] sorted by file path so
/// [`crate::lease::LeaseManager::dump`] can satisfy a deterministic-ordering
/// requirement without an extra sort pass.
pub trait LeaseStore: Send + Sync {
    /// Fetches the lease record for `file_path`, if any.
    fn get(&self, file_path: &str) -> LeaseResult<Option<LeaseRecord>>;

    /// Inserts or overwrites the lease record for `file_path`.
    fn put(&self, file_path: &str, record: LeaseRecord) -> LeaseResult<()>;

    /// Removes the lease record for `file_path`. Not an error if absent.
    fn remove(&self, file_path: &str) -> LeaseResult<()>;

    /// Returns all `(file_path, record)` pairs sorted by file path.
    fn scan_all(&self) -> LeaseResult<Vec<(String, LeaseRecord)>>;
}

/// Sled-backed durable lease store.
pub struct SledLeaseStore {
    tree: sled::Tree,
}

impl SledLeaseStore {
    /// Opens (or creates) a sled database at `path` and returns a store backed
    /// by its default tree. Crash recovery reloads leases with their original
    /// `last_used_at`; callers are responsible for lazily reaping expired
    /// entries on next access.
    pub fn open(path: &Path) -> LeaseResult<Self> {
        let db = sled::open(path).map_err(|e| LeaseError::Store(e.to_string()))?;
        let tree = db
            .open_tree("leases")
            .map_err(|e| LeaseError::Store(e.to_string()))?;
        Ok(Self { tree })
    }
}

impl LeaseStore for SledLeaseStore {
    fn get(&self, file_path: &str) -> LeaseResult<Option<LeaseRecord>> {
        match self
            .tree
            .get(file_path.as_bytes())
            .map_err(|e| LeaseError::Store(e.to_string()))?
        {
            Some(v) => {
                let record = bincode::deserialize(&v).map_err(|e| LeaseError::Store(e.to_string()))?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn put(&self, file_path: &str, record: LeaseRecord) -> LeaseResult<()> {
        let value = bincode::serialize(&record).map_err(|e| LeaseError::Store(e.to_string()))?;
        self.tree
            .insert(file_path.as_bytes(), value)
            .map_err(|e| LeaseError::Store(e.to_string()))?;
        self.tree.flush().map_err(|e| LeaseError::Store(e.to_string()))?;
        Ok(())
    }

    fn remove(&self, file_path: &str) -> LeaseResult<()> {
        self.tree
            .remove(file_path.as_bytes())
            .map_err(|e| LeaseError::Store(e.to_string()))?;
        self.tree.flush().map_err(|e| LeaseError::Store(e.to_string()))?;
        Ok(())
    }

    fn scan_all(&self) -> LeaseResult<Vec<(String, LeaseRecord)>> {
        let mut out = Vec::new();
        for item in self.tree.iter() {
            let (k, v) = item.map_err(|e| LeaseError::Store(e.to_string()))?;
            let path = String::from_utf8(k.to_vec()).map_err(|e| LeaseError::Store(e.to_string()))?;
            let record: LeaseRecord =
                bincode::deserialize(&v).map_err(|e| LeaseError::Store(e.to_string()))?;
            out.push((path, record));
        }
        Ok(out)
    }
}

/// In-memory lease store for tests, backed by a `BTreeMap`.
#[derive(Default)]
pub struct MemoryLeaseStore {
    data: RwLock<BTreeMap<String, LeaseRecord>>,
}

impl MemoryLeaseStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LeaseStore for MemoryLeaseStore {
    fn get(&self, file_path: &str) -> LeaseResult<Option<LeaseRecord>> {
        Ok(self.data.read().unwrap().get(file_path).copied())
    }

    fn put(&self, file_path: &str, record: LeaseRecord) -> LeaseResult<()> {
        self.data.write().unwrap().insert(file_path.to_string(), record);
        Ok(())
    }

    fn remove(&self, file_path: &str) -> LeaseResult<()> {
        self.data.write().unwrap().remove(file_path);
        Ok(())
    }

    fn scan_all(&self) -> LeaseResult<Vec<(String, LeaseRecord)>> {
        Ok(self
            .data
            .read()
            .unwrap()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect())
    }
}
