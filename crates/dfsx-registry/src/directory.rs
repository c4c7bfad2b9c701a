//! Core Directory Registry operations.

use std::sync::Arc;

use dfsx_core::{path, Endpoint};

use crate::error::{RegistryError, RegistryResult};
use crate::store::RegistryStore;

/// Maps directory paths to the storage endpoint that serves them.
///
/// No concurrency beyond the backing store's own serialized access is
/// needed: the registry is read-mostly and every operation is a single
/// key lookup, insert or delete.
pub struct DirectoryRegistry {
    store: Arc<dyn RegistryStore>,
}

impl DirectoryRegistry {
    /// Creates a registry backed by `store`.
    pub fn new(store: Arc<dyn RegistryStore>) -> Self {
        Self { store }
    }

    /// Resolves the endpoint serving `file_path`'s parent directory.
    ///
    /// Never returns a prefix match: only an exact match on `dirname(file_path)`.
    pub fn lookup(&self, file_path: &str) -> RegistryResult<Endpoint> {
        let dir = path::dirname(file_path);
        match self.store.get(&dir)? {
            Some(ep) => Ok(Endpoint::parse(&ep)?),
            None => Err(RegistryError::NotFound),
        }
    }

    /// Lists all `(directory, endpoint)` pairs, sorted by directory for determinism.
    pub fn list(&self) -> RegistryResult<Vec<(String, Endpoint)>> {
        self.store
            .scan_all()?
            .into_iter()
            .map(|(dir, ep)| Ok((dir, Endpoint::parse(&ep)?)))
            .collect()
    }

    /// Registers `directory -> endpoint`, overwriting any existing entry.
    ///
    /// Idempotent: registering the same pair twice is a no-op the second time.
    pub fn register(&self, directory: &str, endpoint: &Endpoint) -> RegistryResult<()> {
        let dir = path::normalize_dir(directory);
        tracing::info!(directory = %dir, endpoint = %endpoint, "registering directory");
        self.store.put(&dir, endpoint.as_str())
    }

    /// Registers `endpoint` for every directory in `directories` (the
    /// batch POST to `/`).
    pub fn register_batch(&self, directories: &[String], endpoint: &Endpoint) -> RegistryResult<()> {
        for dir in directories {
            self.register(dir, endpoint)?;
        }
        Ok(())
    }

    /// Removes the entry for `directory` if present.
    ///
    /// Returns success whether or not the entry existed: the caller's intent
    /// ("this directory should not be registered") is satisfied in both cases.
    /// `endpoint` is accepted for protocol symmetry with `register` and
    /// future replication use, but is not currently checked against the
    /// stored value.
    pub fn deregister(&self, directory: &str, endpoint: &Endpoint) -> RegistryResult<()> {
        let dir = path::normalize_dir(directory);
        let existed = self.store.get(&dir)?.is_some();
        self.store.remove(&dir)?;
        if existed {
            tracing::info!(directory = %dir, endpoint = %endpoint, "deregistered directory");
        } else {
            tracing::debug!(directory = %dir, "deregister on absent directory, treating as success");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRegistryStore;

    fn registry() -> DirectoryRegistry {
        DirectoryRegistry::new(Arc::new(MemoryRegistryStore::new()))
    }

    #[test]
    fn lookup_resolves_parent_directory() {
        let reg = registry();
        let ep = Endpoint::parse("s1:9000").unwrap();
        reg.register("/d", &ep).unwrap();
        assert_eq!(reg.lookup("/d/f").unwrap(), ep);
    }

    #[test]
    fn lookup_never_prefix_matches() {
        let reg = registry();
        reg.register("/d", &Endpoint::parse("s1:9000").unwrap()).unwrap();
        assert!(matches!(reg.lookup("/d/sub/f"), Err(RegistryError::NotFound)));
    }

    #[test]
    fn register_normalizes_trailing_slash() {
        let reg = registry();
        let ep = Endpoint::parse("s1:9000").unwrap();
        reg.register("/d/", &ep).unwrap();
        assert_eq!(reg.lookup("/d/f").unwrap(), ep);
    }

    #[test]
    fn register_is_idempotent_overwrite() {
        let reg = registry();
        let ep1 = Endpoint::parse("s1:9000").unwrap();
        let ep2 = Endpoint::parse("s2:9000").unwrap();
        reg.register("/d", &ep1).unwrap();
        reg.register("/d", &ep2).unwrap();
        assert_eq!(reg.lookup("/d/f").unwrap(), ep2);
    }

    #[test]
    fn deregister_missing_entry_succeeds() {
        let reg = registry();
        let ep = Endpoint::parse("s1:9000").unwrap();
        assert!(reg.deregister("/never-registered", &ep).is_ok());
    }

    #[test]
    fn deregister_removes_entry() {
        let reg = registry();
        let ep = Endpoint::parse("s1:9000").unwrap();
        reg.register("/d", &ep).unwrap();
        reg.deregister("/d", &ep).unwrap();
        assert!(matches!(reg.lookup("/d/f"), Err(RegistryError::NotFound)));
    }

    #[test]
    fn list_is_sorted_by_directory() {
        let reg = registry();
        let ep = Endpoint::parse("s1:9000").unwrap();
        reg.register("/z", &ep).unwrap();
        reg.register("/a", &ep).unwrap();
        let dirs: Vec<_> = reg.list().unwrap().into_iter().map(|(d, _)| d).collect();
        assert_eq!(dirs, vec!["/a".to_string(), "/z".to_string()]);
    }

    #[test]
    fn register_batch_registers_every_directory() {
        let reg = registry();
        let ep = Endpoint::parse("s1:9000").unwrap();
        reg.register_batch(&["/a".to_string(), "/b".to_string()], &ep)
            .unwrap();
        assert_eq!(reg.lookup("/a/f").unwrap(), ep);
        assert_eq!(reg.lookup("/b/f").unwrap(), ep);
    }
}
