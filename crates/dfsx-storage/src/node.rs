//! Core Storage Node operations.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dfsx_core::LastModified;

use crate::error::{StorageError, StorageResult};

/// Reads and writes local files under a served-directories whitelist, gating
/// writes on lease validity by consulting the Lease Manager.
pub struct StorageNode {
    fsroot: PathBuf,
    directories: BTreeSet<String>,
    lockserver_base: String,
    http: reqwest::Client,
}

impl StorageNode {
    /// Creates a storage node rooted at `fsroot`, serving `directories`, and
    /// consulting the Lease Manager at `lockserver_base` for lease checks.
    pub fn new(fsroot: PathBuf, directories: BTreeSet<String>, lockserver_base: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with a fixed timeout");
        Self {
            fsroot,
            directories,
            lockserver_base,
            http,
        }
    }

    /// Returns true if `file_path`'s parent directory is in the whitelist.
    fn is_servable(&self, file_path: &str) -> bool {
        let dir = dfsx_core::path::dirname(file_path);
        self.directories.contains(&dir)
    }

    /// Joins `file_path` onto `fsroot`, dropping the leading `/` (the
    /// on-disk layout rule).
    ///
    /// Known limitation: this does not canonicalize or reject `..` segments
    /// within an already-servable directory. Path traversal defense is an
    /// explicitly documented gap, not silently fixed here.
    fn resolve_local_path(&self, file_path: &str) -> PathBuf {
        self.fsroot.join(file_path.trim_start_matches('/'))
    }

    fn require_servable(&self, file_path: &str) -> StorageResult<PathBuf> {
        if !self.is_servable(file_path) {
            return Err(StorageError::NotAcceptable);
        }
        let local = self.resolve_local_path(file_path);
        if local.is_dir() {
            return Err(StorageError::NotAcceptable);
        }
        Ok(local)
    }

    async fn check_lease(&self, file_path: &str, lease_id: Option<u64>) -> StorageResult<()> {
        let mut url = format!("{}{}", self.lockserver_base, file_path);
        if let Some(id) = lease_id {
            url = format!("{url}?lock_id={id}");
        }
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(StorageError::Unauthorized)
        }
    }

    fn last_modified_of(path: &Path) -> StorageResult<LastModified> {
        let meta = std::fs::metadata(path)?;
        let mtime = meta.modified()?;
        Ok(LastModified::from_system_time(mtime))
    }

    /// Reads `file_path`'s bytes and modification token, after a lease check.
    pub async fn get(&self, file_path: &str, lease_id: Option<u64>) -> StorageResult<(Vec<u8>, LastModified)> {
        let local = self.require_servable(file_path)?;
        if !local.is_file() {
            return Err(StorageError::NoContent);
        }
        self.check_lease(file_path, lease_id).await?;
        let bytes = std::fs::read(&local)?;
        let last_modified = Self::last_modified_of(&local)?;
        Ok((bytes, last_modified))
    }

    /// Returns only the modification token for `file_path` (HEAD semantics).
    pub async fn head(&self, file_path: &str, lease_id: Option<u64>) -> StorageResult<LastModified> {
        let local = self.require_servable(file_path)?;
        if !local.is_file() {
            return Err(StorageError::NoContent);
        }
        self.check_lease(file_path, lease_id).await?;
        Self::last_modified_of(&local)
    }

    /// Overwrites `file_path` with `body`, write-to-temp-then-rename so a
    /// concurrent GET observes either the previous or the new contents, never
    /// a partial write (not mandated, but a cheap correctness improvement).
    pub async fn put(
        &self,
        file_path: &str,
        body: &[u8],
        lease_id: Option<u64>,
    ) -> StorageResult<LastModified> {
        let local = self.require_servable(file_path)?;
        self.check_lease(file_path, lease_id).await?;

        if let Some(parent) = local.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let tmp_path = local.with_extension(format!(
            "tmp-{}",
            std::process::id()
        ));
        std::fs::write(&tmp_path, body)?;
        std::fs::rename(&tmp_path, &local)?;

        tracing::info!(file_path, bytes = body.len(), "wrote file");
        Self::last_modified_of(&local)
    }

    /// Removes `file_path` after a lease check.
    pub async fn delete(&self, file_path: &str, lease_id: Option<u64>) -> StorageResult<()> {
        let local = self.require_servable(file_path)?;
        if !local.is_file() {
            return Err(StorageError::NoContent);
        }
        self.check_lease(file_path, lease_id).await?;
        std::fs::remove_file(&local)?;
        tracing::info!(file_path, "deleted file");
        Ok(())
    }

    /// Announces this node's served directories to the Directory Registry via
    /// a batch register at startup.
    pub async fn register_with_registry(&self, nameserver_base: &str, srv: &str) -> StorageResult<()> {
        if self.directories.is_empty() {
            return Ok(());
        }
        let dirs = self
            .directories
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join("\n");
        let resp = self
            .http
            .post(nameserver_base)
            .form(&[("srv", srv), ("dirs", &dirs)])
            .send()
            .await
            .map_err(|e| StorageError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(StorageError::Transport(format!(
                "registry rejected batch register: {}",
                resp.status()
            )));
        }
        tracing::info!(directories = ?self.directories, srv, "registered with directory registry");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(tmp: &tempfile::TempDir, lockserver: &str) -> StorageNode {
        let mut dirs = BTreeSet::new();
        dirs.insert("/d".to_string());
        StorageNode::new(tmp.path().to_path_buf(), dirs, lockserver.to_string())
    }

    #[test]
    fn resolve_local_path_drops_leading_slash() {
        let tmp = tempfile::tempdir().unwrap();
        let n = node(&tmp, "http://unused");
        let resolved = n.resolve_local_path("/d/f");
        assert_eq!(resolved, tmp.path().join("d/f"));
    }

    #[test]
    fn non_servable_path_is_rejected_before_touching_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let n = node(&tmp, "http://unused");
        assert!(matches!(n.require_servable("/e/f"), Err(StorageError::NotAcceptable)));
    }

    #[tokio::test]
    async fn get_missing_file_is_no_content() {
        let tmp = tempfile::tempdir().unwrap();
        let n = node(&tmp, "http://unused");
        let result = n.get("/d/f", None).await;
        assert!(matches!(result, Err(StorageError::NoContent)));
    }

    #[tokio::test]
    async fn non_servable_get_never_contacts_lockserver() {
        let tmp = tempfile::tempdir().unwrap();
        // a lockserver base that would error out if actually contacted
        let n = node(&tmp, "http://127.0.0.1:1");
        let result = n.get("/e/f", None).await;
        assert!(matches!(result, Err(StorageError::NotAcceptable)));
    }

    #[tokio::test]
    async fn get_on_a_directory_is_not_acceptable() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("d/sub")).unwrap();
        let n = node(&tmp, "http://127.0.0.1:1");
        let result = n.get("/d/sub", None).await;
        assert!(matches!(result, Err(StorageError::NotAcceptable)));
    }

    #[tokio::test]
    async fn delete_on_a_directory_is_not_acceptable() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("d/sub")).unwrap();
        let n = node(&tmp, "http://127.0.0.1:1");
        let result = n.delete("/d/sub", None).await;
        assert!(matches!(result, Err(StorageError::NotAcceptable)));
    }
}
