//! Client Session: composes the Directory Registry, Lease Manager and
//! Storage Node into a transactional open/read/modify/write/close protocol
//! with a local cache.
//!
//! The original source kept its config and file cache as module-level
//! mutable globals; this is re-architected as an explicit context object a
//! test harness can instantiate fresh per test.

use std::collections::HashMap;
use std::io::{Seek, SeekFrom};
use std::sync::Mutex;
use std::time::Duration;

use dfsx_core::{Endpoint, LastModified};

use crate::buffer::SpillBuffer;
use crate::cache::EndpointCache;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::handle::{Handle, Mode};

/// Owns a client's configuration, cross-service HTTP client, endpoint cache
/// and retained-handle cache for its lifetime.
pub struct Session {
    config: ClientConfig,
    http: reqwest::Client,
    endpoint_cache: EndpointCache,
    file_cache: Mutex<HashMap<String, Handle>>,
}

impl Session {
    /// Creates a session from `config`. The endpoint cache's TTL defaults to a
    /// conservative fixed value, since the client has no way to learn the
    /// lease manager's configured lease lifetime; override it via
    /// [`Session::with_endpoint_ttl`] if the deployment's lease lifetime is known.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_endpoint_ttl(config, Duration::from_secs(60))
    }

    /// Creates a session with an explicit endpoint-cache TTL.
    pub fn with_endpoint_ttl(config: ClientConfig, endpoint_ttl: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("reqwest client builds with a fixed timeout");
        Self {
            config,
            http,
            endpoint_cache: EndpointCache::new(256, endpoint_ttl),
            file_cache: Mutex::new(HashMap::new()),
        }
    }

    async fn resolve_endpoint(&self, path: &str) -> ClientResult<Endpoint> {
        let dir = dfsx_core::path::dirname(path);
        if let Some(ep) = self.endpoint_cache.get(&dir) {
            return Ok(ep);
        }

        let url = format!("{}{}", self.config.nameserver, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            self.endpoint_cache.invalidate(&dir);
            return Err(ClientError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(ClientError::Transport(format!(
                "registry lookup failed: {}",
                resp.status()
            )));
        }
        let body = resp
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        let endpoint = Endpoint::parse(body.trim()).map_err(|e| ClientError::Transport(e.to_string()))?;
        self.endpoint_cache.put(&dir, endpoint.clone());
        Ok(endpoint)
    }

    async fn is_locked(&self, path: &str) -> ClientResult<bool> {
        let url = format!("{}{}", self.config.lockserver, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(resp.status() == reqwest::StatusCode::CONFLICT)
    }

    async fn grant_lease(&self, path: &str) -> ClientResult<u64> {
        let url = format!("{}{}", self.config.lockserver, path);
        let resp = self
            .http
            .post(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ClientError::Unauthorized("lease already held".to_string()));
        }
        if !resp.status().is_success() {
            return Err(ClientError::Transport(format!(
                "lease grant failed: {}",
                resp.status()
            )));
        }
        let body = resp.text().await.map_err(|e| ClientError::Transport(e.to_string()))?;
        body.trim()
            .parse::<u64>()
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn revoke_lease(&self, path: &str, lease_id: u64) {
        let url = format!("{}{}?lock_id={}", self.config.lockserver, path, lease_id);
        if let Err(e) = self.http.delete(&url).send().await {
            tracing::warn!(path, lease_id, error = %e, "failed to revoke lease");
        }
    }

    /// Opens `path` in `mode`: resolves its storage endpoint, checks for a
    /// conflicting lease, conditionally reads the current contents, then
    /// conditionally grants a write lease. When `cache` is set, a successful
    /// close retains the handle for [`Session::from_cache`] hits.
    pub async fn open(&self, path: &str, mode: Mode, cache: bool) -> ClientResult<Handle> {
        let endpoint = self.resolve_endpoint(path).await?;

        if self.is_locked(path).await? {
            return Err(ClientError::Locked);
        }

        let mut initial_body = Vec::new();
        let mut last_modified = None;
        if mode.needs_read() {
            let url = format!("{}{}", endpoint.base_url(), path);
            let resp = self
                .http
                .get(&url)
                .send()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;
            match resp.status() {
                reqwest::StatusCode::OK => {
                    last_modified = resp
                        .headers()
                        .get(reqwest::header::LAST_MODIFIED)
                        .and_then(|v| v.to_str().ok())
                        .map(LastModified::from_raw);
                    initial_body = resp
                        .bytes()
                        .await
                        .map_err(|e| ClientError::Transport(e.to_string()))?
                        .to_vec();
                }
                reqwest::StatusCode::NO_CONTENT if mode == Mode::Append => {}
                reqwest::StatusCode::NO_CONTENT => return Err(ClientError::NotFound),
                status => {
                    return Err(ClientError::Transport(format!(
                        "error ({status}) while opening file"
                    )))
                }
            }
        }

        let lease_id = if mode.writes() {
            Some(self.grant_lease(path).await?)
        } else {
            None
        };

        let mut buffer = SpillBuffer::from_bytes(initial_body, self.config.max_size)?;
        match mode {
            // pure read: rewind so the caller reads from the beginning.
            Mode::Read => {
                buffer.seek(SeekFrom::Start(0))?;
            }
            // append: leave the position at the end of the fetched contents,
            // so a write extends the file rather than overwriting its start.
            Mode::Append => {
                buffer.seek(SeekFrom::End(0))?;
            }
            Mode::Write => {}
        }

        Ok(Handle {
            path: path.to_string(),
            mode,
            endpoint,
            lease_id,
            buffer,
            last_modified,
            cache,
            flushed: false,
        })
    }

    /// Pushes the handle's buffered body to its storage endpoint (if the mode
    /// writes or appends) and revokes its lease exactly once.
    ///
    /// Any non-success PUT status is fatal and leaves the buffer unflushed;
    /// a failure here must not be treated as a successful commit. A second
    /// commit on an already-flushed handle is a no-op: the lease was already
    /// revoked on the first commit, so re-PUTting with the same `lease_id`
    /// would now be rejected by the storage node's lease check.
    pub async fn commit(&self, handle: &mut Handle) -> ClientResult<()> {
        if handle.flushed {
            return Ok(());
        }

        if handle.mode.writes() {
            let body = handle.buffer.read_all_from_start()?;
            let mut url = format!("{}{}", handle.endpoint.base_url(), handle.path);
            if let Some(id) = handle.lease_id {
                url = format!("{url}?lock_id={id}");
            }
            let resp = self
                .http
                .put(&url)
                .body(body)
                .send()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(ClientError::Unauthorized(format!(
                    "error ({}) while committing change",
                    resp.status()
                )));
            }
            handle.last_modified = resp
                .headers()
                .get(reqwest::header::LAST_MODIFIED)
                .and_then(|v| v.to_str().ok())
                .map(LastModified::from_raw);
        }

        if let Some(lease_id) = handle.lease_id {
            self.revoke_lease(&handle.path, lease_id).await;
        }
        handle.flushed = true;
        Ok(())
    }

    /// Commits `handle`, then releases its local resources — except when the
    /// handle was opened with `cache = true`, in which case it is retained
    /// for [`Session::from_cache`] and positioned at offset 0.
    pub async fn close(&self, mut handle: Handle) -> ClientResult<()> {
        self.commit(&mut handle).await?;

        if handle.cache {
            handle.buffer.seek(SeekFrom::Start(0))?;
            self.file_cache
                .lock()
                .unwrap()
                .insert(handle.path.clone(), handle);
        }
        Ok(())
    }

    /// Looks up `path` in the retained-handle cache. Validates the entry with
    /// a HEAD request; a mismatched `Last-Modified` evicts the entry and
    /// returns a miss. The cache never serves a stale body.
    pub async fn from_cache(&self, path: &str) -> Option<Handle> {
        let cached = self.file_cache.lock().unwrap().remove(path)?;

        let url = format!("{}{}", cached.endpoint.base_url(), path);
        let resp = match self.http.head(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(path, error = %e, "cache validation request failed, treating as miss");
                return None;
            }
        };
        let current = resp
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(LastModified::from_raw);

        if current.is_some() && current == cached.last_modified {
            Some(cached)
        } else {
            None
        }
    }

    /// Deletes `path` at its storage endpoint, optionally presenting `lease_id`.
    pub async fn delete(&self, path: &str, lease_id: Option<u64>) -> ClientResult<()> {
        let endpoint = self.resolve_endpoint(path).await?;
        let mut url = format!("{}{}", endpoint.base_url(), path);
        if let Some(id) = lease_id {
            url = format!("{url}?lock_id={id}");
        }
        let resp = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(ClientError::Transport(format!(
                "error ({}) while deleting {path}",
                resp.status()
            )));
        }
        Ok(())
    }

    /// Renames `old_path` to `new_path` as open-read + open-write-new + delete-old,
    /// using the lease acquired for the source.
    ///
    /// Not atomic across the two files: a crash between the write and the
    /// delete leaves both present (a documented, accepted behavior).
    pub async fn rename(&self, old_path: &str, new_path: &str) -> ClientResult<()> {
        let mut src = self.open(old_path, Mode::Read, false).await?;
        let mut body = Vec::new();
        src.read_to_end_local(&mut body)?;

        let mut dst = self.open(new_path, Mode::Write, false).await?;
        dst.write(&body)?;
        self.commit(&mut dst).await?;

        let lease_id = src.lease_id();
        self.delete(old_path, lease_id).await
    }
}

impl Handle {
    fn read_to_end_local(&mut self, buf: &mut Vec<u8>) -> std::io::Result<usize> {
        use std::io::Read;
        self.seek(SeekFrom::Start(0))?;
        self.read_to_end(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_builds_with_defaults() {
        let session = Session::new(ClientConfig::default());
        assert!(session.file_cache.lock().unwrap().is_empty());
    }
}
