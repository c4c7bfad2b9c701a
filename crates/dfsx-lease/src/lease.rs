//! Lease state machine.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{LeaseError, LeaseResult};
use crate::store::{LeaseRecord, LeaseStore};

/// Number of lock stripes used to serialize per-path operations without a
/// single global bottleneck ("a sharded lock or per-key lock is
/// an allowable refinement").
const STRIPES: usize = 64;

fn stripe_of(file_path: &str) -> usize {
    let mut hasher = DefaultHasher::new();
    file_path.hash(&mut hasher);
    (hasher.finish() as usize) % STRIPES
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Grants, validates and expires per-file write leases.
///
/// Operations on a given path are serialized by acquiring that path's stripe
/// lock before touching the backing store; unrelated paths proceed
/// concurrently ("handlers running concurrently on different keys
/// do not block one another").
pub struct LeaseManager {
    store: Arc<dyn LeaseStore>,
    lease_lifetime: Duration,
    stripes: Vec<Mutex<()>>,
}

impl LeaseManager {
    /// Creates a lease manager backed by `store`, with leases expiring after
    /// `lease_lifetime` of inactivity.
    pub fn new(store: Arc<dyn LeaseStore>, lease_lifetime: Duration) -> Self {
        let stripes = (0..STRIPES).map(|_| Mutex::new(())).collect();
        Self {
            store,
            lease_lifetime,
            stripes,
        }
    }

    fn is_valid(&self, record: &LeaseRecord, now: u64) -> bool {
        now.saturating_sub(record.last_used_at_secs) <= self.lease_lifetime.as_secs()
    }

    /// Checks whether `file_path` may be operated on.
    ///
    /// An invalid (expired) lease is
    /// treated as absent for every purpose but the revoke-on-touch cleanup.
    pub fn check(&self, file_path: &str, lease_id: Option<u64>) -> LeaseResult<()> {
        let _guard = self.stripes[stripe_of(file_path)].lock().unwrap();
        let now = now_secs();
        let existing = self.store.get(file_path)?;

        match (existing, lease_id) {
            (None, None) => Ok(()),
            (None, Some(_)) => Err(LeaseError::Conflict),
            (Some(record), Some(id)) if id == record.lease_id && self.is_valid(&record, now) => {
                let refreshed = LeaseRecord {
                    last_used_at_secs: now,
                    ..record
                };
                self.store.put(file_path, refreshed)?;
                Ok(())
            }
            (Some(_), Some(_)) => {
                // either a wrong id, or the right id on an expired lease —
                // both are "out of sync" and clear the stale entry.
                self.store.remove(file_path)?;
                Err(LeaseError::Conflict)
            }
            (Some(record), None) if !self.is_valid(&record, now) => {
                self.store.remove(file_path)?;
                Ok(())
            }
            (Some(_), None) => Err(LeaseError::Conflict),
        }
    }

    /// Grants a fresh lease on `file_path`, failing if a valid lease already
    /// exists.
    pub fn grant(&self, file_path: &str) -> LeaseResult<u64> {
        let _guard = self.stripes[stripe_of(file_path)].lock().unwrap();
        self.grant_locked(file_path)
    }

    /// Grant logic assuming the caller already holds the path's stripe lock.
    fn grant_locked(&self, file_path: &str) -> LeaseResult<u64> {
        let now = now_secs();
        if let Some(record) = self.store.get(file_path)? {
            if self.is_valid(&record, now) {
                return Err(LeaseError::Unauthorized);
            }
            self.store.remove(file_path)?;
        }

        let lease_id: u64 = rand::random();
        let record = LeaseRecord {
            lease_id,
            granted_at_secs: now,
            last_used_at_secs: now,
        };
        self.store.put(file_path, record)?;
        tracing::info!(file_path, lease_id, "granted lease");
        Ok(lease_id)
    }

    /// Attempts to grant a lease on every path in `file_paths`, in order.
    ///
    /// On the first failure, every lease granted earlier in this call is
    /// revoked and the whole call fails with [`LeaseError::Unauthorized`] —
    /// a client requesting multiple leases atomically cannot deadlock
    /// against itself.
    pub fn grant_batch(&self, file_paths: &[String]) -> LeaseResult<HashMap<String, u64>> {
        let mut granted = HashMap::new();
        for path in file_paths {
            match self.grant(path) {
                Ok(id) => {
                    granted.insert(path.clone(), id);
                }
                Err(_) => {
                    for (path, id) in &granted {
                        let _ = self.revoke(path, *id);
                    }
                    return Err(LeaseError::Unauthorized);
                }
            }
        }
        Ok(granted)
    }

    /// Revokes the lease on `file_path` if its id matches `lease_id`.
    ///
    /// Always returns success, matching or not, to keep client clean-up
    /// idempotent.
    pub fn revoke(&self, file_path: &str, lease_id: u64) -> LeaseResult<()> {
        let _guard = self.stripes[stripe_of(file_path)].lock().unwrap();
        if let Some(record) = self.store.get(file_path)? {
            if record.lease_id == lease_id {
                self.store.remove(file_path)?;
                tracing::info!(file_path, lease_id, "revoked lease");
            }
        }
        Ok(())
    }

    /// Revokes each `(file_path, lease_id)` pair per [`LeaseManager::revoke`].
    ///
    /// `file_paths` and `lease_ids` must have equal length.
    pub fn revoke_batch(&self, file_paths: &[String], lease_ids: &[u64]) -> LeaseResult<()> {
        if file_paths.len() != lease_ids.len() {
            return Err(LeaseError::BadRequest(
                "filepaths and lock_ids must have equal length".to_string(),
            ));
        }
        for (path, id) in file_paths.iter().zip(lease_ids.iter()) {
            self.revoke(path, *id)?;
        }
        Ok(())
    }

    /// Returns every `(file_path, granted_at, last_used_at)` tuple (as Unix
    /// seconds), sorted by file path, for operator visibility.
    pub fn dump(&self) -> LeaseResult<Vec<(String, u64, u64)>> {
        Ok(self
            .store
            .scan_all()?
            .into_iter()
            .map(|(path, record)| (path, record.granted_at_secs, record.last_used_at_secs))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryLeaseStore;

    fn manager(lifetime_secs: u64) -> LeaseManager {
        LeaseManager::new(Arc::new(MemoryLeaseStore::new()), Duration::from_secs(lifetime_secs))
    }

    #[test]
    fn no_lease_no_id_is_ok() {
        let mgr = manager(60);
        assert!(mgr.check("/d/f", None).is_ok());
    }

    #[test]
    fn no_lease_with_id_is_conflict() {
        let mgr = manager(60);
        assert!(matches!(mgr.check("/d/f", Some(1)), Err(LeaseError::Conflict)));
    }

    #[test]
    fn grant_then_check_with_correct_id_refreshes() {
        let mgr = manager(60);
        let id = mgr.grant("/d/f").unwrap();
        assert!(mgr.check("/d/f", Some(id)).is_ok());
    }

    #[test]
    fn grant_while_valid_lease_exists_fails() {
        let mgr = manager(60);
        mgr.grant("/d/f").unwrap();
        assert!(matches!(mgr.grant("/d/f"), Err(LeaseError::Unauthorized)));
    }

    #[test]
    fn check_without_id_on_valid_lease_is_conflict() {
        let mgr = manager(60);
        mgr.grant("/d/f").unwrap();
        assert!(matches!(mgr.check("/d/f", None), Err(LeaseError::Conflict)));
    }

    #[test]
    fn check_with_wrong_id_revokes_and_conflicts() {
        let mgr = manager(60);
        let id = mgr.grant("/d/f").unwrap();
        assert!(matches!(mgr.check("/d/f", Some(id.wrapping_add(1))), Err(LeaseError::Conflict)));
        // the stale entry was cleared, so a fresh grant now succeeds immediately
        assert!(mgr.grant("/d/f").is_ok());
    }

    #[test]
    fn expired_lease_check_without_id_revokes_and_returns_ok() {
        let mgr = manager(0);
        mgr.grant("/d/f").unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        assert!(mgr.check("/d/f", None).is_ok());
        // lease was reaped, a fresh grant succeeds
        assert!(mgr.grant("/d/f").is_ok());
    }

    #[test]
    fn revoke_is_idempotent() {
        let mgr = manager(60);
        let id = mgr.grant("/d/f").unwrap();
        assert!(mgr.revoke("/d/f", id).is_ok());
        assert!(mgr.revoke("/d/f", id).is_ok());
    }

    #[test]
    fn revoke_with_wrong_id_is_noop_success() {
        let mgr = manager(60);
        let id = mgr.grant("/d/f").unwrap();
        assert!(mgr.revoke("/d/f", id.wrapping_add(1)).is_ok());
        // original lease untouched
        assert!(mgr.check("/d/f", Some(id)).is_ok());
    }

    #[test]
    fn grant_batch_atomic_rollback_on_failure() {
        let mgr = manager(60);
        mgr.grant("/c").unwrap(); // pre-existing valid lease blocks the batch
        let result = mgr.grant_batch(&["/a".to_string(), "/b".to_string(), "/c".to_string()]);
        assert!(matches!(result, Err(LeaseError::Unauthorized)));
        // /a and /b must have been rolled back
        assert!(mgr.grant("/a").is_ok());
        assert!(mgr.grant("/b").is_ok());
    }

    #[test]
    fn grant_batch_success_grants_every_path() {
        let mgr = manager(60);
        let ids = mgr.grant_batch(&["/a".to_string(), "/b".to_string()]).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(mgr.check("/a", Some(ids["/a"])).is_ok());
        assert!(mgr.check("/b", Some(ids["/b"])).is_ok());
    }

    #[test]
    fn revoke_batch_mismatched_lengths_is_bad_request() {
        let mgr = manager(60);
        let result = mgr.revoke_batch(&["/a".to_string()], &[]);
        assert!(matches!(result, Err(LeaseError::BadRequest(_))));
    }

    #[test]
    fn dump_is_sorted_by_path() {
        let mgr = manager(60);
        mgr.grant("/z").unwrap();
        mgr.grant("/a").unwrap();
        let dumped = mgr.dump().unwrap();
        let paths: Vec<_> = dumped.iter().map(|(p, _, _)| p.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/z"]);
    }

    #[test]
    fn grant_after_expiry_invalidates_old_id() {
        let mgr = manager(0);
        let id1 = mgr.grant("/d/f").unwrap();
        std::thread::sleep(Duration::from_millis(1100));
        let id2 = mgr.grant("/d/f").unwrap();
        assert!(matches!(mgr.check("/d/f", Some(id1)), Err(LeaseError::Conflict)));
        assert!(mgr.check("/d/f", Some(id2)).is_ok());
    }
}
