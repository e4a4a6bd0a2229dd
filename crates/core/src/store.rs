//! File-backed JSON document store.
//!
//! Documents are stored one per file under the configured data directory:
//!
//! ```text
//! <data_dir>/
//!   accounts/      <uuid>.json
//!   providers/     <uuid>.json
//!   appointments/  <uuid>.json
//! ```
//!
//! The store is established once at startup by [`Store::open`], which
//! retries with bounded exponential backoff, and the resulting handle is
//! passed into services by `Arc`; there is no ambient global connection
//! state. Individual operations are never retried.
//!
//! Per-collection write guards give check-then-act sequences (unique-email
//! registration, slot-conflict booking, cascading deletes) in-process
//! atomicity: the guard is held across the read and the write.

use std::fs;
use std::io::{self, ErrorKind};
use std::path::PathBuf;
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::config::CoreConfig;
use crate::error::{ClinicError, ClinicResult};

/// The document collections the platform persists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collection {
    Accounts,
    Providers,
    Appointments,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Accounts,
        Collection::Providers,
        Collection::Appointments,
    ];

    pub fn dir_name(&self) -> &'static str {
        match self {
            Collection::Accounts => "accounts",
            Collection::Providers => "providers",
            Collection::Appointments => "appointments",
        }
    }
}

/// Startup establishment retry policy.
///
/// Applies only to [`Store::open`]; per-operation failures surface
/// immediately.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(200),
        }
    }
}

#[derive(Default, Debug)]
struct CollectionLocks {
    accounts: RwLock<()>,
    providers: RwLock<()>,
    appointments: RwLock<()>,
}

/// Handle to an established document store.
#[derive(Debug)]
pub struct Store {
    cfg: Arc<CoreConfig>,
    locks: CollectionLocks,
}

impl Store {
    /// Establishes the store, retrying with bounded exponential backoff.
    ///
    /// Each attempt creates the collection directories under the configured
    /// data directory. Failed attempts are logged and retried after a delay
    /// that doubles each round.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::StorageUnavailable` carrying the final I/O
    /// error once the attempt budget is exhausted.
    pub fn open(cfg: Arc<CoreConfig>, retry: RetryPolicy) -> ClinicResult<Self> {
        let attempts = retry.max_attempts.max(1);
        let mut delay = retry.base_delay;
        let mut last_error: Option<io::Error> = None;

        for attempt in 1..=attempts {
            match Self::establish(&cfg) {
                Ok(()) => {
                    return Ok(Self {
                        cfg,
                        locks: CollectionLocks::default(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        "storage establishment attempt {attempt}/{attempts} failed: {e}"
                    );
                    last_error = Some(e);
                    if attempt < attempts {
                        std::thread::sleep(delay);
                        delay = delay.saturating_mul(2);
                    }
                }
            }
        }

        Err(ClinicError::StorageUnavailable {
            attempts,
            last_error: last_error
                .unwrap_or_else(|| io::Error::new(ErrorKind::Other, "no attempt recorded")),
        })
    }

    fn establish(cfg: &CoreConfig) -> io::Result<()> {
        for collection in Collection::ALL {
            fs::create_dir_all(cfg.data_dir().join(collection.dir_name()))?;
        }
        Ok(())
    }

    fn doc_path(&self, collection: Collection, id: &Uuid) -> PathBuf {
        self.cfg
            .data_dir()
            .join(collection.dir_name())
            .join(format!("{id}.json"))
    }

    /// Writes (inserts or replaces) a document.
    pub fn put<T: Serialize>(
        &self,
        collection: Collection,
        id: &Uuid,
        doc: &T,
    ) -> ClinicResult<()> {
        let body = serde_json::to_string_pretty(doc).map_err(ClinicError::Serialization)?;
        fs::write(self.doc_path(collection, id), body).map_err(ClinicError::FileWrite)
    }

    /// Reads a document, returning `None` if it does not exist.
    pub fn get<T: DeserializeOwned>(
        &self,
        collection: Collection,
        id: &Uuid,
    ) -> ClinicResult<Option<T>> {
        match fs::read_to_string(self.doc_path(collection, id)) {
            Ok(contents) => serde_json::from_str(&contents)
                .map(Some)
                .map_err(ClinicError::Deserialization),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ClinicError::FileRead(e)),
        }
    }

    /// Deletes a document. Returns whether a document existed.
    pub fn remove(&self, collection: Collection, id: &Uuid) -> ClinicResult<bool> {
        match fs::remove_file(self.doc_path(collection, id)) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ClinicError::FileWrite(e)),
        }
    }

    /// Reads every document in a collection.
    ///
    /// Unreadable or unparsable documents are logged as warnings and
    /// skipped rather than failing the whole scan.
    pub fn scan<T: DeserializeOwned>(&self, collection: Collection) -> ClinicResult<Vec<T>> {
        let dir = self.cfg.data_dir().join(collection.dir_name());
        let mut docs = Vec::new();

        let iter = match fs::read_dir(&dir) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(docs),
            Err(e) => return Err(ClinicError::FileRead(e)),
        };

        for entry in iter.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<T>(&contents) {
                    Ok(doc) => docs.push(doc),
                    Err(e) => {
                        tracing::warn!("skipping unparsable document {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("skipping unreadable document {}: {e}", path.display());
                }
            }
        }

        Ok(docs)
    }

    /// Takes the write guard for a collection.
    ///
    /// Hold the guard across a check-then-write sequence to make it atomic
    /// with respect to other writers of the same collection.
    pub fn lock_write(&self, collection: Collection) -> RwLockWriteGuard<'_, ()> {
        let lock = match collection {
            Collection::Accounts => &self.locks.accounts,
            Collection::Providers => &self.locks.providers,
            Collection::Appointments => &self.locks.appointments,
        };
        lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Takes the write guards of every collection, in a fixed order so
    /// concurrent cascades cannot deadlock.
    pub fn lock_all_write(&self) -> [RwLockWriteGuard<'_, ()>; 3] {
        [
            self.lock_write(Collection::Accounts),
            self.lock_write(Collection::Providers),
            self.lock_write(Collection::Appointments),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Doc {
        id: Uuid,
        label: String,
    }

    fn open_store(path: &Path) -> Store {
        let cfg = Arc::new(CoreConfig::new(path.to_path_buf()));
        Store::open(cfg, RetryPolicy::default()).expect("open should succeed")
    }

    #[test]
    fn open_creates_collection_directories() {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let _store = open_store(tmp.path());

        for collection in Collection::ALL {
            assert!(
                tmp.path().join(collection.dir_name()).is_dir(),
                "{} directory should exist",
                collection.dir_name()
            );
        }
    }

    #[test]
    fn open_fails_with_storage_unavailable_when_root_is_a_file() {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let blocked = tmp.path().join("blocked");
        fs::write(&blocked, "not a directory").expect("should write blocker file");

        let cfg = Arc::new(CoreConfig::new(blocked));
        let retry = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
        };

        let err = Store::open(cfg, retry).expect_err("open should fail");
        assert!(matches!(
            err,
            ClinicError::StorageUnavailable { attempts: 2, .. }
        ));
    }

    #[test]
    fn put_get_remove_round_trip() {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(tmp.path());

        let doc = Doc {
            id: Uuid::new_v4(),
            label: "hello".into(),
        };

        store
            .put(Collection::Accounts, &doc.id, &doc)
            .expect("put should succeed");

        let read: Option<Doc> = store
            .get(Collection::Accounts, &doc.id)
            .expect("get should succeed");
        assert_eq!(read, Some(Doc { id: doc.id, label: "hello".into() }));

        assert!(store
            .remove(Collection::Accounts, &doc.id)
            .expect("remove should succeed"));
        let gone: Option<Doc> = store
            .get(Collection::Accounts, &doc.id)
            .expect("get should succeed");
        assert_eq!(gone, None);

        // A second remove is a no-op.
        assert!(!store
            .remove(Collection::Accounts, &doc.id)
            .expect("remove should succeed"));
    }

    #[test]
    fn scan_skips_unparsable_documents() {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(tmp.path());

        let doc = Doc {
            id: Uuid::new_v4(),
            label: "valid".into(),
        };
        store
            .put(Collection::Providers, &doc.id, &doc)
            .expect("put should succeed");

        fs::write(
            tmp.path()
                .join(Collection::Providers.dir_name())
                .join(format!("{}.json", Uuid::new_v4())),
            "{not json",
        )
        .expect("should write invalid document");

        let docs: Vec<Doc> = store
            .scan(Collection::Providers)
            .expect("scan should succeed");
        assert_eq!(docs.len(), 1, "only the valid document should survive");
        assert_eq!(docs[0].label, "valid");
    }

    #[test]
    fn scan_of_missing_directory_is_empty() {
        let tmp = TempDir::new().expect("Failed to create temp dir");
        let store = open_store(tmp.path());
        fs::remove_dir_all(tmp.path().join(Collection::Appointments.dir_name()))
            .expect("should remove dir");

        let docs: Vec<Doc> = store
            .scan(Collection::Appointments)
            .expect("scan should succeed");
        assert!(docs.is_empty());
    }
}
