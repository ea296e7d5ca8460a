//! Durable key-value storage for the session.
//!
//! Only two values survive a restart: the bearer token under [`TOKEN_KEY`]
//! and the JSON-serialized [`Identity`] under [`USER_KEY`]. There is no
//! schema versioning; a `user` value that no longer decodes is treated as
//! absent.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use extickets_core::Identity;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Key holding the serialized identity.
pub const USER_KEY: &str = "user";

/// Errors from the backing store.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt state file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// String-keyed durable storage.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys stored as one JSON object in a file.
///
/// The file and its parent directories are created on first write.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: self.path.clone(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(source) => Err(StorageError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let bytes = serde_json::to_vec_pretty(entries)?;
        std::fs::write(&self.path, bytes).map_err(io_err)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }
}

/// Token and identity persisted across restarts.
#[derive(Debug, Clone)]
pub struct PersistedSession {
    pub token: SecretString,
    pub identity: Identity,
}

impl PersistedSession {
    /// Load the saved session, if both halves are present and decode.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store itself fails.
    pub fn load(store: &dyn KeyValueStore) -> Result<Option<Self>, StorageError> {
        let Some(token) = store.get(TOKEN_KEY)? else {
            return Ok(None);
        };
        let Some(raw_user) = store.get(USER_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<Identity>(&raw_user) {
            Ok(identity) => Ok(Some(Self {
                token: SecretString::from(token),
                identity,
            })),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring undecodable stored user");
                Ok(None)
            }
        }
    }

    /// Save token and identity.
    ///
    /// The previous token goes first and the new one is written last, so a
    /// failure part way leaves no loadable session rather than a token paired
    /// with someone else's identity.
    ///
    /// # Errors
    ///
    /// Returns an error if the identity cannot be serialized or the store fails.
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StorageError> {
        let user = serde_json::to_string(&self.identity)?;
        store.remove(TOKEN_KEY)?;
        store.set(USER_KEY, &user)?;
        store.set(TOKEN_KEY, self.token.expose_secret())
    }

    /// Remove both keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub fn clear(store: &dyn KeyValueStore) -> Result<(), StorageError> {
        store.remove(TOKEN_KEY)?;
        store.remove(USER_KEY)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use extickets_core::{Email, Role};

    use super::*;

    fn session() -> PersistedSession {
        let mut identity = Identity::new("Ann", Email::parse("ann@x.com").unwrap());
        identity.is_google = true;
        PersistedSession {
            token: SecretString::from("server-token"),
            identity,
        }
    }

    #[test]
    fn test_memory_store_basic_ops() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileStore::new(&path).set(TOKEN_KEY, "abc").unwrap();
        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));

        reopened.remove(TOKEN_KEY).unwrap();
        assert_eq!(FileStore::new(&path).get(TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("absent.json"));
        assert_eq!(store.get(USER_KEY).unwrap(), None);
        store.remove(USER_KEY).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_file_store_reports_corruption() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = FileStore::new(&path).get(TOKEN_KEY).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn test_persisted_session_roundtrip_and_clear() {
        let store = MemoryStore::new();
        session().save(&store).unwrap();

        let loaded = PersistedSession::load(&store).unwrap().unwrap();
        assert_eq!(loaded.token.expose_secret(), "server-token");
        assert_eq!(loaded.identity.role, Role::User);
        assert!(loaded.identity.is_google);

        PersistedSession::clear(&store).unwrap();
        assert!(PersistedSession::load(&store).unwrap().is_none());
        assert_eq!(store.get(TOKEN_KEY).unwrap(), None);
    }

    /// Refuses writes to one key.
    struct FailingSet {
        inner: MemoryStore,
        key: &'static str,
    }

    impl KeyValueStore for FailingSet {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == self.key {
                return Err(StorageError::Io {
                    path: PathBuf::from("memory"),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_partial_save_leaves_no_mixed_session() {
        let mut admin = Identity::new("Admin", Email::parse("admin@company.com").unwrap());
        admin.role = Role::Admin;
        let previous = PersistedSession {
            token: SecretString::from("admin-token"),
            identity: admin,
        };

        for key in [TOKEN_KEY, USER_KEY] {
            let store = FailingSet {
                inner: MemoryStore::new(),
                key: "",
            };
            previous.save(&store).unwrap();
            let store = FailingSet {
                inner: store.inner,
                key,
            };

            session().save(&store).unwrap_err();
            assert!(
                PersistedSession::load(&store).unwrap().is_none(),
                "failed write of {key} left a loadable session"
            );
        }
    }

    #[test]
    fn test_load_requires_both_keys() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "admin-token").unwrap();
        assert!(PersistedSession::load(&store).unwrap().is_none());
    }

    #[test]
    fn test_load_ignores_undecodable_user() {
        let store = MemoryStore::new();
        store.set(TOKEN_KEY, "t").unwrap();
        store.set(USER_KEY, "{\"name\":1}").unwrap();
        assert!(PersistedSession::load(&store).unwrap().is_none());
    }
}
