//! Durable key-value storage for credentials.
//!
//! # Design
//! - Storage is injected as a trait object so tests can swap in [`MemoryStore`].
//! - The token triple is always written through [`KeyValueStore::set_many`] so the keys land together.
//! - Reads and clears are not transactional across callers.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{StorageError, StorageResult};
use crate::models::AuthTokens;

/// Key holding the access token.
pub const ACCESS_TOKEN_KEY: &str = "token";
/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Key holding the access token expiry as epoch seconds.
pub const EXPIRES_IN_KEY: &str = "expiresIn";

/// String key-value store that outlives the process.
pub trait KeyValueStore: Send + Sync {
    /// Value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot persist the change.
    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Store several entries at once.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot persist the change.
    fn set_many(&self, entries: &[(&str, &str)]) -> StorageResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Delete `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot persist the change.
    fn remove(&self, key: &str) -> StorageResult<()>;

    /// Delete every key.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the backend cannot persist the change.
    fn clear(&self) -> StorageResult<()>;
}

/// Process-local store, used in tests and for throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `entries`.
    #[must_use]
    pub fn with_entries(entries: &[(&str, &str)]) -> Self {
        let map = entries
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> StorageResult<()> {
        let mut entries = self.lock();
        for (key, value) in pairs {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock().remove(key);
        Ok(())
    }

    fn clear(&self) -> StorageResult<()> {
        self.lock().clear();
        Ok(())
    }
}

/// Store persisted as a JSON object on disk.
///
/// Every mutation rewrites the file through a sibling temporary file and a
/// rename, so readers never see a half-written document.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] when the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StorageError::Format {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => {
                return Err(StorageError::Io {
                    operation: "read",
                    path,
                    source,
                });
            }
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn mutate<F>(&self, apply: F) -> StorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = entries.clone();
        apply(&mut next);
        write_atomically(&self.path, &next)?;
        *entries = next;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> StorageResult<()> {
        self.mutate(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.mutate(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> StorageResult<()> {
        self.mutate(BTreeMap::clear)
    }
}

fn write_atomically(path: &Path, entries: &BTreeMap<String, String>) -> StorageResult<()> {
    let io_error = |operation: &'static str, target: &Path| {
        let target = target.to_path_buf();
        move |source: io::Error| StorageError::Io {
            operation,
            path: target,
            source,
        }
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error("create_dir", parent))?;
    }
    let payload = serde_json::to_vec_pretty(entries).map_err(|source| StorageError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    let staging = path.with_extension("tmp");
    fs::write(&staging, payload).map_err(io_error("write", &staging))?;
    fs::rename(&staging, path).map_err(io_error("rename", path))?;
    Ok(())
}

/// Snapshot of the stored token triple.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredTokens {
    /// Access token.
    pub access_token: Option<String>,
    /// Refresh token.
    pub refresh_token: Option<String>,
    /// Access token expiry as stored (epoch seconds).
    pub expires_in: Option<String>,
}

impl StoredTokens {
    /// Read the triple, treating empty strings as absent.
    #[must_use]
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let read = |key: &str| store.get(key).filter(|value| !value.is_empty());
        Self {
            access_token: read(ACCESS_TOKEN_KEY),
            refresh_token: read(REFRESH_TOKEN_KEY),
            expires_in: read(EXPIRES_IN_KEY),
        }
    }

    /// Expiry parsed as epoch seconds; `None` when absent or not numeric.
    ///
    /// Fractional expiries round down, which keeps `expires_at < now` exact
    /// for whole-second `now`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn expires_at(&self) -> Option<i64> {
        let raw = self.expires_in.as_deref()?.trim();
        raw.parse::<i64>().ok().or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|seconds| seconds.is_finite())
                // `as` saturates at the i64 bounds.
                .map(|seconds| seconds.floor() as i64)
        })
    }

    /// Whether an access token and its expiry are both stored.
    #[must_use]
    pub const fn has_session(&self) -> bool {
        self.access_token.is_some() && self.expires_in.is_some()
    }

    /// Whether the access token has expired and can be regenerated at `now`.
    #[must_use]
    pub fn needs_refresh(&self, now: i64) -> bool {
        self.has_session()
            && self.refresh_token.is_some()
            && self.expires_at().is_some_and(|expires_at| expires_at < now)
    }
}

/// Write all three token keys in one operation.
///
/// # Errors
///
/// Returns [`StorageError`] when the backend cannot persist the triple.
pub fn persist_tokens(store: &dyn KeyValueStore, tokens: &AuthTokens) -> StorageResult<()> {
    store.set_many(&[
        (ACCESS_TOKEN_KEY, tokens.token.as_str()),
        (REFRESH_TOKEN_KEY, tokens.refresh_token.as_str()),
        (EXPIRES_IN_KEY, tokens.expires_in.as_str()),
    ])
}
