//! Credential persistence behind a swappable store abstraction.
//!
//! The browser version of this application kept its tokens in a cookie jar.
//! Here the same contract is an explicit trait so the refresh logic can be
//! exercised against an in-memory store in tests, with a JSON-file-backed
//! implementation standing in for the cookie jar in real use.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::tokens::Credential;
use crate::error::ApiError;

/// Store key for the short-lived access credential.
pub const ACCESS_KEY: &str = "access_token";

/// Store key for the long-lived refresh credential.
pub const REFRESH_KEY: &str = "refresh_token";

/// Key-value store with per-key expiry.
///
/// `get` must never return an expired credential.
pub trait CredentialStore: Send + Sync {
  fn get(&self, key: &str) -> Option<String>;
  fn put(&self, key: &str, credential: Credential) -> Result<(), ApiError>;
  fn remove(&self, key: &str) -> Result<(), ApiError>;
  fn clear(&self) -> Result<(), ApiError>;
}

/// In-memory store, used in tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryCredentialStore {
  entries: Mutex<HashMap<String, Credential>>,
}

impl MemoryCredentialStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Credential>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CredentialStore for MemoryCredentialStore {
  fn get(&self, key: &str) -> Option<String> {
    let entries = self.lock();
    entries
      .get(key)
      .filter(|c| !c.is_expired())
      .map(|c| c.value.clone())
  }

  fn put(&self, key: &str, credential: Credential) -> Result<(), ApiError> {
    self.lock().insert(key.to_string(), credential);
    Ok(())
  }

  fn remove(&self, key: &str) -> Result<(), ApiError> {
    self.lock().remove(key);
    Ok(())
  }

  fn clear(&self) -> Result<(), ApiError> {
    self.lock().clear();
    Ok(())
  }
}

/// On-disk serialized form.
#[derive(Default, Serialize, Deserialize)]
struct CredentialFile {
  entries: HashMap<String, Credential>,
}

/// JSON file store so credentials survive a restart, like cookies survive a
/// page reload.
pub struct FileCredentialStore {
  path: PathBuf,
  entries: Mutex<HashMap<String, Credential>>,
}

impl FileCredentialStore {
  /// Open the store at the default location.
  pub fn open() -> Result<Self, ApiError> {
    Self::open_at(Self::default_path()?)
  }

  /// Open the store at an explicit path, loading existing credentials and
  /// pruning any that have expired.
  pub fn open_at(path: PathBuf) -> Result<Self, ApiError> {
    let mut entries = if path.exists() {
      let contents = std::fs::read_to_string(&path).map_err(|e| {
        ApiError::Store(format!("failed to read {}: {}", path.display(), e))
      })?;
      serde_json::from_str::<CredentialFile>(&contents)
        .map(|f| f.entries)
        .unwrap_or_else(|e| {
          tracing::warn!(path = %path.display(), error = %e, "credential file unreadable, starting fresh");
          HashMap::new()
        })
    } else {
      HashMap::new()
    };

    entries.retain(|_, c| !c.is_expired());

    Ok(Self {
      path,
      entries: Mutex::new(entries),
    })
  }

  fn default_path() -> Result<PathBuf, ApiError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| ApiError::Store("could not determine data directory".to_string()))?;

    Ok(data_dir.join("dashkit").join("credentials.json"))
  }

  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Credential>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn persist(&self, entries: &HashMap<String, Credential>) -> Result<(), ApiError> {
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent).map_err(|e| {
        ApiError::Store(format!("failed to create {}: {}", parent.display(), e))
      })?;
    }

    let file = CredentialFile {
      entries: entries.clone(),
    };
    let contents = serde_json::to_string_pretty(&file)?;
    std::fs::write(&self.path, contents).map_err(|e| {
      ApiError::Store(format!("failed to write {}: {}", self.path.display(), e))
    })
  }
}

impl CredentialStore for FileCredentialStore {
  fn get(&self, key: &str) -> Option<String> {
    let entries = self.lock();
    entries
      .get(key)
      .filter(|c| !c.is_expired())
      .map(|c| c.value.clone())
  }

  fn put(&self, key: &str, credential: Credential) -> Result<(), ApiError> {
    let mut entries = self.lock();
    entries.insert(key.to_string(), credential);
    self.persist(&entries)
  }

  fn remove(&self, key: &str) -> Result<(), ApiError> {
    let mut entries = self.lock();
    entries.remove(key);
    self.persist(&entries)
  }

  fn clear(&self) -> Result<(), ApiError> {
    let mut entries = self.lock();
    entries.clear();
    self.persist(&entries)
  }
}
