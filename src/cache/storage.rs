//! Cache storage trait and in-memory implementation.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A cached value together with its staleness timestamp.
#[derive(Debug, Clone)]
pub struct CachedValue {
  pub value: Value,
  pub cached_at: DateTime<Utc>,
}

/// Storage backend for the cache layer.
///
/// Values are stored as JSON so a single store can hold heterogeneous
/// resource types. Fetch epochs implement cancellation: a fetch records the
/// epoch it started under, and must discard its result if the epoch has
/// moved by the time it completes.
pub trait CacheStore: Send + Sync {
  fn get(&self, key: &str) -> Option<CachedValue>;
  fn put(&self, key: &str, value: Value);
  fn remove(&self, key: &str);
  /// Remove every entry whose key starts with `prefix`.
  fn remove_prefix(&self, prefix: &str);
  /// Current fetch epoch for `key`.
  fn fetch_epoch(&self, key: &str) -> u64;
  /// Invalidate all in-flight fetches for `key` by bumping its epoch.
  fn cancel_fetches(&self, key: &str);
}

/// Process-local in-memory store.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, CachedValue>>,
  epochs: Mutex<HashMap<String, u64>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn entries(&self) -> MutexGuard<'_, HashMap<String, CachedValue>> {
    self.entries.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn epochs(&self) -> MutexGuard<'_, HashMap<String, u64>> {
    self.epochs.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl CacheStore for MemoryStore {
  fn get(&self, key: &str) -> Option<CachedValue> {
    self.entries().get(key).cloned()
  }

  fn put(&self, key: &str, value: Value) {
    self.entries().insert(
      key.to_string(),
      CachedValue {
        value,
        cached_at: Utc::now(),
      },
    );
  }

  fn remove(&self, key: &str) {
    self.entries().remove(key);
  }

  fn remove_prefix(&self, prefix: &str) {
    self.entries().retain(|k, _| !k.starts_with(prefix));
  }

  fn fetch_epoch(&self, key: &str) -> u64 {
    self.epochs().get(key).copied().unwrap_or(0)
  }

  fn cancel_fetches(&self, key: &str) {
    *self.epochs().entry(key.to_string()).or_insert(0) += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_put_get_remove() {
    let store = MemoryStore::new();
    store.put("a", json!([1, 2, 3]));
    assert_eq!(store.get("a").unwrap().value, json!([1, 2, 3]));

    store.remove("a");
    assert!(store.get("a").is_none());

    // Removing an absent key is a no-op
    store.remove("a");
  }

  #[test]
  fn test_remove_prefix() {
    let store = MemoryStore::new();
    store.put("movies:1", json!(1));
    store.put("movies:2", json!(2));
    store.put("tasks:1", json!(3));

    store.remove_prefix("movies:");
    assert!(store.get("movies:1").is_none());
    assert!(store.get("movies:2").is_none());
    assert!(store.get("tasks:1").is_some());
  }

  #[test]
  fn test_cancel_bumps_epoch() {
    let store = MemoryStore::new();
    assert_eq!(store.fetch_epoch("k"), 0);
    store.cancel_fetches("k");
    assert_eq!(store.fetch_epoch("k"), 1);
    store.cancel_fetches("k");
    assert_eq!(store.fetch_epoch("k"), 2);
  }
}
