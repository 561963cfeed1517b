//! Cache layer that orchestrates caching logic with network fetching.

use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;

use super::storage::{CacheStore, CachedValue};
use super::traits::QueryKey;
use crate::error::ApiError;

/// Keyed cache with stale-time semantics.
///
/// Sits between resource clients and the network, providing read-through
/// fetching, optimistic writes, invalidation, and cancellation of in-flight
/// fetches. Mutation of cached values goes through the mutation coordinator;
/// everything else treats the cache as read-through.
pub struct CacheLayer<S: CacheStore> {
  store: Arc<S>,
  /// How long before cached data is considered stale
  stale_time: Duration,
}

impl<S: CacheStore> CacheLayer<S> {
  /// Create a new cache layer with the given storage backend.
  pub fn new(store: S) -> Self {
    Self {
      store: Arc::new(store),
      stale_time: Duration::minutes(5),
    }
  }

  /// Set the stale time for cached data.
  pub fn with_stale_time(mut self, stale_time: Duration) -> Self {
    self.stale_time = stale_time;
    self
  }

  /// Check if cached data is stale based on the cached_at timestamp.
  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    Utc::now() - cached_at > self.stale_time
  }

  /// Full storage key for a query key: namespace prefix + fingerprint.
  pub(crate) fn storage_key(key: &impl QueryKey) -> String {
    format!("{}:{}", key.namespace(), key.cache_hash())
  }

  /// Read the cached value for `key`, if present and decodable.
  pub fn read<T: DeserializeOwned>(&self, key: &impl QueryKey) -> Option<T> {
    let entry = self.store.get(&Self::storage_key(key))?;
    serde_json::from_value(entry.value).ok()
  }

  pub(crate) fn read_raw(&self, storage_key: &str) -> Option<CachedValue> {
    self.store.get(storage_key)
  }

  /// Write a value for `key` immediately (an optimistic write).
  pub fn write<T: Serialize>(&self, key: &impl QueryKey, value: &T) -> Result<(), ApiError> {
    self.store.put(&Self::storage_key(key), serde_json::to_value(value)?);
    Ok(())
  }

  pub(crate) fn write_raw(&self, storage_key: &str, value: Value) {
    self.store.put(storage_key, value);
  }

  pub(crate) fn remove_raw(&self, storage_key: &str) {
    self.store.remove(storage_key);
  }

  /// Drop the entry for `key`, forcing the next read to refetch.
  /// No-op when the entry is absent.
  pub fn invalidate(&self, key: &impl QueryKey) {
    tracing::debug!(key = %key.description(), "invalidate");
    self.store.remove(&Self::storage_key(key));
  }

  /// Drop every entry in a namespace (e.g. all cached movie pages).
  pub fn invalidate_namespace(&self, namespace: &str) {
    tracing::debug!(%namespace, "invalidate namespace");
    self.store.remove_prefix(&format!("{}:", namespace));
  }

  /// Cancel in-flight fetches for `key` so a late-arriving server read
  /// cannot overwrite a newer optimistic value.
  pub fn cancel_in_flight(&self, key: &impl QueryKey) {
    self.store.cancel_fetches(&Self::storage_key(key));
  }

  /// Fetch with a cache-first strategy.
  ///
  /// 1. If the cached entry is fresh, return it without touching the network
  /// 2. If stale or missing, run the fetcher
  /// 3. On fetcher failure, serve the stale entry if one exists (offline mode)
  /// 4. Store the fetched value, unless the fetch was cancelled meanwhile
  pub async fn fetch<T, F, Fut>(&self, key: &impl QueryKey, fetcher: F) -> Result<T, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
  {
    let storage_key = Self::storage_key(key);
    let cached = self.store.get(&storage_key);

    if let Some(entry) = &cached {
      if !self.is_stale(entry.cached_at) {
        if let Ok(value) = serde_json::from_value::<T>(entry.value.clone()) {
          tracing::debug!(key = %key.description(), "cache fresh");
          return Ok(value);
        }
        // Undecodable entry, fall through to a refetch
        tracing::warn!(key = %key.description(), "cached value failed to decode, refetching");
      }
    }

    let epoch = self.store.fetch_epoch(&storage_key);
    match fetcher().await {
      Ok(data) => {
        if self.store.fetch_epoch(&storage_key) == epoch {
          self.store.put(&storage_key, serde_json::to_value(&data)?);
          return Ok(data);
        }

        // The fetch was cancelled while in flight; an optimistic write may
        // have landed meanwhile and takes precedence over this result.
        tracing::debug!(key = %key.description(), "fetch cancelled, discarding result");
        match self
          .store
          .get(&storage_key)
          .and_then(|c| serde_json::from_value(c.value).ok())
        {
          Some(current) => Ok(current),
          None => Ok(data),
        }
      }
      Err(err) => {
        // Network failed, serve stale cache if we have it (offline mode)
        if let Some(entry) = cached {
          if let Ok(value) = serde_json::from_value::<T>(entry.value) {
            tracing::debug!(key = %key.description(), error = %err, "fetch failed, serving stale cache");
            return Ok(value);
          }
        }
        Err(err)
      }
    }
  }
}

impl<S: CacheStore> Clone for CacheLayer<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      stale_time: self.stale_time,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::MemoryStore;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc as StdArc;

  struct TestKey(&'static str);

  impl QueryKey for TestKey {
    fn namespace(&self) -> &'static str {
      "test"
    }

    fn cache_hash(&self) -> String {
      self.0.to_string()
    }

    fn description(&self) -> String {
      self.0.to_string()
    }
  }

  #[tokio::test]
  async fn test_fresh_cache_skips_fetcher() {
    let cache = CacheLayer::new(MemoryStore::new());
    let calls = StdArc::new(AtomicU32::new(0));

    for _ in 0..3 {
      let calls = calls.clone();
      let value: Vec<u32> = cache
        .fetch(&TestKey("k"), move || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(vec![1, 2, 3])
        })
        .await
        .unwrap();
      assert_eq!(value, vec![1, 2, 3]);
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_stale_cache_refetches() {
    let cache = CacheLayer::new(MemoryStore::new()).with_stale_time(Duration::zero());
    let calls = StdArc::new(AtomicU32::new(0));

    for _ in 0..2 {
      let calls = calls.clone();
      cache
        .fetch(&TestKey("k"), move || async move {
          calls.fetch_add(1, Ordering::SeqCst);
          Ok(7u32)
        })
        .await
        .unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_fetch_failure_serves_stale_cache() {
    let cache = CacheLayer::new(MemoryStore::new()).with_stale_time(Duration::zero());
    cache.write(&TestKey("k"), &vec![9u32]).unwrap();

    let value: Vec<u32> = cache
      .fetch(&TestKey("k"), || async {
        Err(ApiError::Api {
          status: 500,
          message: "down".to_string(),
        })
      })
      .await
      .unwrap();

    assert_eq!(value, vec![9]);
  }

  #[tokio::test]
  async fn test_fetch_failure_without_cache_propagates() {
    let cache = CacheLayer::new(MemoryStore::new());

    let result: Result<Vec<u32>, _> = cache
      .fetch(&TestKey("missing"), || async {
        Err(ApiError::Api {
          status: 500,
          message: "down".to_string(),
        })
      })
      .await;

    assert!(matches!(result, Err(ApiError::Api { status: 500, .. })));
  }

  #[tokio::test]
  async fn test_cancelled_fetch_does_not_overwrite_optimistic_value() {
    let cache = CacheLayer::new(MemoryStore::new());
    let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

    let fetch_cache = cache.clone();
    let fetch = tokio::spawn(async move {
      fetch_cache
        .fetch(&TestKey("k"), move || async move {
          release_rx.await.ok();
          Ok(7u32)
        })
        .await
    });

    // Let the fetch reach its await point, then cancel it and write an
    // optimistic value.
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    cache.cancel_in_flight(&TestKey("k"));
    cache.write(&TestKey("k"), &42u32).unwrap();
    release_tx.send(()).unwrap();

    // The fetch returns the optimistic value, and the cache retains it.
    assert_eq!(fetch.await.unwrap().unwrap(), 42);
    assert_eq!(cache.read::<u32>(&TestKey("k")), Some(42));
  }

  #[tokio::test]
  async fn test_invalidate_missing_key_is_noop() {
    let cache = CacheLayer::new(MemoryStore::new());
    cache.invalidate(&TestKey("never-written"));
    assert_eq!(cache.read::<u32>(&TestKey("never-written")), None);
  }

  #[tokio::test]
  async fn test_invalidate_namespace_clears_all_entries() {
    let cache = CacheLayer::new(MemoryStore::new());
    cache.write(&TestKey("a"), &1u32).unwrap();
    cache.write(&TestKey("b"), &2u32).unwrap();

    cache.invalidate_namespace("test");
    assert_eq!(cache.read::<u32>(&TestKey("a")), None);
    assert_eq!(cache.read::<u32>(&TestKey("b")), None);
  }
}
