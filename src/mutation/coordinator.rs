//! The optimistic mutation coordinator.

use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use super::counter::{MutationClass, PendingMutations};
use crate::cache::{CacheLayer, CacheStore, QueryKey};
use crate::error::ApiError;
use crate::notify::Notifier;

/// Phases an optimistic mutation moves through. Transitions are logged at
/// debug level; `Settled` is terminal for both outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationPhase {
  Idle,
  Applying,
  AwaitingRemote,
  Committing,
  RollingBack,
  Settled,
}

/// Executes remote mutations while keeping the cache consistent.
///
/// The procedure for one mutation:
/// 1. increment the pending counter for its class (before any cache write)
/// 2. cancel in-flight fetches for the key
/// 3. snapshot the current cache value
/// 4. apply the optimistic projection and write it synchronously
/// 5. await the remote call
/// 6. on success, decrement; when the class counter reaches zero, invalidate
///    the key so the next read fetches authoritative state - a burst of N
///    mutations costs one refetch, not N
/// 7. on failure, restore the snapshot, notify the user, decrement (no
///    invalidation: the rollback restored already-validated state)
///
/// Concurrent same-key mutations keep per-operation snapshots and settle in
/// completion order (last-settled-wins). A failed operation rolls back to
/// its own pre-image, which may predate a peer's optimistic write; the
/// invalidation on the final success re-syncs with the server either way.
pub struct MutationCoordinator<S: CacheStore> {
  cache: CacheLayer<S>,
  pending: PendingMutations,
  notifier: Notifier,
}

impl<S: CacheStore> Clone for MutationCoordinator<S> {
  fn clone(&self) -> Self {
    Self {
      cache: self.cache.clone(),
      pending: self.pending.clone(),
      notifier: self.notifier.clone(),
    }
  }
}

impl<S: CacheStore> MutationCoordinator<S> {
  pub fn new(cache: CacheLayer<S>, pending: PendingMutations, notifier: Notifier) -> Self {
    Self {
      cache,
      pending,
      notifier,
    }
  }

  /// Shared cache layer this coordinator writes through.
  pub fn cache(&self) -> &CacheLayer<S> {
    &self.cache
  }

  /// Shared pending counters.
  pub fn pending(&self) -> &PendingMutations {
    &self.pending
  }

  /// Notification sink used for mutation outcomes.
  pub fn notifier(&self) -> &Notifier {
    &self.notifier
  }

  /// Run `remote` while the cache at `key` reflects the intended outcome.
  ///
  /// `apply` computes the optimistic projection from the current cached
  /// value; `None` in means the key is absent, `None` out means the cache is
  /// left untouched. A projection failure settles the mutation without a
  /// network attempt. `label` names the operation in user notices.
  pub async fn run<T, Out, A, R, Fut>(
    &self,
    key: &impl QueryKey,
    class: MutationClass,
    label: &str,
    apply: A,
    remote: R,
  ) -> Result<Out, ApiError>
  where
    T: Serialize + DeserializeOwned,
    A: FnOnce(Option<T>) -> Result<Option<T>, ApiError>,
    R: FnOnce() -> Fut,
    Fut: Future<Output = Result<Out, ApiError>>,
  {
    let storage_key = CacheLayer::<S>::storage_key(key);

    // The counter moves before any cache write so a concurrently settling
    // peer never observes zero while this operation is outstanding.
    let in_flight = self.pending.increment(class);
    let mut phase = MutationPhase::Applying;
    tracing::debug!(key = %key.description(), %class, in_flight, ?phase, "mutation started");

    self.cache.cancel_in_flight(key);

    // Per-operation rollback point.
    let snapshot: Option<Value> = self.cache.read_raw(&storage_key).map(|c| c.value);

    let current: Option<T> = match &snapshot {
      Some(value) => match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
          // An undecodable entry is treated as an absent base state.
          tracing::warn!(key = %key.description(), error = %err, "cached value failed to decode");
          None
        }
      },
      None => None,
    };

    let projected = match apply(current).and_then(|next| {
      next
        .map(|value| serde_json::to_value(&value).map_err(ApiError::from))
        .transpose()
    }) {
      Ok(value) => value,
      Err(err) => {
        // Projection failed before any network attempt: settle immediately,
        // counter included.
        phase = MutationPhase::Settled;
        tracing::debug!(key = %key.description(), %class, ?phase, error = %err, "projection failed");
        self.notifier.error(format!("{} failed: {}", label, err));
        self.pending.decrement(class);
        return Err(err);
      }
    };

    if let Some(value) = projected {
      self.cache.write_raw(&storage_key, value);
    }

    phase = MutationPhase::AwaitingRemote;
    tracing::debug!(key = %key.description(), %class, ?phase, "optimistic value applied");

    match remote().await {
      Ok(out) => {
        phase = MutationPhase::Committing;
        let remaining = self.pending.decrement(class);
        tracing::debug!(key = %key.description(), %class, ?phase, remaining, "remote succeeded");
        if remaining == 0 {
          // One authoritative refetch for the whole burst.
          self.cache.invalidate(key);
        }
        self.notifier.success(format!("{} succeeded", label));
        phase = MutationPhase::Settled;
        tracing::debug!(key = %key.description(), %class, ?phase, "mutation settled");
        Ok(out)
      }
      Err(err) => {
        phase = MutationPhase::RollingBack;
        tracing::debug!(key = %key.description(), %class, ?phase, error = %err, "remote failed");
        match snapshot {
          Some(value) => self.cache.write_raw(&storage_key, value),
          None => self.cache.remove_raw(&storage_key),
        }
        self.notifier.error(format!("{} failed: {}", label, err));
        self.pending.decrement(class);
        phase = MutationPhase::Settled;
        tracing::debug!(key = %key.description(), %class, ?phase, "mutation settled");
        Err(err)
      }
    }
  }
}
