//! Generic keyed cache with stale-time semantics.
//!
//! This module provides a resource-agnostic caching mechanism that:
//! - Addresses entries by namespaced, fingerprinted query keys
//! - Serves fresh entries without a network round trip
//! - Serves stale entries when the network is unavailable (offline mode)
//! - Supports optimistic writes, invalidation, and cancellation of
//!   in-flight fetches (the contract the mutation coordinator relies on)

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use storage::{CacheStore, CachedValue, MemoryStore};
pub use traits::QueryKey;
