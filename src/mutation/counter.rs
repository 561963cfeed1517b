//! Per-class bookkeeping of in-flight mutations.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Label grouping mutations that share one pending counter and one
/// invalidation decision (e.g. "task-toggle-status").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MutationClass(pub &'static str);

impl fmt::Display for MutationClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.0)
  }
}

/// Counts in-flight mutations per class.
///
/// Owned by whoever assembles the coordinator and injected into it, so
/// independent coordinators (and tests) never share counter state. Clones
/// share the underlying counters.
#[derive(Clone, Default)]
pub struct PendingMutations {
  counts: Arc<Mutex<HashMap<MutationClass, u32>>>,
}

impl PendingMutations {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<MutationClass, u32>> {
    self.counts.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Record the start of a mutation. Returns the new in-flight count.
  pub fn increment(&self, class: MutationClass) -> u32 {
    let mut counts = self.lock();
    let count = counts.entry(class).or_insert(0);
    *count += 1;
    *count
  }

  /// Record the end of a mutation (success or failure). Returns the new
  /// in-flight count. Saturates at zero; an underflow means increment and
  /// decrement calls were unbalanced and is logged.
  pub fn decrement(&self, class: MutationClass) -> u32 {
    let mut counts = self.lock();
    match counts.get_mut(&class) {
      Some(count) if *count > 0 => {
        *count -= 1;
        *count
      }
      _ => {
        tracing::warn!(%class, "pending mutation counter underflow");
        0
      }
    }
  }

  /// Current number of in-flight mutations of `class`.
  pub fn count(&self, class: MutationClass) -> u32 {
    self.lock().get(&class).copied().unwrap_or(0)
  }
}
