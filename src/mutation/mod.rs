//! Optimistic mutation coordination.
//!
//! The coordinator executes a state-changing remote call while the cache
//! reflects the intended outcome immediately, rolling back on failure. A
//! per-class pending counter turns a burst of N overlapping mutations into
//! exactly one cache invalidation (and therefore one refetch) once the last
//! of them settles.

mod coordinator;
mod counter;

pub use coordinator::{MutationCoordinator, MutationPhase};
pub use counter::{MutationClass, PendingMutations};
