//! Core traits for the caching system.

/// Identity of a cached query result.
///
/// A key belongs to a namespace (one per resource family) and produces a
/// stable fingerprint for cache addressing plus a human-readable description
/// for logs.
pub trait QueryKey {
  /// Namespace this key belongs to (e.g. "tasks", "movies"). Invalidation
  /// can target a whole namespace at once.
  fn namespace(&self) -> &'static str;

  /// Stable, fixed-length fingerprint of the key's parameters.
  fn cache_hash(&self) -> String;

  /// Human-readable description for logging.
  fn description(&self) -> String;
}
