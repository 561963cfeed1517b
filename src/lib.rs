//! dashkit - client-side data layer for an administrative dashboard.
//!
//! Talks to a remote REST API (movie catalog + personal task list) with:
//! - a keyed cache with stale-time semantics and offline fallback
//! - optimistic mutations coordinated so that a burst of overlapping
//!   operations rolls up into a single authoritative refetch
//! - bearer-token authentication with silent refresh on 401
//!
//! The UI on top only needs to call the resource clients and drain the
//! notification channel.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod http;
pub mod mutation;
pub mod notify;

pub use api::{Dashboard, DashboardKey};
pub use auth::{CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use cache::{CacheLayer, CacheStore, MemoryStore, QueryKey};
pub use config::Config;
pub use error::ApiError;
pub use http::ApiClient;
pub use mutation::{MutationClass, MutationCoordinator, MutationPhase, PendingMutations};
pub use notify::{Notice, NoticeLevel, Notifier};
