//! Typed clients for the dashboard's REST resources.

mod catalog;
mod keys;
mod session;
mod tasks;
mod types;

pub use catalog::CatalogClient;
pub use keys::DashboardKey;
pub use session::SessionClient;
pub use tasks::TaskClient;
pub use types::{
  Movie, MovieDraft, PaginatedMovies, Review, ReviewDraft, Task, TaskDraft, TaskStatus,
};

use std::sync::Arc;

use chrono::Duration;

use crate::auth::{CredentialStore, FileCredentialStore};
use crate::cache::{CacheLayer, MemoryStore};
use crate::config::Config;
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::mutation::{MutationCoordinator, PendingMutations};
use crate::notify::Notifier;

/// Everything wired together: one HTTP client, one cache, one coordinator,
/// and the per-resource clients sharing them.
pub struct Dashboard {
  pub session: SessionClient,
  pub tasks: TaskClient<MemoryStore>,
  pub catalog: CatalogClient<MemoryStore>,
}

impl Dashboard {
  /// Wire everything from configuration alone, persisting credentials to
  /// the configured file path or the platform default location.
  pub fn open(config: &Config, notifier: Notifier) -> Result<Self, ApiError> {
    let store = match &config.credentials_path {
      Some(path) => FileCredentialStore::open_at(path.clone())?,
      None => FileCredentialStore::open()?,
    };
    Self::new(config, Arc::new(store), notifier)
  }

  pub fn new(
    config: &Config,
    store: Arc<dyn CredentialStore>,
    notifier: Notifier,
  ) -> Result<Self, ApiError> {
    let api = Arc::new(ApiClient::new(
      &config.api,
      Arc::clone(&store),
      notifier.clone(),
    )?);

    let cache = CacheLayer::new(MemoryStore::new())
      .with_stale_time(Duration::seconds(config.cache.stale_time_secs as i64));
    let coordinator = MutationCoordinator::new(cache, PendingMutations::new(), notifier.clone());

    Ok(Self {
      session: SessionClient::new(Arc::clone(&api), store, notifier),
      tasks: TaskClient::new(Arc::clone(&api), coordinator.clone()),
      catalog: CatalogClient::new(api, coordinator),
    })
  }
}
