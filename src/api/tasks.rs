//! Task list resource client.
//!
//! Status toggling and deletion are optimistic: the cached list is updated
//! before the server confirms, through the mutation coordinator. Creation
//! and editing are plain write-then-invalidate.

use std::sync::Arc;

use serde_json::json;

use super::keys::DashboardKey;
use super::types::{Task, TaskDraft};
use crate::cache::{CacheLayer, CacheStore};
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::mutation::{MutationClass, MutationCoordinator};

const TOGGLE_STATUS: MutationClass = MutationClass("task-toggle-status");
const DELETE_TASK: MutationClass = MutationClass("task-delete");

pub struct TaskClient<S: CacheStore> {
  api: Arc<ApiClient>,
  cache: CacheLayer<S>,
  coordinator: MutationCoordinator<S>,
}

impl<S: CacheStore> TaskClient<S> {
  pub fn new(api: Arc<ApiClient>, coordinator: MutationCoordinator<S>) -> Self {
    Self {
      api,
      cache: coordinator.cache().clone(),
      coordinator,
    }
  }

  /// The signed-in user's tasks, cached.
  pub async fn list(&self) -> Result<Vec<Task>, ApiError> {
    self
      .cache
      .fetch(&DashboardKey::Tasks, || {
        let api = Arc::clone(&self.api);
        async move { api.get("/tasks").await }
      })
      .await
  }

  /// Flip a task between TODO and DONE, optimistically.
  pub async fn toggle_status(&self, id: i64) -> Result<(), ApiError> {
    let api = Arc::clone(&self.api);
    self
      .coordinator
      .run(
        &DashboardKey::Tasks,
        TOGGLE_STATUS,
        "Task status update",
        move |tasks: Option<Vec<Task>>| {
          Ok(tasks.map(|mut tasks| {
            if let Some(task) = tasks.iter_mut().find(|t| t.id == id) {
              task.status = task.status.toggled();
            }
            tasks
          }))
        },
        move || async move { api.put_unit(&format!("/tasks/update/{}", id), None).await },
      )
      .await
  }

  /// Delete a task, removing it from the cached list optimistically.
  pub async fn delete(&self, id: i64) -> Result<(), ApiError> {
    let api = Arc::clone(&self.api);
    self
      .coordinator
      .run(
        &DashboardKey::Tasks,
        DELETE_TASK,
        "Task deletion",
        move |tasks: Option<Vec<Task>>| {
          Ok(tasks.map(|mut tasks| {
            tasks.retain(|t| t.id != id);
            tasks
          }))
        },
        move || async move { api.delete_unit(&format!("/tasks/delete/{}", id)).await },
      )
      .await
  }

  /// Create a task and refetch the list on next read.
  pub async fn create(&self, draft: &TaskDraft) -> Result<(), ApiError> {
    self
      .api
      .post_unit("/tasks/create/", serde_json::to_value(draft)?)
      .await?;

    self.cache.invalidate(&DashboardKey::Tasks);
    self.coordinator.notifier().success("Task created");
    Ok(())
  }

  /// Edit a task's fields and refetch the list on next read.
  pub async fn edit(&self, id: i64, draft: &TaskDraft) -> Result<(), ApiError> {
    let mut body = serde_json::to_value(draft)?;
    body["id"] = json!(id);
    self.api.post_unit("/tasks/edit/", body).await?;

    self.cache.invalidate(&DashboardKey::Tasks);
    self.coordinator.notifier().success("Task updated");
    Ok(())
  }
}
