//! Dashboard resource types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
  Todo,
  Done,
}

impl TaskStatus {
  pub fn toggled(self) -> Self {
    match self {
      Self::Todo => Self::Done,
      Self::Done => Self::Todo,
    }
  }
}

/// A task list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
  pub id: i64,
  pub title: String,
  pub description: String,
  pub status: TaskStatus,
  pub due_date: Option<DateTime<Utc>>,
}

/// Fields for creating or editing a task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDraft {
  pub title: String,
  pub description: String,
  pub due_date: Option<DateTime<Utc>>,
}

/// A review attached to a movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub id: i64,
  pub movie: i64,
  pub user: String,
  pub rating: u8,
  pub comment: String,
  pub created_at: DateTime<Utc>,
}

/// A catalog entry with its aggregated review data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
  pub id: i64,
  pub title: String,
  pub genre: String,
  pub description: String,
  #[serde(default)]
  pub reviews: Vec<Review>,
  pub release_year: i32,
  #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
  #[serde(default)]
  pub avg_rating: f64,
  #[serde(default)]
  pub is_watchlisted: bool,
}

/// One page of the movie catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedMovies {
  pub count: u64,
  pub next: Option<String>,
  pub previous: Option<String>,
  pub results: Vec<Movie>,
}

/// Fields for creating or editing a movie.
#[derive(Debug, Clone, Serialize)]
pub struct MovieDraft {
  pub title: String,
  pub genre: String,
  pub description: String,
  pub release_year: i32,
  #[serde(rename = "imageUrl", skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
}

/// Fields for creating or editing a review.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewDraft {
  pub comment: String,
  pub rating: u8,
}
