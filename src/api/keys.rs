//! Cache keys for dashboard resources.

use sha2::{Digest, Sha256};

use crate::cache::QueryKey;

pub const TASKS_NAMESPACE: &str = "tasks";
pub const MOVIES_NAMESPACE: &str = "movies";
pub const MOVIE_DETAIL_NAMESPACE: &str = "movie_detail";

/// Query key types for the dashboard API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DashboardKey {
  /// The signed-in user's task list
  Tasks,
  /// One page of the movie catalog
  Movies {
    page: u32,
    title: Option<String>,
    ordering: Option<String>,
  },
  /// A single movie with its reviews
  MovieDetail { movie_id: i64 },
}

impl QueryKey for DashboardKey {
  fn namespace(&self) -> &'static str {
    match self {
      Self::Tasks => TASKS_NAMESPACE,
      Self::Movies { .. } => MOVIES_NAMESPACE,
      Self::MovieDetail { .. } => MOVIE_DETAIL_NAMESPACE,
    }
  }

  fn cache_hash(&self) -> String {
    let input = match self {
      Self::Tasks => "tasks".to_string(),
      Self::Movies {
        page,
        title,
        ordering,
      } => format!(
        "movies:{}:{}:{}",
        page,
        title.as_deref().map(normalize_filter).unwrap_or_default(),
        ordering.as_deref().unwrap_or("")
      ),
      Self::MovieDetail { movie_id } => format!("movie_detail:{}", movie_id),
    };

    // SHA256 hash for stable, fixed-length keys
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }

  fn description(&self) -> String {
    match self {
      Self::Tasks => "task list".to_string(),
      Self::Movies {
        page,
        title,
        ordering,
      } => {
        let mut desc = format!("movies page {}", page);
        if let Some(t) = title {
          desc.push_str(&format!(" title '{}'", t));
        }
        if let Some(o) = ordering {
          desc.push_str(&format!(" ordered by {}", o));
        }
        desc
      }
      Self::MovieDetail { movie_id } => format!("movie {}", movie_id),
    }
  }
}

/// Normalize a free-text filter for consistent hashing.
fn normalize_filter(title: &str) -> String {
  title.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_hash_is_stable_and_parameter_sensitive() {
    let a = DashboardKey::Movies {
      page: 1,
      title: None,
      ordering: None,
    };
    let b = DashboardKey::Movies {
      page: 2,
      title: None,
      ordering: None,
    };

    assert_eq!(a.cache_hash(), a.cache_hash());
    assert_ne!(a.cache_hash(), b.cache_hash());
  }

  #[test]
  fn test_title_filter_is_normalized() {
    let a = DashboardKey::Movies {
      page: 1,
      title: Some("  Heat ".to_string()),
      ordering: None,
    };
    let b = DashboardKey::Movies {
      page: 1,
      title: Some("heat".to_string()),
      ordering: None,
    };

    assert_eq!(a.cache_hash(), b.cache_hash());
  }
}
