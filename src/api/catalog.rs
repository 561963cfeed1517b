//! Movie catalog resource client: movies, reviews, watchlist.

use std::sync::Arc;

use serde_json::json;
use url::form_urlencoded;

use super::keys::{DashboardKey, MOVIES_NAMESPACE};
use super::types::{Movie, MovieDraft, PaginatedMovies, ReviewDraft};
use crate::cache::{CacheLayer, CacheStore};
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::mutation::{MutationClass, MutationCoordinator};

const WATCHLIST_TOGGLE: MutationClass = MutationClass("movie-watchlist-toggle");

pub struct CatalogClient<S: CacheStore> {
  api: Arc<ApiClient>,
  cache: CacheLayer<S>,
  coordinator: MutationCoordinator<S>,
}

impl<S: CacheStore> CatalogClient<S> {
  pub fn new(api: Arc<ApiClient>, coordinator: MutationCoordinator<S>) -> Self {
    Self {
      api,
      cache: coordinator.cache().clone(),
      coordinator,
    }
  }

  /// One page of the catalog, cached per page/filter/ordering combination.
  pub async fn list(
    &self,
    page: u32,
    title: Option<&str>,
    ordering: Option<&str>,
  ) -> Result<PaginatedMovies, ApiError> {
    let key = DashboardKey::Movies {
      page,
      title: title.map(String::from),
      ordering: ordering.map(String::from),
    };

    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("page", &page.to_string());
    if let Some(t) = title {
      query.append_pair("title", t);
    }
    if let Some(o) = ordering {
      query.append_pair("ordering", o);
    }
    let path = format!("/movies/?{}", query.finish());

    self
      .cache
      .fetch(&key, || {
        let api = Arc::clone(&self.api);
        async move { api.get(&path).await }
      })
      .await
  }

  /// A single movie with its reviews, cached.
  pub async fn detail(&self, movie_id: i64) -> Result<Movie, ApiError> {
    self
      .cache
      .fetch(&DashboardKey::MovieDetail { movie_id }, || {
        let api = Arc::clone(&self.api);
        async move {
          api
            .post("/movies/movie-detail/", json!({ "id": movie_id }))
            .await
        }
      })
      .await
  }

  pub async fn create_movie(&self, draft: &MovieDraft) -> Result<(), ApiError> {
    self
      .api
      .post_unit("/movies/create/", serde_json::to_value(draft)?)
      .await?;

    self.cache.invalidate_namespace(MOVIES_NAMESPACE);
    self.coordinator.notifier().success("Movie created");
    Ok(())
  }

  pub async fn update_movie(&self, movie_id: i64, draft: &MovieDraft) -> Result<(), ApiError> {
    let mut body = serde_json::to_value(draft)?;
    body["id"] = json!(movie_id);
    self.api.put_unit("/movies/movie-detail/", Some(body)).await?;

    self.invalidate_movie(movie_id);
    self.coordinator.notifier().success("Movie updated");
    Ok(())
  }

  pub async fn delete_movie(&self, movie_id: i64) -> Result<(), ApiError> {
    self
      .api
      .post_unit("/movies/movie-delete/", json!({ "id": movie_id }))
      .await?;

    self.invalidate_movie(movie_id);
    self.coordinator.notifier().success("Movie deleted");
    Ok(())
  }

  pub async fn create_review(&self, movie_id: i64, draft: &ReviewDraft) -> Result<(), ApiError> {
    self
      .api
      .post_unit(
        "/movies/review/create-review/",
        json!({
          "movie_id": movie_id,
          "comment": draft.comment,
          "rating": draft.rating,
        }),
      )
      .await?;

    self.invalidate_movie(movie_id);
    self.coordinator.notifier().success("Review added");
    Ok(())
  }

  pub async fn edit_review(
    &self,
    review_id: i64,
    movie_id: i64,
    draft: &ReviewDraft,
  ) -> Result<(), ApiError> {
    self
      .api
      .post_unit(
        "/movies/review/edit-review/",
        json!({
          "review_id": review_id,
          "comment": draft.comment,
          "rating": draft.rating,
        }),
      )
      .await?;

    self.invalidate_movie(movie_id);
    self.coordinator.notifier().success("Review updated");
    Ok(())
  }

  pub async fn delete_review(&self, review_id: i64, movie_id: i64) -> Result<(), ApiError> {
    self
      .api
      .post_unit(
        "/movies/review/delete-review/",
        json!({ "review_id": review_id }),
      )
      .await?;

    self.invalidate_movie(movie_id);
    self.coordinator.notifier().success("Review deleted");
    Ok(())
  }

  /// Flip a movie's watchlist membership on the cached page, optimistically.
  ///
  /// `page_key` identifies the catalog page being viewed; `watchlisted` is
  /// the movie's current state, which picks the endpoint.
  pub async fn toggle_watchlist(
    &self,
    page_key: &DashboardKey,
    movie_id: i64,
    watchlisted: bool,
  ) -> Result<(), ApiError> {
    let api = Arc::clone(&self.api);
    let endpoint = if watchlisted {
      "/movies/watchlist/remove/"
    } else {
      "/movies/watchlist/"
    };

    self
      .coordinator
      .run(
        page_key,
        WATCHLIST_TOGGLE,
        "Watchlist update",
        move |page: Option<PaginatedMovies>| {
          Ok(page.map(|mut page| {
            if let Some(movie) = page.results.iter_mut().find(|m| m.id == movie_id) {
              movie.is_watchlisted = !movie.is_watchlisted;
            }
            page
          }))
        },
        move || async move { api.post_unit(endpoint, json!({ "movie_id": movie_id })).await },
      )
      .await
  }

  /// A movie's detail entry and every catalog page can both render state
  /// affected by a movie mutation, so drop both.
  fn invalidate_movie(&self, movie_id: i64) {
    self.cache.invalidate(&DashboardKey::MovieDetail { movie_id });
    self.cache.invalidate_namespace(MOVIES_NAMESPACE);
  }
}
