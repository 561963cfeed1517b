use std::sync::Arc;

use httpmock::prelude::*;
use serde_json::{json, Value};

use dashkit::auth::{access_ttl, refresh_ttl, Credential, CredentialStore, ACCESS_KEY, REFRESH_KEY};
use dashkit::config::ApiConfig;
use dashkit::{ApiClient, ApiError, NoticeLevel, Notifier};

fn api_config(server: &MockServer) -> ApiConfig {
  ApiConfig {
    base_url: server.base_url(),
    timeout_secs: 5,
  }
}

fn seeded_store(access: &str, refresh: &str) -> Arc<dashkit::MemoryCredentialStore> {
  let store = dashkit::MemoryCredentialStore::new();
  store
    .put(ACCESS_KEY, Credential::new(access, access_ttl()))
    .unwrap();
  store
    .put(REFRESH_KEY, Credential::new(refresh, refresh_ttl()))
    .unwrap();
  Arc::new(store)
}

#[tokio::test]
async fn retries_transparently_after_refresh() {
  let server = MockServer::start();

  let rejected = server.mock(|when, then| {
    when
      .method(GET)
      .path("/tasks")
      .header("authorization", "Bearer stale-token");
    then.status(401);
  });
  let refresh = server.mock(|when, then| {
    when
      .method(POST)
      .path("/api/token/refresh/")
      .json_body(json!({ "refresh": "refresh-1" }));
    then
      .status(200)
      .json_body(json!({ "access": "fresh-token", "refresh": "refresh-2" }));
  });
  let accepted = server.mock(|when, then| {
    when
      .method(GET)
      .path("/tasks")
      .header("authorization", "Bearer fresh-token");
    then.status(200).json_body(json!([{ "id": 1 }]));
  });

  let store = seeded_store("stale-token", "refresh-1");
  let client = ApiClient::new(
    &api_config(&server),
    store.clone(),
    Notifier::disconnected(),
  )
  .unwrap();

  // The caller never sees the 401.
  let value: Value = client.get("/tasks").await.unwrap();
  assert_eq!(value, json!([{ "id": 1 }]));

  rejected.assert_hits(1);
  refresh.assert_hits(1);
  accepted.assert_hits(1);

  // The rotated pair replaced the stale one.
  assert_eq!(store.get(ACCESS_KEY), Some("fresh-token".to_string()));
  assert_eq!(store.get(REFRESH_KEY), Some("refresh-2".to_string()));
}

#[tokio::test]
async fn failed_refresh_clears_credentials_and_surfaces_error() {
  let server = MockServer::start();

  server.mock(|when, then| {
    when.method(GET).path("/tasks");
    then.status(401);
  });
  let refresh = server.mock(|when, then| {
    when.method(POST).path("/api/token/refresh/");
    then
      .status(401)
      .json_body(json!({ "detail": "Token is invalid or expired" }));
  });

  let store = seeded_store("stale-token", "dead-refresh");
  let (notifier, mut notices) = Notifier::channel();
  let client = ApiClient::new(&api_config(&server), store.clone(), notifier).unwrap();

  let result: Result<Value, _> = client.get("/tasks").await;
  assert!(matches!(result, Err(ApiError::SessionExpired)));
  refresh.assert_hits(1);

  assert_eq!(store.get(ACCESS_KEY), None);
  assert_eq!(store.get(REFRESH_KEY), None);

  let notice = notices.recv().await.unwrap();
  assert_eq!(notice.level, NoticeLevel::Error);
  assert!(notice.message.contains("Session expired"));
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh_exchange() {
  let server = MockServer::start();

  for path in ["/tasks", "/movies/"] {
    server.mock(|when, then| {
      when
        .method(GET)
        .path(path)
        .header("authorization", "Bearer stale-token");
      then.status(401);
    });
    server.mock(|when, then| {
      when
        .method(GET)
        .path(path)
        .header("authorization", "Bearer fresh-token");
      then.status(200).json_body(json!([]));
    });
  }
  let refresh = server.mock(|when, then| {
    when.method(POST).path("/api/token/refresh/");
    then
      .status(200)
      .json_body(json!({ "access": "fresh-token", "refresh": "refresh-2" }));
  });

  let store = seeded_store("stale-token", "refresh-1");
  let client = ApiClient::new(
    &api_config(&server),
    store.clone(),
    Notifier::disconnected(),
  )
  .unwrap();

  let (a, b) = futures::join!(
    client.get::<Value>("/tasks"),
    client.get::<Value>("/movies/")
  );
  a.unwrap();
  b.unwrap();

  // Both requests recovered, but only one exchange was spent.
  refresh.assert_hits(1);
}

#[tokio::test]
async fn rejected_retry_still_notifies() {
  let server = MockServer::start();

  server.mock(|when, then| {
    when
      .method(GET)
      .path("/tasks")
      .header("authorization", "Bearer stale-token");
    then.status(401);
  });
  server.mock(|when, then| {
    when.method(POST).path("/api/token/refresh/");
    then
      .status(200)
      .json_body(json!({ "access": "fresh-token", "refresh": "refresh-2" }));
  });
  // Even the fresh token is refused: the account itself is locked out.
  server.mock(|when, then| {
    when
      .method(GET)
      .path("/tasks")
      .header("authorization", "Bearer fresh-token");
    then
      .status(401)
      .json_body(json!({ "detail": "account disabled" }));
  });

  let store = seeded_store("stale-token", "refresh-1");
  let (notifier, mut notices) = Notifier::channel();
  let client = ApiClient::new(&api_config(&server), store, notifier).unwrap();

  let result: Result<Value, _> = client.get("/tasks").await;
  assert!(matches!(result, Err(ApiError::Unauthorized)));

  let notice = notices.recv().await.unwrap();
  assert_eq!(notice.level, NoticeLevel::Error);
  assert_eq!(notice.message, "account disabled");
}

#[tokio::test]
async fn non_auth_error_surfaces_payload_detail() {
  let server = MockServer::start();

  server.mock(|when, then| {
    when.method(GET).path("/tasks");
    then
      .status(500)
      .json_body(json!({ "detail": "database unavailable" }));
  });

  let store = Arc::new(dashkit::MemoryCredentialStore::new());
  let (notifier, mut notices) = Notifier::channel();
  let client = ApiClient::new(&api_config(&server), store, notifier).unwrap();

  let result: Result<Value, _> = client.get("/tasks").await;
  match result {
    Err(ApiError::Api { status, message }) => {
      assert_eq!(status, 500);
      assert_eq!(message, "database unavailable");
    }
    other => panic!("expected Api error, got {:?}", other.err()),
  }

  let notice = notices.recv().await.unwrap();
  assert_eq!(notice.level, NoticeLevel::Error);
  assert_eq!(notice.message, "database unavailable");
}

#[tokio::test]
async fn missing_credentials_send_unauthenticated_request() {
  let server = MockServer::start();

  let tasks = server.mock(|when, then| {
    when.method(GET).path("/tasks");
    then.status(200).json_body(json!([]));
  });
  let refresh = server.mock(|when, then| {
    when.method(POST).path("/api/token/refresh/");
    then.status(200);
  });

  let store = Arc::new(dashkit::MemoryCredentialStore::new());
  let client = ApiClient::new(&api_config(&server), store, Notifier::disconnected()).unwrap();

  let value: Value = client.get("/tasks").await.unwrap();
  assert_eq!(value, json!([]));

  tasks.assert_hits(1);
  refresh.assert_hits(0);
}
