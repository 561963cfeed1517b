//! HTTP client that attaches bearer credentials and silently refreshes an
//! expired session.
//!
//! Every response with status 401 triggers at most one refresh-and-retry for
//! the original request. Concurrent 401s share a single refresh exchange: the
//! gate serializes them, and a waiter that finds the credentials already
//! rotated reuses the new access token instead of spending another exchange.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use url::Url;

use crate::auth::{access_ttl, refresh_ttl, Credential, CredentialStore, TokenPair, ACCESS_KEY, REFRESH_KEY};
use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::notify::Notifier;

/// Path of the refresh exchange endpoint.
const REFRESH_PATH: &str = "/api/token/refresh/";

/// REST client for the dashboard API.
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  store: Arc<dyn CredentialStore>,
  notifier: Notifier,
  /// Gates the refresh exchange so concurrent 401s rotate credentials once.
  refresh_gate: Mutex<()>,
}

impl ApiClient {
  pub fn new(
    config: &ApiConfig,
    store: Arc<dyn CredentialStore>,
    notifier: Notifier,
  ) -> Result<Self, ApiError> {
    let base_url = Url::parse(&config.base_url)?;
    let http = reqwest::Client::builder()
      .timeout(config.timeout())
      .build()?;

    Ok(Self {
      http,
      base_url,
      store,
      notifier,
      refresh_gate: Mutex::new(()),
    })
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self.request(Method::GET, path, None).await
  }

  pub async fn post<T: DeserializeOwned>(&self, path: &str, body: Value) -> Result<T, ApiError> {
    self.request(Method::POST, path, Some(body)).await
  }

  pub async fn put<T: DeserializeOwned>(&self, path: &str, body: Option<Value>) -> Result<T, ApiError> {
    self.request(Method::PUT, path, body).await
  }

  /// POST where the response body is irrelevant or possibly empty.
  pub async fn post_unit(&self, path: &str, body: Value) -> Result<(), ApiError> {
    self.request_unit(Method::POST, path, Some(body)).await
  }

  /// PUT discarding the response body.
  pub async fn put_unit(&self, path: &str, body: Option<Value>) -> Result<(), ApiError> {
    self.request_unit(Method::PUT, path, body).await
  }

  pub async fn delete_unit(&self, path: &str) -> Result<(), ApiError> {
    self.request_unit(Method::DELETE, path, None).await
  }

  /// Issue a request and decode the JSON response body.
  pub async fn request<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<Value>,
  ) -> Result<T, ApiError> {
    let response = self.execute(&method, path, body.as_ref()).await?;
    Ok(response.json::<T>().await?)
  }

  /// Issue a request, discarding any response body.
  pub async fn request_unit(
    &self,
    method: Method,
    path: &str,
    body: Option<Value>,
  ) -> Result<(), ApiError> {
    self.execute(&method, path, body.as_ref()).await?;
    Ok(())
  }

  /// Store a freshly issued credential pair with the standard validity
  /// windows.
  pub fn store_pair(&self, pair: &TokenPair) -> Result<(), ApiError> {
    self.store.put(ACCESS_KEY, Credential::new(&pair.access, access_ttl()))?;
    self.store.put(REFRESH_KEY, Credential::new(&pair.refresh, refresh_ttl()))?;
    Ok(())
  }

  /// Send the request, performing at most one refresh-and-retry on 401, and
  /// turn non-success statuses into errors with a user notice.
  async fn execute(
    &self,
    method: &Method,
    path: &str,
    body: Option<&Value>,
  ) -> Result<reqwest::Response, ApiError> {
    let access = self.store.get(ACCESS_KEY);
    let response = self.send(method, path, body, access.as_deref()).await?;

    if response.status() != StatusCode::UNAUTHORIZED {
      return self.check(response).await;
    }

    // One refresh-and-retry per original request.
    let refreshed = self.refresh_access(access.as_deref()).await?;
    let response = self.send(method, path, body, Some(&refreshed)).await?;
    if response.status() == StatusCode::UNAUTHORIZED {
      // Fresh credentials were rejected too; notify like any other failure.
      let message = error_message(StatusCode::UNAUTHORIZED, response).await;
      self.notifier.error(&message);
      return Err(ApiError::Unauthorized);
    }
    self.check(response).await
  }

  async fn send(
    &self,
    method: &Method,
    path: &str,
    body: Option<&Value>,
    access: Option<&str>,
  ) -> Result<reqwest::Response, ApiError> {
    let url = self.base_url.join(path)?;
    let mut request = self.http.request(method.clone(), url);
    if let Some(token) = access {
      request = request.bearer_auth(token);
    }
    if let Some(json) = body {
      request = request.json(json);
    }
    Ok(request.send().await?)
  }

  /// Turn a non-success status into an error, with the message taken from
  /// the response payload when the server provides one.
  async fn check(&self, response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }

    let message = error_message(status, response).await;
    self.notifier.error(&message);
    Err(ApiError::Api {
      status: status.as_u16(),
      message,
    })
  }

  /// Exchange the refresh credential for a new pair.
  ///
  /// `stale_access` is the access token the failed request was sent with; if
  /// the stored token has already moved past it, a concurrent caller did the
  /// exchange for us.
  async fn refresh_access(&self, stale_access: Option<&str>) -> Result<String, ApiError> {
    let _gate = self.refresh_gate.lock().await;

    if let Some(current) = self.store.get(ACCESS_KEY) {
      if Some(current.as_str()) != stale_access {
        tracing::debug!("credentials already rotated by a concurrent refresh");
        return Ok(current);
      }
    }

    let Some(refresh) = self.store.get(REFRESH_KEY) else {
      self.fail_session()?;
      return Err(ApiError::SessionExpired);
    };

    let url = self.base_url.join(REFRESH_PATH)?;
    let response = self
      .http
      .post(url)
      .json(&serde_json::json!({ "refresh": refresh }))
      .send()
      .await?;

    if !response.status().is_success() {
      tracing::warn!(status = %response.status(), "refresh exchange rejected");
      self.fail_session()?;
      return Err(ApiError::SessionExpired);
    }

    let pair: TokenPair = response.json().await?;
    self.store_pair(&pair)?;
    tracing::debug!("session refreshed");
    Ok(pair.access)
  }

  /// The refresh credential is gone or rejected: clear everything and tell
  /// the UI layer to route to the login entry point.
  fn fail_session(&self) -> Result<(), ApiError> {
    self.store.clear()?;
    self.notifier.error("Session expired, please sign in again");
    Ok(())
  }
}

async fn error_message(status: StatusCode, response: reqwest::Response) -> String {
  let fallback = format!("request failed with status {}", status.as_u16());
  match response.json::<Value>().await {
    Ok(payload) => payload
      .get("detail")
      .or_else(|| payload.get("message"))
      .and_then(Value::as_str)
      .map(String::from)
      .unwrap_or(fallback),
    Err(_) => fallback,
  }
}
