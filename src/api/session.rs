//! Session operations: login, registration, logout, current user.

use std::sync::Arc;

use serde_json::json;

use crate::auth::{decode_claims, CredentialStore, TokenPair, UserClaims, ACCESS_KEY};
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::notify::Notifier;

pub struct SessionClient {
  api: Arc<ApiClient>,
  store: Arc<dyn CredentialStore>,
  notifier: Notifier,
}

impl SessionClient {
  pub fn new(api: Arc<ApiClient>, store: Arc<dyn CredentialStore>, notifier: Notifier) -> Self {
    Self {
      api,
      store,
      notifier,
    }
  }

  /// Exchange username and password for a credential pair and persist it.
  pub async fn login(&self, username: &str, password: &str) -> Result<UserClaims, ApiError> {
    let pair: TokenPair = self
      .api
      .post(
        "/api/auth/token/",
        json!({ "username": username, "password": password }),
      )
      .await?;

    self.api.store_pair(&pair)?;
    self.notifier.success("Logged in successfully");
    decode_claims(&pair.access)
  }

  /// Create a new account. Does not sign in.
  pub async fn register(
    &self,
    username: &str,
    email: &str,
    password: &str,
  ) -> Result<(), ApiError> {
    self
      .api
      .post_unit(
        "/api/auth/register/",
        json!({ "username": username, "email": email, "password": password }),
      )
      .await?;

    self.notifier.success("Account created, you can sign in now");
    Ok(())
  }

  /// Drop both credentials. Purely local.
  pub fn logout(&self) -> Result<(), ApiError> {
    self.store.clear()?;
    self.notifier.success("Logged out");
    Ok(())
  }

  /// Claims of the signed-in user, if a live access credential is stored.
  pub fn current_user(&self) -> Option<UserClaims> {
    let access = self.store.get(ACCESS_KEY)?;
    decode_claims(&access).ok()
  }
}
