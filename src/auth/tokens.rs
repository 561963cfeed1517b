//! Credential pair types and client-side JWT claims access.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Validity window applied to a freshly issued access credential.
pub fn access_ttl() -> Duration {
  Duration::minutes(5)
}

/// Validity window applied to a freshly issued refresh credential.
pub fn refresh_ttl() -> Duration {
  Duration::hours(24)
}

/// A single stored credential with an absolute expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
  pub value: String,
  pub expires_at: DateTime<Utc>,
}

impl Credential {
  pub fn new(value: impl Into<String>, ttl: Duration) -> Self {
    Self {
      value: value.into(),
      expires_at: Utc::now() + ttl,
    }
  }

  pub fn is_expired(&self) -> bool {
    Utc::now() >= self.expires_at
  }
}

/// Access + refresh pair as returned by the token endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPair {
  pub access: String,
  pub refresh: String,
}

/// Claims the dashboard reads out of the access token for display purposes.
#[derive(Debug, Clone, Deserialize)]
pub struct UserClaims {
  pub user_id: i64,
  pub username: String,
  pub email: String,
  #[serde(default)]
  pub is_staff: bool,
}

/// Decode user claims from an access token without verifying the signature.
///
/// The server remains the authority on token validity; this only reads the
/// payload so the UI can show who is signed in. Expiry is not checked here
/// either - the credential store already drops expired tokens.
pub fn decode_claims(access: &str) -> Result<UserClaims, ApiError> {
  let mut validation = Validation::new(Algorithm::HS256);
  validation.insecure_disable_signature_validation();
  validation.validate_exp = false;
  validation.set_required_spec_claims::<&str>(&[]);

  let data = decode::<UserClaims>(access, &DecodingKey::from_secret(&[]), &validation)
    .map_err(|e| {
      tracing::warn!(error = %e, "failed to decode access token claims");
      ApiError::Unauthorized
    })?;

  Ok(data.claims)
}
