//! Session credentials: token types, JWT claims access, and persistence.

mod store;
mod tokens;

pub use store::{CredentialStore, FileCredentialStore, MemoryCredentialStore, ACCESS_KEY, REFRESH_KEY};
pub use tokens::{access_ttl, decode_claims, refresh_ttl, Credential, TokenPair, UserClaims};
