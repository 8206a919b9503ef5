//! Authentication for the Bifrost client
//!
//! Login happens in the browser. The authorization server redirects back to
//! `bifrost://auth/callback?token=...`, the OS hands that URL to us, and the
//! token is stored on disk. Freshness is checked lazily from the token's
//! `exp` claim whenever someone asks.

pub mod callback;
pub mod error;
pub mod session;
pub mod storage;
pub mod tokens;

#[cfg(test)]
pub(crate) mod testing;

use chrono::{DateTime, Utc};

pub use callback::{CallbackEvent, CallbackRouter};
pub use error::{AuthError, StoreError};
pub use session::Service;
pub use storage::{FileStore, SecretStore};

/// Fixed parameters of the Bifrost auth flow
pub struct AuthConfig {
    /// Value of the `client_type` query parameter
    pub client_type: &'static str,
    /// Path of the authorization endpoint on the API server
    pub auth_path: &'static str,
    /// Prefix every accepted callback URL starts with
    pub callback_prefix: &'static str,
    /// Token file name inside the config directory
    pub token_file: &'static str,
}

impl AuthConfig {
    pub const fn bifrost() -> Self {
        Self {
            client_type: "bifrost-client",
            auth_path: "/v1/user/auth/github",
            callback_prefix: "bifrost://auth/callback",
            token_file: "auth.json",
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::bifrost()
    }
}

/// Where the user stands, as derived from the stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token stored.
    Unauthenticated,
    /// Token present and not yet expired.
    Authenticated { expires_at: Option<DateTime<Utc>> },
    /// Token had expired; it has been removed from the store.
    Expired,
}

/// Operations the host application drives.
pub trait AuthService: Send + Sync {
    /// URL the user must visit to log in.
    fn auth_url(&self) -> Result<String, AuthError>;

    /// Store the token carried by a callback URL.
    fn handle_callback(&self, callback_url: &str) -> Result<(), AuthError>;

    /// `Ok(false)` when nobody is logged in, `Err(TokenExpired)` when the
    /// login lapsed (the stale token is removed).
    fn is_authenticated(&self) -> Result<bool, AuthError>;

    fn logout(&self) -> Result<(), AuthError>;

    /// Open the login page unless already authenticated.
    fn start_login(&self) -> Result<(), AuthError>;

    /// Startup hook: ensure the user is logged in, starting login if not.
    fn check_and_start_login(&self) -> Result<(), AuthError>;

    /// Raw stored token for authenticated requests. Expiry is not checked.
    fn auth_token(&self) -> Result<String, AuthError>;
}
