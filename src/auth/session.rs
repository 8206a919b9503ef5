//! Session state machine: status checks, login start, callback, logout

use url::{form_urlencoded, Url};

use super::tokens;
use super::{AuthConfig, AuthError, AuthService, SecretStore, SessionState};
use crate::platform::BrowserLauncher;

/// Token lifecycle manager over a secret store and a browser.
pub struct Service<S, B> {
    api_server_url: String,
    auth_config: AuthConfig,
    store: S,
    browser: B,
}

impl<S: SecretStore, B: BrowserLauncher> Service<S, B> {
    pub fn new(api_server_url: impl Into<String>, store: S, browser: B) -> Self {
        Self {
            api_server_url: api_server_url.into(),
            auth_config: AuthConfig::default(),
            store,
            browser,
        }
    }

    /// Work out the session state from the stored token.
    ///
    /// An expired token is deleted before this returns. A token that cannot
    /// be decoded is an error, never `Unauthenticated`.
    pub fn session_state(&self) -> Result<SessionState, AuthError> {
        let token = match self
            .store
            .load()
            .map_err(AuthError::storage("load token"))?
        {
            Some(token) if !token.is_empty() => token,
            _ => return Ok(SessionState::Unauthenticated),
        };

        let payload = tokens::decode(&token)?;
        if payload.is_expired() {
            tracing::info!("Stored token expired at {}, removing it", payload.exp);
            self.store
                .delete()
                .map_err(AuthError::storage("delete expired token"))?;
            return Ok(SessionState::Expired);
        }

        Ok(SessionState::Authenticated {
            expires_at: payload.expires_at(),
        })
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    fn open_login_page(&self) -> Result<(), AuthError> {
        let url = self.auth_url()?;
        tracing::info!("Opening login page: {}", url);
        self.browser.open(&url).map_err(AuthError::Browser)
    }
}

impl<S: SecretStore, B: BrowserLauncher> AuthService for Service<S, B> {
    fn auth_url(&self) -> Result<String, AuthError> {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_type", self.auth_config.client_type)
            .finish();
        let url = format!(
            "{}{}?{}",
            self.api_server_url.trim_end_matches('/'),
            self.auth_config.auth_path,
            query
        );
        Url::parse(&url).map_err(AuthError::InvalidAuthUrl)?;
        Ok(url)
    }

    // The token is stored as-is. Whether it decodes or has expired is
    // decided by the next status check.
    fn handle_callback(&self, callback_url: &str) -> Result<(), AuthError> {
        let parsed = Url::parse(callback_url)?;
        let token = parsed
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingCallbackToken)?;

        self.store
            .save(&token)
            .map_err(AuthError::storage("save token"))?;
        tracing::info!("Stored token from callback ({} chars)", token.len());
        Ok(())
    }

    fn is_authenticated(&self) -> Result<bool, AuthError> {
        match self.session_state()? {
            SessionState::Authenticated { .. } => Ok(true),
            SessionState::Unauthenticated => Ok(false),
            SessionState::Expired => Err(AuthError::TokenExpired),
        }
    }

    fn logout(&self) -> Result<(), AuthError> {
        self.store
            .delete()
            .map_err(AuthError::storage("delete token"))?;
        tracing::info!("Logged out");
        Ok(())
    }

    fn start_login(&self) -> Result<(), AuthError> {
        if self
            .is_authenticated()
            .map_err(|e| AuthError::StatusCheck(Box::new(e)))?
        {
            tracing::debug!("Already authenticated, not starting login");
            return Ok(());
        }
        self.open_login_page()
    }

    fn check_and_start_login(&self) -> Result<(), AuthError> {
        match self.is_authenticated() {
            Ok(true) => {
                tracing::info!("Already authenticated");
                Ok(())
            }
            Ok(false) => {
                tracing::info!("Not logged in, starting login");
                self.start_login()
            }
            Err(AuthError::TokenExpired) => {
                tracing::info!("Login expired, starting login");
                self.start_login()
            }
            Err(e) => Err(AuthError::StatusCheck(Box::new(e))),
        }
    }

    fn auth_token(&self) -> Result<String, AuthError> {
        self.store
            .load()
            .map_err(AuthError::storage("load token"))?
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::NotAuthenticated)
    }
}
