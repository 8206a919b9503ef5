//! Error types for the token lifecycle

use std::io;

use thiserror::Error;

/// Failure inside a [`SecretStore`](super::SecretStore).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("token file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    /// True when the backing file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("token expired")]
    TokenExpired,

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("failed to {action}: {source}")]
    Storage {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("failed to parse callback URL: {0}")]
    CallbackUrl(#[from] url::ParseError),

    #[error("no token found in callback URL")]
    MissingCallbackToken,

    #[error("invalid authorization URL: {0}")]
    InvalidAuthUrl(#[source] url::ParseError),

    #[error("failed to open browser: {0}")]
    Browser(#[source] io::Error),

    #[error("failed to check authentication status: {0}")]
    StatusCheck(#[source] Box<AuthError>),
}

impl AuthError {
    pub(crate) fn storage(action: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| AuthError::Storage { action, source }
    }

    /// The innermost error once status-check wrappers are peeled off.
    pub fn root(&self) -> &AuthError {
        match self {
            AuthError::StatusCheck(inner) => inner.root(),
            other => other,
        }
    }

    /// Callback URL could not be used (unparseable or missing the token).
    pub fn is_callback_invalid(&self) -> bool {
        matches!(
            self.root(),
            AuthError::CallbackUrl(_) | AuthError::MissingCallbackToken
        )
    }

    /// Store reported that the token file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), AuthError::Storage { source, .. } if source.is_not_found())
    }
}
