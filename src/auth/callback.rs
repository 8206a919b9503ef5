//! Callback routing
//!
//! The OS hands us URLs in two ways: a running instance gets activated with
//! the custom-scheme URL, or a second process is launched with the URL as an
//! argument. Either way there is nobody to return a result to, so events are
//! queued to a background task and failures end up in the log.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{AuthConfig, AuthService};

/// Every callback we act on starts with this.
pub const CALLBACK_PREFIX: &str = AuthConfig::bifrost().callback_prefix;

/// A URL delivered by the OS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackEvent {
    /// Running instance activated through the custom URL scheme.
    UrlOpen(String),
    /// Another instance was launched; these are its arguments.
    SecondInstance(Vec<String>),
}

impl CallbackEvent {
    /// Candidate callback URL. For a relaunch only the first argument counts.
    pub fn into_url(self) -> Option<String> {
        match self {
            CallbackEvent::UrlOpen(url) => Some(url),
            CallbackEvent::SecondInstance(args) => args.into_iter().next(),
        }
    }
}

/// Forward `url` to the service if it is a Bifrost auth callback.
///
/// Other URLs are ignored. Errors are logged and dropped.
pub fn route(service: &dyn AuthService, url: &str) {
    if !url.starts_with(CALLBACK_PREFIX) {
        tracing::debug!("Ignoring non-callback URL");
        return;
    }

    match service.handle_callback(url) {
        Ok(()) => tracing::info!("Auth callback handled"),
        Err(e) if e.is_callback_invalid() => {
            tracing::warn!("Rejected auth callback: {}", e)
        }
        Err(e) => tracing::warn!("Failed to handle callback: {}", e),
    }
}

/// Handle to the background task that routes callback events.
pub struct CallbackRouter {
    tx: mpsc::UnboundedSender<CallbackEvent>,
    task: JoinHandle<()>,
}

impl CallbackRouter {
    /// Spawn the routing task. Must be called inside a tokio runtime.
    pub fn start(service: Arc<dyn AuthService>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(router_loop(rx, service));
        Self { tx, task }
    }

    /// Queue an event (non-blocking).
    pub fn dispatch(&self, event: CallbackEvent) {
        if self.tx.send(event).is_err() {
            tracing::error!("Callback router stopped -- event dropped");
        }
    }

    /// Stop accepting events. The returned handle resolves once every
    /// queued event has been routed.
    pub fn close(self) -> JoinHandle<()> {
        drop(self.tx);
        self.task
    }
}

async fn router_loop(
    mut rx: mpsc::UnboundedReceiver<CallbackEvent>,
    service: Arc<dyn AuthService>,
) {
    while let Some(event) = rx.recv().await {
        match event.into_url() {
            Some(url) => route(&*service, &url),
            None => tracing::debug!("Second instance launched without arguments"),
        }
    }
    tracing::debug!("Callback router finished");
}
