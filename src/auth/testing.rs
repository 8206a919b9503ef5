//! In-memory doubles for the store and the browser.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::tokens::encode_for_test;
use super::{SecretStore, StoreError};
use crate::platform::BrowserLauncher;

pub fn token_expiring_at(exp: i64) -> String {
    encode_for_test(&format!(r#"{{"exp":{}}}"#, exp))
}

pub fn fresh_token() -> String {
    token_expiring_at(chrono::Utc::now().timestamp() + 3600)
}

pub fn expired_token() -> String {
    token_expiring_at(chrono::Utc::now().timestamp() - 3600)
}

fn injected() -> StoreError {
    StoreError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "injected"))
}

/// Single-slot store with the same load/delete asymmetry as `FileStore`.
#[derive(Default)]
pub struct MemoryStore {
    token: Mutex<Option<String>>,
    writes: AtomicUsize,
    deletes: AtomicUsize,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
    fail_deletes: AtomicBool,
}

impl MemoryStore {
    pub fn with_token(token: &str) -> Self {
        let store = Self::default();
        *store.token.lock().unwrap() = Some(token.to_string());
        store
    }

    pub fn current(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn fail_loads(&self) {
        self.fail_loads.store(true, Ordering::SeqCst);
    }

    pub fn fail_saves(&self) {
        self.fail_saves.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }
}

impl SecretStore for MemoryStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(injected());
        }
        *self.token.lock().unwrap() = Some(token.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, StoreError> {
        if self.fail_loads.load(Ordering::SeqCst) {
            return Err(injected());
        }
        Ok(self.current())
    }

    fn delete(&self) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(injected());
        }
        match self.token.lock().unwrap().take() {
            Some(_) => {
                self.deletes.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            None => Err(StoreError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                "no token stored",
            ))),
        }
    }
}

/// Records every URL it is asked to open.
#[derive(Default)]
pub struct RecordingBrowser {
    opened: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl RecordingBrowser {
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn fail(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

impl BrowserLauncher for RecordingBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::NotFound, "no browser"));
        }
        self.opened.lock().unwrap().push(url.to_string());
        Ok(())
    }
}
