//! Host platform collaborators: storage permissions and the default browser.

use std::io;

/// Directory and file permission bits used for the token store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoragePolicy {
    pub dir_mode: u32,
    pub file_mode: u32,
}

impl StoragePolicy {
    /// Owner-only access.
    pub const OWNER_ONLY: Self = Self {
        dir_mode: 0o700,
        file_mode: 0o600,
    };

    /// Read/write for everyone. Windows has no equivalent of the unix modes,
    /// so this is what the store gets there.
    pub const SHARED: Self = Self {
        dir_mode: 0o666,
        file_mode: 0o666,
    };

    /// Policy for the running OS.
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::SHARED
        } else {
            Self::OWNER_ONLY
        }
    }
}

impl Default for StoragePolicy {
    fn default() -> Self {
        Self::current()
    }
}

/// Something that can show a URL to the user.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// Opens URLs in the user's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        tracing::debug!("Opening {} in default browser", url);
        open::that(url)
    }
}
