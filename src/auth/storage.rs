//! Token persistence
//!
//! A single-slot store: at most one token, kept as `{"token": "..."}`.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use super::StoreError;
use crate::platform::StoragePolicy;

/// Durable storage for the one auth token.
///
/// `load` treats a missing token as `None`, while `delete` reports a missing
/// token as an error. Callers rely on both behaviours.
pub trait SecretStore: Send + Sync {
    /// Replace whatever is stored with `token`.
    fn save(&self, token: &str) -> Result<(), StoreError>;

    /// Stored token, or `None` if nothing has been saved.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Remove the stored token. Fails with a `NotFound` I/O error if there is none.
    fn delete(&self) -> Result<(), StoreError>;
}

#[derive(Serialize, Deserialize)]
struct TokenFile {
    token: String,
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// [`SecretStore`] backed by a JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    policy: StoragePolicy,
}

impl FileStore {
    /// Store at `dir/file_name`. Creates `dir` with the policy's directory mode.
    pub fn open(dir: &Path, file_name: &str, policy: StoragePolicy) -> Result<Self, StoreError> {
        create_dir(dir, policy.dir_mode)?;
        let path = dir.join(file_name);
        tracing::debug!("Token store at {}", path.display());
        Ok(Self { path, policy })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let n = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.{}.tmp", std::process::id(), n));
        self.path.with_file_name(name)
    }
}

impl SecretStore for FileStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        let content = serde_json::to_vec(&TokenFile {
            token: token.to_string(),
        })?;

        // Write a sibling file and rename it over the real one so readers
        // never observe a half-written token.
        let tmp = self.tmp_path();
        let written = write_new(&tmp, &content, self.policy.file_mode)
            .and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        tracing::debug!(
            "Saved token ({} chars) to {}",
            token.len(),
            self.path.display()
        );
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, StoreError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No token file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let file: TokenFile = serde_json::from_slice(&content)?;
        Ok(Some(file.token))
    }

    fn delete(&self) -> Result<(), StoreError> {
        fs::remove_file(&self.path)?;
        tracing::debug!("Removed token file {}", self.path.display());
        Ok(())
    }
}

fn write_new(path: &Path, content: &[u8], mode: u32) -> io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.sync_all()
}

fn create_dir(dir: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(dir)
}
