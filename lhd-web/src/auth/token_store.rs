//! Token persistence
//!
//! The cache holds a single user's token. [`FileTokenStore`] writes JSON to a
//! file (temp file then rename, mode 0600 on unix); [`MemoryTokenStore`] keeps
//! it in process for tests and ephemeral runs.

use super::token::TokenInfo;
use super::AuthError;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage for the cached token
pub trait TokenStore: Send + Sync {
    /// Cached token, `None` if nothing is stored
    fn load_token(&self) -> Result<Option<TokenInfo>, AuthError>;

    fn store_token(&self, token: &TokenInfo) -> Result<(), AuthError>;

    fn clear_token(&self) -> Result<(), AuthError>;
}

/// JSON file token cache
pub struct FileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_error(e: impl std::fmt::Display) -> AuthError {
    AuthError::Storage(e.to_string())
}

impl TokenStore for FileTokenStore {
    fn load_token(&self) -> Result<Option<TokenInfo>, AuthError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_error(e)),
        };

        match serde_json::from_str(&content) {
            Ok(token) => Ok(Some(token)),
            Err(e) => {
                // A corrupt cache just means logging in again
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable token cache");
                Ok(None)
            }
        }
    }

    fn store_token(&self, token: &TokenInfo) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock().map_err(storage_error)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(storage_error)?;
            }
        }

        let content = serde_json::to_string_pretty(token).map_err(storage_error)?;
        let temp_path = self.path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).map_err(storage_error)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .map_err(storage_error)?;
        }

        std::fs::rename(&temp_path, &self.path).map_err(storage_error)?;
        tracing::debug!(path = %self.path.display(), "Token cache written");
        Ok(())
    }

    fn clear_token(&self) -> Result<(), AuthError> {
        let _guard = self.write_lock.lock().map_err(storage_error)?;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error(e)),
        }
    }
}

/// In-process token cache
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<TokenInfo>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: TokenInfo) -> Self {
        Self {
            token: Mutex::new(Some(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load_token(&self) -> Result<Option<TokenInfo>, AuthError> {
        Ok(self.token.lock().map_err(storage_error)?.clone())
    }

    fn store_token(&self, token: &TokenInfo) -> Result<(), AuthError> {
        *self.token.lock().map_err(storage_error)? = Some(token.clone());
        Ok(())
    }

    fn clear_token(&self) -> Result<(), AuthError> {
        *self.token.lock().map_err(storage_error)? = None;
        Ok(())
    }
}
