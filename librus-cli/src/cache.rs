//! Token cache for keeping a session between invocations

use crate::error::CacheError;
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

const TOKEN_FILE: &str = "token";

/// File-based cache for the portable session token
///
/// Directory structure: `{base_dir}/token`
pub struct TokenCache {
    path: PathBuf,
}

impl TokenCache {
    pub fn new(base_dir: &Path) -> Self {
        Self {
            path: base_dir.join(TOKEN_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the cached token or None if nothing usable is cached
    pub fn get(&self) -> Result<Option<Zeroizing<String>>, CacheError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = Zeroizing::new(fs::read_to_string(&self.path)?);
        let token = content.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Zeroizing::new(token.to_string())))
    }

    /// Store the token, readable by the owner only
    pub fn put(&self, token: &str) -> Result<(), CacheError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| {
                CacheError::DirCreation(format!("Failed to create {}: {}", dir.display(), e))
            })?;
        }

        fs::write(&self.path, token)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }

    /// Forget the cached token; returns whether there was one
    pub fn remove(&self) -> Result<bool, CacheError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
