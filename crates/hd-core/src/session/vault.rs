//! Durable storage for the session token.

use super::token::SessionToken;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File-backed store holding at most one session token.
///
/// The vault is the only client state that survives a restart: a single
/// token value under one well-known path. An absent file means signed out.
#[derive(Debug, Clone)]
pub struct TokenVault {
    path: PathBuf,
}

impl TokenVault {
    /// Creates a vault backed by the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default vault location under the user's data directory.
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("dev", "helpdeck", "helpdeck") {
            dirs.data_dir().join("session-token")
        } else {
            PathBuf::from(".helpdeck-session-token")
        }
    }

    /// Returns the backing path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored token, if any.
    pub fn load(&self) -> io::Result<Option<SessionToken>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(SessionToken::from(raw)))
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes the token, replacing any previous value.
    pub fn store(&self, token: &SessionToken) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %self.path.display(), "persisting session token");
        fs::write(&self.path, token.expose())
    }

    /// Removes the stored token. Removing an absent token is not an error.
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_vault() -> (tempfile::TempDir, TokenVault) {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(dir.path().join("session-token"));
        (dir, vault)
    }

    #[test]
    fn absent_file_means_no_token() {
        let (_dir, vault) = temp_vault();
        assert!(vault.load().unwrap().is_none());
    }

    #[test]
    fn store_then_load_round_trips() {
        let (_dir, vault) = temp_vault();
        vault.store(&SessionToken::from("tok-1")).unwrap();
        let loaded = vault.load().unwrap().unwrap();
        assert_eq!(loaded.expose(), "tok-1");
    }

    #[test]
    fn store_replaces_previous_value() {
        let (_dir, vault) = temp_vault();
        vault.store(&SessionToken::from("old")).unwrap();
        vault.store(&SessionToken::from("new")).unwrap();
        assert_eq!(vault.load().unwrap().unwrap().expose(), "new");
    }

    #[test]
    fn clear_is_idempotent() {
        let (_dir, vault) = temp_vault();
        vault.store(&SessionToken::from("tok")).unwrap();
        vault.clear().unwrap();
        vault.clear().unwrap();
        assert!(vault.load().unwrap().is_none());
    }

    #[test]
    fn whitespace_only_file_is_treated_as_absent() {
        let (_dir, vault) = temp_vault();
        fs::write(vault.path(), "  \n").unwrap();
        assert!(vault.load().unwrap().is_none());
    }
}
