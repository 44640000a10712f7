//! In-memory session state with durable token persistence.
//!
//! The [`SessionStore`] is the single source of truth for "who is using
//! the client". Every state change is published on a watch channel so the
//! authorization gate and navigation model react to login and logout
//! immediately instead of polling.

mod token;
mod vault;

pub use token::SessionToken;
pub use vault::TokenVault;

use crate::auth::Identity;
use std::io;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Current authentication state of the client.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No credential present.
    #[default]
    SignedOut,
    /// A persisted token was found but the identity behind it has not been
    /// resolved against the server yet.
    TokenOnly(SessionToken),
    /// Fully authenticated.
    Authenticated {
        token: SessionToken,
        identity: Identity,
    },
}

impl SessionState {
    /// Returns the session token, if one is held.
    pub fn token(&self) -> Option<&SessionToken> {
        match self {
            SessionState::SignedOut => None,
            SessionState::TokenOnly(token) => Some(token),
            SessionState::Authenticated { token, .. } => Some(token),
        }
    }

    /// Returns the resolved identity, if known.
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionState::Authenticated { identity, .. } => Some(identity),
            _ => None,
        }
    }

    /// Returns true while a token is held, resolved or not.
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }
}

/// Owns the current identity and credential for the whole process.
///
/// Consumers receive a handle (usually `Arc<SessionStore>`) rather than
/// reaching for ambient globals; teardown is [`SessionStore::clear`].
pub struct SessionStore {
    state: watch::Sender<SessionState>,
    vault: TokenVault,
}

impl SessionStore {
    /// Creates a store from whatever the vault currently holds.
    ///
    /// A persisted token starts the session in [`SessionState::TokenOnly`]:
    /// the identity is always re-derived from the server rather than
    /// trusted from a cached copy, so server-side role changes win.
    pub fn restore(vault: TokenVault) -> io::Result<Self> {
        let initial = match vault.load()? {
            Some(token) => {
                debug!("persisted session token found, identity pending resolution");
                SessionState::TokenOnly(token)
            }
            None => SessionState::SignedOut,
        };
        let (state, _) = watch::channel(initial);
        Ok(Self { state, vault })
    }

    /// Stores a fresh token and identity after a successful login.
    pub fn establish(&self, token: SessionToken, identity: Identity) -> io::Result<()> {
        self.vault.store(&token)?;
        info!(user = %identity.email, role = %identity.role, "session established");
        self.state
            .send_replace(SessionState::Authenticated { token, identity });
        Ok(())
    }

    /// Attaches a server-resolved identity to a rehydrated token.
    ///
    /// Has no effect unless the store is in the token-only state.
    pub fn resolve_identity(&self, identity: Identity) {
        self.state.send_if_modified(|state| {
            if let SessionState::TokenOnly(token) = state {
                let token = token.clone();
                debug!(user = %identity.email, "session identity resolved");
                *state = SessionState::Authenticated { token, identity };
                true
            } else {
                false
            }
        });
    }

    /// Clears the session unconditionally. Safe to call while signed out.
    pub fn clear(&self) {
        if let Err(e) = self.vault.clear() {
            warn!(error = %e, "failed to remove persisted session token");
        }
        let changed = self.state.send_if_modified(|state| {
            if matches!(state, SessionState::SignedOut) {
                false
            } else {
                *state = SessionState::SignedOut;
                true
            }
        });
        if changed {
            info!("session cleared");
        }
    }

    /// Synchronous read of the current identity.
    pub fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity().cloned()
    }

    /// Synchronous read of the current token.
    pub fn token(&self) -> Option<SessionToken> {
        self.state.borrow().token().cloned()
    }

    /// Returns true while a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Subscribes to session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn temp_store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().unwrap();
        let vault = TokenVault::new(dir.path().join("session-token"));
        let store = SessionStore::restore(vault).unwrap();
        (dir, store)
    }

    fn admin() -> Identity {
        Identity {
            id: 1,
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn fresh_store_is_signed_out() {
        let (_dir, store) = temp_store();
        assert!(store.current_identity().is_none());
        assert!(store.token().is_none());
        assert!(!store.is_authenticated());
    }

    #[test]
    fn establish_persists_token_and_notifies() {
        let (_dir, store) = temp_store();
        let rx = store.subscribe();

        store
            .establish(SessionToken::from("tok-1"), admin())
            .unwrap();

        assert!(rx.has_changed().unwrap());
        assert_eq!(store.current_identity().unwrap().email, "ada@example.com");
        assert_eq!(store.token().unwrap().expose(), "tok-1");
    }

    #[test]
    fn clear_signs_out_and_is_idempotent() {
        let (_dir, store) = temp_store();
        store
            .establish(SessionToken::from("tok-1"), admin())
            .unwrap();

        store.clear();
        assert!(store.current_identity().is_none());
        assert!(!store.is_authenticated());

        // A second clear must not fail or notify again.
        let rx = store.subscribe();
        store.clear();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn restore_rehydrates_persisted_token_without_identity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session-token");

        let first = SessionStore::restore(TokenVault::new(&path)).unwrap();
        first
            .establish(SessionToken::from("tok-9"), admin())
            .unwrap();
        drop(first);

        let second = SessionStore::restore(TokenVault::new(&path)).unwrap();
        assert!(second.is_authenticated());
        assert!(second.current_identity().is_none());
        assert_eq!(second.token().unwrap().expose(), "tok-9");
    }

    #[test]
    fn resolve_identity_completes_rehydration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session-token");
        let vault = TokenVault::new(&path);
        vault.store(&SessionToken::from("tok-2")).unwrap();

        let store = SessionStore::restore(vault).unwrap();
        store.resolve_identity(admin());
        assert_eq!(store.current_identity().unwrap().role, Role::Admin);
        assert_eq!(store.token().unwrap().expose(), "tok-2");
    }

    #[test]
    fn resolve_identity_is_a_no_op_when_signed_out() {
        let (_dir, store) = temp_store();
        store.resolve_identity(admin());
        assert!(store.current_identity().is_none());
    }
}
