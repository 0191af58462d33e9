//! Who is signed in.
//!
//! A `Session` is created once per client and handed to every gateway that
//! needs a bearer token. Sign-out is broadcast on a watch channel so the UI
//! can react to an expiry detected deep inside a request.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::models::user::{AuthGrant, StoredCredential, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    SignedOut,
    Active,
    /// The server rejected the credential. Callers should send the user to sign in again.
    Expired,
}

#[derive(Clone)]
pub struct Session {
    credential: Arc<RwLock<Option<StoredCredential>>>,
    status: Arc<watch::Sender<SessionStatus>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        let (status, _) = watch::channel(SessionStatus::SignedOut);
        Self {
            credential: Arc::new(RwLock::new(None)),
            status: Arc::new(status),
        }
    }

    /// Restores a credential kept from an earlier run. Blank tokens are ignored.
    pub fn restore(stored: Option<StoredCredential>) -> Self {
        let session = Self::new();
        if let Some(credential) = stored.filter(|c| !c.token.trim().is_empty()) {
            *session.credential.write() = Some(credential);
            session.status.send_replace(SessionStatus::Active);
        }
        session
    }

    pub fn sign_in(&self, grant: AuthGrant) {
        info!(user = %grant.user.id, "signed in");
        *self.credential.write() = Some(StoredCredential {
            token: grant.token,
            user: Some(grant.user),
        });
        self.status.send_replace(SessionStatus::Active);
    }

    /// Replaces the cached profile after a successful profile fetch.
    pub fn set_user(&self, user: UserProfile) {
        if let Some(credential) = self.credential.write().as_mut() {
            credential.user = Some(user);
        }
    }

    pub fn token(&self) -> Option<String> {
        self.credential.read().as_ref().map(|c| c.token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.credential.read().as_ref().and_then(|c| c.user.clone())
    }

    /// The credential to persist for the next run, if any.
    pub fn credential(&self) -> Option<StoredCredential> {
        self.credential.read().clone()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// User-initiated sign-out.
    pub fn clear(&self) {
        *self.credential.write() = None;
        self.status.send_replace(SessionStatus::SignedOut);
    }

    /// Drops the credential after the server rejected it.
    pub fn expire(&self) {
        let had_credential = self.credential.write().take().is_some();
        if had_credential {
            warn!("session expired, credential cleared");
        }
        self.status.send_replace(SessionStatus::Expired);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn grant() -> AuthGrant {
        AuthGrant {
            token: "tok".into(),
            user: UserProfile {
                id: Uuid::new_v4(),
                name: "Jane".into(),
                email: "jane@example.com".into(),
            },
        }
    }

    #[test]
    fn test_new_session_is_signed_out() {
        let session = Session::new();
        assert_eq!(session.status(), SessionStatus::SignedOut);
        assert!(session.token().is_none());
    }

    #[test]
    fn test_restore_ignores_blank_token() {
        let session = Session::restore(Some(StoredCredential {
            token: "  ".into(),
            user: None,
        }));
        assert_eq!(session.status(), SessionStatus::SignedOut);

        let session = Session::restore(Some(StoredCredential {
            token: "abc".into(),
            user: None,
        }));
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.token().as_deref(), Some("abc"));
    }

    #[test]
    fn test_sign_in_then_clear() {
        let session = Session::new();
        session.sign_in(grant());
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.user().map(|u| u.name), Some("Jane".to_string()));

        session.clear();
        assert_eq!(session.status(), SessionStatus::SignedOut);
        assert!(session.credential().is_none());
    }

    #[tokio::test]
    async fn test_expire_is_broadcast_to_clones() {
        let session = Session::new();
        session.sign_in(grant());
        let mut rx = session.subscribe();

        let handle = session.clone();
        handle.expire();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionStatus::Expired);
        assert!(session.token().is_none());
    }
}
