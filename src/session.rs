//! Auth session - who is signed in.
//!
//! Sign-in itself belongs to the remote service; this crate only needs to know
//! the current user and to hear about changes. [`SessionHandle`] broadcasts
//! the current [`Session`] to any number of watchers over a tokio `watch`
//! channel.

use tokio::sync::watch;
use tracing::info;

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Ownership key stored in every row's `user_id` column
    pub user_id: String,
    pub email: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Publishes session changes.
#[derive(Debug)]
pub struct SessionHandle {
    sender: watch::Sender<Option<Session>>,
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new(None)
    }
}

impl SessionHandle {
    #[must_use]
    pub fn new(initial: Option<Session>) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// The session as of now.
    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.sender.borrow().clone()
    }

    /// A receiver that sees every later change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.sender.subscribe()
    }

    pub fn sign_in(&self, session: Session) {
        info!("Signed in as {}", session.user_id);
        self.sender.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        info!("Signed out");
        self.sender.send_replace(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_watchers_see_sign_in_and_out() {
        let handle = SessionHandle::default();
        let mut rx = handle.subscribe();
        assert!(rx.borrow().is_none());

        handle.sign_in(Session::new("user-1").with_email("a@example.com"));
        assert!(rx.changed().await.is_ok());
        assert_eq!(
            rx.borrow_and_update().as_ref().map(|s| s.user_id.clone()),
            Some("user-1".to_string())
        );

        handle.sign_out();
        assert!(rx.changed().await.is_ok());
        assert!(rx.borrow_and_update().is_none());
        assert!(handle.current().is_none());
    }
}
