//! Session boundary with the hosted auth provider.
//!
//! The client never refreshes or stores tokens itself: it asks for the
//! current session once at start-up and then follows change notifications.

use std::future::Future;

use api_types::auth::Session;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};

use crate::RemoteError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// Notification sent whenever the session changes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthChange {
    pub event: AuthEvent,
    pub session: Option<Session>,
}

/// Live subscription to [`AuthChange`] notifications.
///
/// Dropping the subscription unsubscribes; [`unsubscribe`] makes it explicit
/// at teardown.
///
/// [`unsubscribe`]: AuthSubscription::unsubscribe
#[derive(Debug)]
pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthChange>,
}

impl AuthSubscription {
    pub fn new(receiver: broadcast::Receiver<AuthChange>) -> Self {
        Self { receiver }
    }

    /// Waits for the next change. Returns `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.receiver.recv().await {
                Ok(change) => return Some(change),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("auth subscription lagged, skipped {skipped} changes");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Returns the next change that has already arrived, without waiting.
    pub fn try_recv(&mut self) -> Option<AuthChange> {
        loop {
            match self.receiver.try_recv() {
                Ok(change) => return Some(change),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("auth subscription lagged, skipped {skipped} changes");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {
        drop(self);
    }
}

pub trait AuthService: Send + Sync {
    /// The current session, if any.
    fn get_session(&self) -> impl Future<Output = Result<Option<Session>, RemoteError>> + Send;

    fn on_auth_state_change(&self) -> AuthSubscription;
}
