//! Errors raised by the remote backend and recorded by the store.
//!
//! - [`RemoteError`] is what a [`RemoteService`] returns for a failed call.
//! - [`StoreError`] is what the store keeps in its state and shows to the
//!   user. It is tagged so callers can branch on the kind instead of the text.
//!
//!  [`RemoteService`]: crate::RemoteService
use thiserror::Error;

/// Failure of a single call to the remote backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("not authenticated")]
    Unauthorized,
    #[error("{message}")]
    Service {
        status: Option<u16>,
        code: Option<String>,
        message: String,
    },
    #[error("network error: {0}")]
    Transport(String),
    #[error("invalid response: {0}")]
    Decode(String),
}

/// Failure of a store operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{message}")]
    Service {
        code: Option<String>,
        message: String,
    },
    #[error("{0}")]
    Unknown(String),
}

impl StoreError {
    pub(crate) const NOT_AUTHENTICATED: &'static str = "User not authenticated";

    /// Returns `true` for [`StoreError::Unauthenticated`].
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, Self::Unauthenticated(_))
    }

    /// Replaces an empty message with the operation's generic one.
    pub(crate) fn or_fallback(self, fallback: &str) -> Self {
        let empty = match &self {
            Self::Unauthenticated(message) | Self::Unknown(message) => message.trim().is_empty(),
            Self::Service { message, .. } => message.trim().is_empty(),
        };
        if empty {
            Self::Unknown(fallback.to_string())
        } else {
            self
        }
    }
}

impl From<RemoteError> for StoreError {
    fn from(value: RemoteError) -> Self {
        match value {
            RemoteError::Unauthorized => Self::Unauthenticated(Self::NOT_AUTHENTICATED.to_string()),
            RemoteError::Service { code, message, .. } => Self::Service { code, message },
            RemoteError::Transport(message) | RemoteError::Decode(message) => Self::Unknown(message),
        }
    }
}
