//! Backend-issued session identifiers.
//!
//! A session id is opaque: the client only ever stores the value the backend
//! returned on the last successful turn, or forgets it on reset. It never
//! builds or guesses one, so there is no public constructor.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Opaque session identifier issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap a raw id as if the backend had returned it.
    #[cfg(test)]
    pub(crate) fn from_server(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the raw id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Session slot of one conversation.
///
/// `None` before the first successful exchange; a `send` issued from that
/// state asks the backend to open a new session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSlot(Option<SessionId>);

impl SessionSlot {
    /// Current id, if any.
    #[must_use]
    pub const fn current(&self) -> Option<&SessionId> {
        self.0.as_ref()
    }

    /// Store the id from a server response, overwriting any previous one.
    pub fn adopt(&mut self, issued: SessionId) {
        if self.0.as_ref().is_some_and(|current| *current != issued) {
            tracing::debug!("Backend rotated session to {issued}");
        }
        self.0 = Some(issued);
    }

    /// Forget the session, returning the id that was held.
    pub fn reset(&mut self) -> Option<SessionId> {
        self.0.take()
    }

    /// Whether a session is currently held.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.0.is_some()
    }
}
