//! Conversation orchestration.
//!
//! Owns the state of one chat: the ordered history, the backend session and
//! the single in-flight request. Every turn adds exactly two messages (the
//! user utterance, then the backend answer or a local fallback), and a reset
//! releases the backend session, then wipes history and session together.
//!
//! State is published through a `tokio::sync::watch` channel so a
//! presentation layer can observe each transition as it happens.

pub mod session;

pub use session::{SessionId, SessionSlot};

use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::{debug, warn};

use crate::client::{ChatRequest, Message, PharmaApi};

/// Assistant text shown when the backend could not answer.
pub const FALLBACK_MESSAGE: &str = "Désolé, une erreur s'est produite. Veuillez réessayer.";

/// Process-local state of one conversation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversationState {
    history: Vec<Message>,
    session: SessionSlot,
    pending: bool,
}

impl ConversationState {
    /// Messages in temporal order.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Backend session, if one was issued.
    #[must_use]
    pub const fn session_id(&self) -> Option<&SessionId> {
        self.session.current()
    }

    /// Whether a request is in flight.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }

    /// Whether the conversation holds no message.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// Why a `send` call did nothing.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SkipReason {
    /// The utterance was blank.
    EmptyMessage,
    /// Another turn is still in flight.
    Busy,
}

/// What a `send` call did to the conversation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SendOutcome {
    /// The backend answered; its reply was appended.
    Answered,
    /// The backend failed; the fallback reply was appended.
    Fallback,
    /// Nothing was appended.
    Skipped(SkipReason),
}

/// What a `clear` call did with the backend session.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ClearOutcome {
    /// No session was held; only local state was reset.
    NoSession,
    /// The backend released the session.
    Released,
    /// The backend could not be told; local state was reset anyway.
    ReleaseFailed,
}

/// Drives one conversation against the backend.
pub struct ChatOrchestrator {
    api: Arc<dyn PharmaApi>,
    state: watch::Sender<ConversationState>,
    in_flight: Mutex<()>,
}

impl ChatOrchestrator {
    /// Start an empty conversation.
    #[must_use]
    pub fn new(api: Arc<dyn PharmaApi>) -> Self {
        Self {
            api,
            state: watch::Sender::new(ConversationState::default()),
            in_flight: Mutex::new(()),
        }
    }

    /// Copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    /// Send one utterance and append the reply.
    ///
    /// Blank utterances and calls made while a turn is in flight are no-ops.
    /// Backend failures never escape: they become the fallback reply.
    pub async fn send(&self, utterance: &str) -> SendOutcome {
        if utterance.trim().is_empty() {
            return SendOutcome::Skipped(SkipReason::EmptyMessage);
        }

        let Ok(_guard) = self.in_flight.try_lock() else {
            debug!("Ignoring message while a reply is pending");
            return SendOutcome::Skipped(SkipReason::Busy);
        };

        // Context is the conversation before this turn; the utterance travels separately.
        let request = {
            let state = self.state.borrow();
            ChatRequest {
                message: utterance.to_string(),
                conversation_history: state.history.clone(),
                session_id: state.session.current().cloned(),
            }
        };

        self.state
            .send_modify(|state| state.history.push(Message::user(utterance)));
        let turn = PendingTurn::open(&self.state);

        match self.api.chat(request).await {
            Ok(response) => {
                if let Some(tokens) = response.tokens_used {
                    debug!("Chat reply used {tokens} tokens");
                }
                let reply =
                    Message::assistant(response.response, response.timestamp, response.sources);
                turn.settle(reply, Some(response.session_id));
                SendOutcome::Answered
            }
            Err(e) => {
                warn!("Chat request failed: {e}");
                turn.settle(Message::local_assistant(FALLBACK_MESSAGE), None);
                SendOutcome::Fallback
            }
        }
    }

    /// Release the backend session, then reset the conversation.
    ///
    /// Waits for an in-flight turn to finish first. The state is published
    /// as pending while the backend is being told. Local state is reset
    /// whether or not the backend can be reached, and also when this future
    /// is dropped mid-call.
    pub async fn clear(&self) -> ClearOutcome {
        let _guard = self.in_flight.lock().await;
        let reset = PendingReset::open(&self.state);

        let Some(session_id) = reset.session_id() else {
            return ClearOutcome::NoSession;
        };

        match self.api.clear_session(session_id.clone()).await {
            Ok(()) => {
                debug!("Released session {session_id}");
                ClearOutcome::Released
            }
            Err(e) => {
                warn!("Failed to release session {session_id}: {e}");
                ClearOutcome::ReleaseFailed
            }
        }
    }
}

/// An open turn whose reply is not appended yet.
///
/// Dropping it unsettled (the `send` future was cancelled) appends the
/// fallback reply so history never holds a lone user turn.
struct PendingTurn<'a> {
    state: &'a watch::Sender<ConversationState>,
    settled: bool,
}

impl<'a> PendingTurn<'a> {
    fn open(state: &'a watch::Sender<ConversationState>) -> Self {
        state.send_modify(|s| s.pending = true);
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, reply: Message, session_id: Option<SessionId>) {
        self.state.send_modify(|s| {
            s.history.push(reply);
            if let Some(id) = session_id {
                s.session.adopt(id);
            }
            s.pending = false;
        });
        self.settled = true;
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Chat request abandoned before completion");
            self.state.send_modify(|s| {
                s.history.push(Message::local_assistant(FALLBACK_MESSAGE));
                s.pending = false;
            });
        }
    }
}

/// A reset in progress.
///
/// Marks the state pending on open; wipes history and session together and
/// clears `pending` when dropped.
struct PendingReset<'a> {
    state: &'a watch::Sender<ConversationState>,
}

impl<'a> PendingReset<'a> {
    fn open(state: &'a watch::Sender<ConversationState>) -> Self {
        state.send_modify(|s| s.pending = true);
        Self { state }
    }

    fn session_id(&self) -> Option<SessionId> {
        self.state.borrow().session.current().cloned()
    }
}

impl Drop for PendingReset<'_> {
    fn drop(&mut self) {
        self.state.send_modify(|s| {
            s.history.clear();
            s.session.reset();
            s.pending = false;
        });
    }
}
