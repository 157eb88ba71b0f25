use crate::api::ApiClient;
use crate::auth::{BearerToken, TokenProvider};
use crate::types::{HistoryResponse, Message, Role};
use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Progress notifications emitted while a turn streams, for callers that
/// render live output.
pub enum SessionUpdate {
    /// One text fragment appended to the in-progress assistant message.
    AssistantDelta(String),
    /// The tail assistant message was sealed; no further mutation this turn.
    TurnFinalized,
}

/// Conversation state for one signed-in user. The message sequence is
/// append-only except for the pending assistant tail during a streaming
/// turn; `send_message`, `load_history`, and `reset` are the only mutators
/// and are serialized by the `turn_in_progress` guard.
pub struct ChatSession {
    pub(super) client: Arc<ApiClient>,
    pub(super) auth: Arc<dyn TokenProvider>,
    pub(super) messages: Vec<Message>,
    pub(super) turn_in_progress: bool,
}

impl ChatSession {
    pub fn new(client: Arc<ApiClient>, auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            client,
            auth,
            messages: Vec::new(),
            turn_in_progress: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_turn_in_progress(&self) -> bool {
        self.turn_in_progress
    }

    pub fn is_signed_in(&self) -> bool {
        self.auth.is_signed_in()
    }

    /// Full replace of the local sequence from a history fetch. Responses
    /// without `success` are ignored rather than clearing local state.
    pub fn apply_history(&mut self, response: HistoryResponse) {
        if response.success {
            self.messages = response.history.into_iter().map(Message::from).collect();
        }
    }

    pub(super) fn clear_local(&mut self) {
        self.messages.clear();
    }

    pub(super) fn require_token(&self) -> Result<BearerToken> {
        self.auth
            .current_token()
            .ok_or_else(|| anyhow!("not signed in: a bearer token is required"))
    }

    /// Fold the running accumulator into the sequence: replace the pending
    /// assistant tail in place, or start one if this is the first fragment
    /// of the turn.
    pub(super) fn fold_assistant_content(&mut self, accumulator: &str) {
        match self.messages.last_mut() {
            Some(Message::Pending {
                role: Role::Assistant,
                partial_content,
            }) => {
                partial_content.clear();
                partial_content.push_str(accumulator);
            }
            _ => self.messages.push(Message::Pending {
                role: Role::Assistant,
                partial_content: accumulator.to_string(),
            }),
        }
    }

    /// Seal the pending tail, if any. Safe to call on every turn exit path.
    pub(super) fn finalize_pending_tail(&mut self) {
        if let Some(tail) = self.messages.last_mut() {
            tail.finalize();
        }
    }
}

pub(super) fn emit_session_update(
    update_tx: Option<&mpsc::UnboundedSender<SessionUpdate>>,
    update: SessionUpdate,
) {
    if let Some(tx) = update_tx {
        let _ = tx.send(update);
    }
}
