use super::state::{emit_session_update, ChatSession, SessionUpdate};
use crate::api::stream::{Frame, FrameParser};
use crate::types::Message;
use anyhow::{bail, Result};
use futures::StreamExt;
use tokio::sync::mpsc;

impl ChatSession {
    /// Run one ask turn: push the user message, stream the answer, and fold
    /// fragments into the pending assistant tail in arrival order.
    ///
    /// Whitespace-only input is a no-op. A turn already in flight is refused
    /// before any state or network is touched; the busy flag and the pending
    /// tail are both released on every exit path, including transport errors,
    /// so partial content stays visible but is never left mutable.
    pub async fn send_message(
        &mut self,
        text: String,
        update_tx: Option<&mpsc::UnboundedSender<SessionUpdate>>,
    ) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        if self.turn_in_progress {
            bail!("another question is still streaming");
        }

        self.turn_in_progress = true;
        let result = self.run_turn(text, update_tx).await;
        self.finalize_pending_tail();
        self.turn_in_progress = false;
        emit_session_update(update_tx, SessionUpdate::TurnFinalized);
        result
    }

    async fn run_turn(
        &mut self,
        text: String,
        update_tx: Option<&mpsc::UnboundedSender<SessionUpdate>>,
    ) -> Result<String> {
        self.messages.push(Message::user(text.clone()));

        let token = self.require_token()?;
        let mut stream = self.client.ask(&text, &token).await?;
        let mut parser = FrameParser::new();
        let mut assistant_text = String::new();
        let mut terminated = false;

        'read: while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result?;
            for frame in parser.process(&chunk) {
                match frame {
                    Frame::Text(fragment) => {
                        self.append_fragment(&mut assistant_text, fragment, update_tx);
                    }
                    Frame::Done => {
                        // The sentinel is the authoritative end of turn; stop
                        // reading and let the transport drop.
                        terminated = true;
                        break 'read;
                    }
                }
            }
        }

        // Transport EOF without a sentinel still finalizes cleanly; a last
        // unterminated line may carry one more fragment.
        if !terminated {
            if let Some(Frame::Text(fragment)) = parser.finish() {
                self.append_fragment(&mut assistant_text, fragment, update_tx);
            }
        }

        Ok(assistant_text)
    }

    fn append_fragment(
        &mut self,
        assistant_text: &mut String,
        fragment: String,
        update_tx: Option<&mpsc::UnboundedSender<SessionUpdate>>,
    ) {
        if fragment.is_empty() {
            return;
        }
        assistant_text.push_str(&fragment);
        self.fold_assistant_content(assistant_text);
        emit_session_update(update_tx, SessionUpdate::AssistantDelta(fragment));
    }
}
