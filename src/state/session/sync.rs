use super::state::ChatSession;
use anyhow::{bail, Result};

impl ChatSession {
    /// Replace the local sequence with the server's persisted history. A
    /// response with `success == false` leaves local state untouched.
    pub async fn load_history(&mut self) -> Result<()> {
        if self.turn_in_progress {
            bail!("cannot reload history while a question is streaming");
        }

        let token = self.require_token()?;
        let response = self.client.history(&token).await?;
        self.apply_history(response);
        Ok(())
    }

    /// Clear the conversation on the server, then locally. Idempotent.
    pub async fn reset(&mut self) -> Result<()> {
        if self.turn_in_progress {
            bail!("cannot reset while a question is streaming");
        }

        let token = self.require_token()?;
        self.client.clear(&token).await?;
        self.clear_local();
        Ok(())
    }
}
