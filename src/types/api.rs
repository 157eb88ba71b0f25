use serde::{Deserialize, Serialize};

use super::{Message, Role};

/// One line of a streaming ask response, after the `data:` marker is
/// stripped. Only `text` matters; unknown fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct AskFragment {
    #[serde(default)]
    pub text: Option<String>,
}

/// Flat `{role, content}` record as persisted by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: String,
}

impl From<HistoryEntry> for Message {
    fn from(entry: HistoryEntry) -> Self {
        Message::Finalized {
            role: entry.role,
            content: entry.content,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}
