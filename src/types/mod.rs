mod api;
mod chat;

pub use api::{AskFragment, HistoryEntry, HistoryResponse};
pub use chat::{Message, Role};
