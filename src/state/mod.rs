pub mod feed;
pub mod session;

pub use feed::FeedTracker;
pub use session::{ChatSession, SessionUpdate};
