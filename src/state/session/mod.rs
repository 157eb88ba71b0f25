mod state;
mod sync;
mod turn;


pub use state::{ChatSession, SessionUpdate};
