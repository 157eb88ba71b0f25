pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod format;
pub mod state;
pub mod terminal;
pub mod types;
pub mod ui;
pub mod util;

#[cfg(test)]
pub mod test_support;
