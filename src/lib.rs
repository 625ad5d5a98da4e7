// ghsearch library crate.
// Search GitHub users, keep favorites, and render it all in a terminal UI.

pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod favorites;
pub mod github;
pub mod logging;
pub mod state;
pub mod ui;
