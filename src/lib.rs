//! scrollfeed: page through a subreddit listing in the terminal, loading the
//! next page whenever the last post scrolls into view.
//!
//! - [`feed`] - pagination state machine, listing source, visibility trigger
//! - [`app`] - terminal application state around one feed controller
//! - [`ui`] - ratatui frontend and event loop
//! - [`config`] - optional TOML configuration
//! - [`util`] - text sanitizing and URL checks

pub mod app;
pub mod config;
pub mod feed;
pub mod ui;
pub mod util;
