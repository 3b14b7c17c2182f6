//! Terminal User Interface module.
//!
//! - `loop_runner` - Main event loop, terminal management, pagination scheduling
//! - `input` - Keyboard input handling
//! - `render` - Layout and footer (loading spinner / end of feed)
//! - `posts` - Post card list widget
//! - `status` - Status bar widget

mod input;
mod loop_runner;
mod posts;
mod render;
mod status;

pub use loop_runner::{run, Action};
