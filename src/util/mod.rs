//! Utility functions for common operations.
//!
//! - **Text**: control-sequence stripping and width-aware truncation of text
//!   received from the network
//! - **URL validation**: checks applied before opening a post in the browser

mod text;
mod url_validator;

pub use text::{preview, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_url_for_open, UrlValidationError};
