//! Paginated feed core.
//!
//! - **Types**: items, cursor, and the pagination state
//! - **Source**: the `PageSource` trait and the subreddit listing client
//! - **Controller**: the fetch/append/cursor state machine
//! - **Trigger**: edge-triggered visibility detection for the last item
//! - **Projection**: pure mapping from state to displayable rows
//!
//! # Example
//!
//! ```ignore
//! use scrollfeed::feed::{FeedController, IntersectionTrigger, RedditSource, project};
//!
//! let mut controller = FeedController::new(Arc::new(source), 10);
//! let mut trigger = IntersectionTrigger::new();
//!
//! controller.advance();
//! controller.settle().await;
//!
//! let view = project(controller.current_state());
//! trigger.attach(view.sentinel, view.trigger_active);
//! if trigger.report(last_row_visible) {
//!     controller.advance();
//! }
//! ```

mod controller;
mod projection;
mod source;
mod trigger;
mod types;

pub use controller::FeedController;
pub use projection::{project, Projection, Row, Sentinel};
pub use source::{parse_listing, FetchError, PageSource, RedditSource};
pub use trigger::IntersectionTrigger;
pub use types::{Cursor, ErrorKind, FeedState, Item, Page, RawEntry, NO_DESCRIPTION};
