use crate::feed::{project, FeedController, IntersectionTrigger, Item, PageSource};
use ratatui::widgets::ListState;
use std::borrow::Cow;
use tokio::sync::mpsc;
use tokio::time::Instant;

/// Status messages disappear after this many seconds.
const STATUS_TTL_SECS: u64 = 3;

/// Window of items visible in the list after the last draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Viewport {
    /// Index of the first visible item.
    pub first: usize,
    /// Number of items that fit on screen.
    pub len: usize,
}

impl Viewport {
    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index < self.first.saturating_add(self.len)
    }
}

/// Terminal application state wrapped around one feed controller.
pub struct App<S> {
    pub controller: FeedController<S>,
    pub trigger: IntersectionTrigger,
    pub list_state: ListState,
    pub viewport: Viewport,
    /// Label shown in the list title, e.g. "r/jewelry".
    pub feed_label: String,
    pub status_message: Option<(Cow<'static, str>, Instant)>,
    /// Set whenever something visible changed; cleared after a draw.
    pub needs_redraw: bool,
    /// Current frame of the loading spinner animation.
    pub spinner_frame: usize,
    errors_rx: mpsc::UnboundedReceiver<String>,
}

impl<S: PageSource> App<S> {
    pub fn new(mut controller: FeedController<S>, feed_label: impl Into<String>) -> Self {
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        controller.on_error(move |kind, detail| {
            let _ = errors_tx.send(format!("Failed to load posts ({}): {}", kind, detail));
        });

        Self {
            controller,
            trigger: IntersectionTrigger::new(),
            list_state: ListState::default(),
            viewport: Viewport::default(),
            feed_label: feed_label.into(),
            status_message: None,
            needs_redraw: true,
            spinner_frame: 0,
            errors_rx,
        }
    }

    /// Kick off the first page.
    pub fn start(&mut self) {
        if self.controller.current_state().has_more {
            self.controller.advance();
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.controller.current_state().items
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.list_state
            .selected()
            .and_then(|i| self.controller.current_state().items.get(i))
    }

    /// Called after a fetch completion has been applied.
    pub fn on_feed_update(&mut self) {
        self.needs_redraw = true;

        if self.list_state.selected().is_none() && !self.items().is_empty() {
            self.list_state.select(Some(0));
        }

        while let Ok(msg) = self.errors_rx.try_recv() {
            self.set_status(msg);
        }
    }

    /// Re-point the trigger at the last item and fire it if that item is on
    /// screen. Called after every draw, once `viewport` is current.
    ///
    /// Returns whether a fetch was started.
    pub fn sync_trigger(&mut self) -> bool {
        let state = self.controller.current_state();
        let view = project(state);
        self.trigger.attach(view.sentinel, view.trigger_active);

        let last_visible = state
            .items
            .len()
            .checked_sub(1)
            .is_some_and(|last| self.viewport.contains(last));

        if self.trigger.report(last_visible) && self.controller.advance() {
            self.needs_redraw = true;
            return true;
        }
        false
    }

    /// Manual retry of the current cursor.
    pub fn retry(&mut self) {
        let state = self.controller.current_state();
        if !state.has_more {
            self.set_status("No more posts to load.");
        } else if state.loading {
            self.set_status("Already loading...");
        } else if self.controller.advance() {
            self.set_status("Retrying...");
        }
    }

    pub fn select_next(&mut self) {
        let len = self.items().len();
        if len == 0 {
            return;
        }
        let next = self.list_state.selected().map_or(0, |i| (i + 1).min(len - 1));
        self.list_state.select(Some(next));
    }

    pub fn select_previous(&mut self) {
        if self.items().is_empty() {
            return;
        }
        let prev = self.list_state.selected().map_or(0, |i| i.saturating_sub(1));
        self.list_state.select(Some(prev));
    }

    pub fn select_first(&mut self) {
        if !self.items().is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        let len = self.items().len();
        if len > 0 {
            self.list_state.select(Some(len - 1));
        }
    }

    pub fn page_down(&mut self) {
        let len = self.items().len();
        if len == 0 {
            return;
        }
        let step = self.viewport.len.max(1);
        let next = self
            .list_state
            .selected()
            .map_or(0, |i| i.saturating_add(step).min(len - 1));
        self.list_state.select(Some(next));
    }

    pub fn page_up(&mut self) {
        if self.items().is_empty() {
            return;
        }
        let step = self.viewport.len.max(1);
        let prev = self.list_state.selected().map_or(0, |i| i.saturating_sub(step));
        self.list_state.select(Some(prev));
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear the status message once it has expired. Returns true if cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{FetchError, Page, NO_DESCRIPTION};
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    struct QueueSource {
        pages: Mutex<VecDeque<Result<Page, FetchError>>>,
        calls: AtomicUsize,
    }

    impl PageSource for QueueSource {
        async fn fetch_page(&self, _cursor: &str, _limit: u32) -> Result<Page, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Page::default()))
        }
    }

    fn page(urls: &[&str], after: Option<&str>) -> Page {
        Page {
            items: urls
                .iter()
                .map(|u| Item {
                    title: u.to_string(),
                    description: NO_DESCRIPTION.to_string(),
                    url: u.to_string(),
                })
                .collect(),
            after: after.map(str::to_string),
        }
    }

    fn app_with(pages: Vec<Result<Page, FetchError>>) -> (App<QueueSource>, Arc<QueueSource>) {
        let source = Arc::new(QueueSource {
            pages: Mutex::new(pages.into()),
            calls: AtomicUsize::new(0),
        });
        let controller = FeedController::new(Arc::clone(&source), 3);
        (App::new(controller, "r/test"), source)
    }

    #[tokio::test]
    async fn test_visible_last_item_loads_next_page() {
        let (mut app, source) = app_with(vec![
            Ok(page(&["a", "b", "c"], Some("c2"))),
            Ok(page(&["d"], None)),
        ]);

        app.start();
        app.controller.settle().await;
        app.on_feed_update();
        assert_eq!(app.list_state.selected(), Some(0));

        // Only the first two cards fit.
        app.viewport = Viewport { first: 0, len: 2 };
        assert!(!app.sync_trigger());

        // Scrolled so the last card is on screen.
        app.viewport = Viewport { first: 1, len: 2 };
        assert!(app.sync_trigger());
        app.controller.settle().await;
        app.on_feed_update();

        assert_eq!(app.items().len(), 4);
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // Feed finished: the trigger stays detached.
        app.viewport = Viewport { first: 2, len: 2 };
        assert!(!app.sync_trigger());
        assert_eq!(app.trigger.observer_id(), None);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_retried_automatically() {
        let (mut app, source) = app_with(vec![
            Ok(page(&["a"], Some("c2"))),
            Err(FetchError::HttpStatus(502)),
        ]);

        app.start();
        app.controller.settle().await;
        app.on_feed_update();

        app.viewport = Viewport { first: 0, len: 5 };
        assert!(app.sync_trigger());
        app.controller.settle().await;
        app.on_feed_update();

        let status = app.status_message.as_ref().map(|(m, _)| m.to_string());
        assert!(status.unwrap().contains("status 502"));

        // Same last item, still visible: no new request.
        assert!(!app.sync_trigger());
        assert!(!app.sync_trigger());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        // Manual retry goes through.
        app.retry();
        assert!(app.controller.is_fetching());
    }

    #[tokio::test]
    async fn test_empty_page_with_cursor_keeps_paging() {
        let (mut app, source) = app_with(vec![
            Ok(page(&["a"], Some("c2"))),
            Ok(page(&[], Some("c3"))),
            Ok(page(&["b"], None)),
        ]);

        app.start();
        app.controller.settle().await;
        app.on_feed_update();
        app.viewport = Viewport { first: 0, len: 5 };

        assert!(app.sync_trigger());
        app.controller.settle().await;
        app.on_feed_update();
        assert_eq!(app.items().len(), 1);
        assert!(app.controller.current_state().has_more);

        // Same last item, but a page was appended: fires again.
        assert!(app.sync_trigger());
        app.controller.settle().await;
        app.on_feed_update();

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert_eq!(app.items().len(), 2);
        assert!(!app.controller.current_state().has_more);
    }

    #[tokio::test]
    async fn test_repeated_url_on_new_page_fires() {
        let (mut app, source) = app_with(vec![
            Ok(page(&["a", "x"], Some("c2"))),
            Ok(page(&["b", "x"], Some("c3"))),
        ]);

        app.start();
        app.controller.settle().await;
        app.on_feed_update();
        app.viewport = Viewport { first: 0, len: 5 };

        assert!(app.sync_trigger());
        app.controller.settle().await;
        app.on_feed_update();
        assert_eq!(app.items().len(), 4);

        assert!(app.sync_trigger());
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_selection_bounds() {
        let (mut app, _) = app_with(vec![Ok(page(&["a", "b", "c"], None))]);
        app.start();
        app.controller.settle().await;
        app.on_feed_update();

        app.select_last();
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(2));

        app.select_first();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));

        app.viewport = Viewport { first: 0, len: 2 };
        app.page_down();
        assert_eq!(app.list_state.selected(), Some(2));
        app.page_up();
        assert_eq!(app.list_state.selected(), Some(0));
        assert_eq!(app.selected_item().map(|i| i.url.as_str()), Some("a"));
    }

    #[test]
    fn test_viewport_contains() {
        let viewport = Viewport { first: 3, len: 4 };
        assert!(!viewport.contains(2));
        assert!(viewport.contains(3));
        assert!(viewport.contains(6));
        assert!(!viewport.contains(7));
        assert!(!Viewport::default().contains(0));
    }
}
