//! Pagination state machine.
//!
//! The controller owns a [`FeedState`] and drives one fetch at a time:
//!
//! ```text
//! Idle(has_more) --advance--> Fetching --page(after)--> Idle(has_more)
//!                                      --page(null)---> Idle(finished)
//!                                      --schema err---> Idle(finished)
//!                                      --other err----> Idle(has_more)
//! ```
//!
//! Fetches run as spawned tasks and report back over a channel owned by the
//! controller. Completions are applied on the caller's task, one transition at
//! a time. Dropping the controller closes the channel, so a fetch that
//! finishes afterwards has nowhere to deliver its result and is discarded.

use crate::feed::source::{FetchError, PageSource};
use crate::feed::types::{Cursor, ErrorKind, FeedState, Page};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;

type StateListener = Box<dyn FnMut(&FeedState) + Send>;
type ErrorHook = Box<dyn FnMut(ErrorKind, &str) + Send>;

/// Result of one fetch, tagged with the request that produced it.
struct Completion {
    request_id: u64,
    result: Result<Page, FetchError>,
}

/// Owns the pagination state of one feed view.
pub struct FeedController<S> {
    source: Arc<S>,
    page_size: u32,
    state: FeedState,
    /// Request id of the single outstanding fetch, if any.
    in_flight: Option<u64>,
    next_request_id: u64,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
    state_listeners: Vec<StateListener>,
    error_hooks: Vec<ErrorHook>,
}

impl<S: PageSource> FeedController<S> {
    pub fn new(source: Arc<S>, page_size: u32) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            source,
            page_size,
            state: FeedState::default(),
            in_flight: None,
            next_request_id: 0,
            completions_tx,
            completions_rx,
            state_listeners: Vec::new(),
            error_hooks: Vec::new(),
        }
    }

    pub fn current_state(&self) -> &FeedState {
        &self.state
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Register a callback run after every state transition.
    pub fn on_state_change(&mut self, listener: impl FnMut(&FeedState) + Send + 'static) {
        self.state_listeners.push(Box::new(listener));
    }

    /// Register a callback run for every failed fetch, after it is logged.
    pub fn on_error(&mut self, hook: impl FnMut(ErrorKind, &str) + Send + 'static) {
        self.error_hooks.push(Box::new(hook));
    }

    /// Start fetching the page after the current cursor.
    ///
    /// Returns `false` without touching the source when a fetch is already in
    /// flight or the feed has ended. Must be called within a tokio runtime.
    pub fn advance(&mut self) -> bool {
        if self.state.loading {
            tracing::debug!("Fetch already in flight, ignoring advance");
            return false;
        }
        if !self.state.has_more {
            tracing::debug!("Feed has ended, ignoring advance");
            return false;
        }

        let request_id = self.next_request_id;
        self.next_request_id = self.next_request_id.wrapping_add(1);
        self.in_flight = Some(request_id);
        self.state.loading = true;

        tracing::info!(
            request_id,
            cursor = %self.state.cursor,
            limit = self.page_size,
            "Fetching next page"
        );

        let source = Arc::clone(&self.source);
        let cursor = self.state.cursor.as_param().to_string();
        let limit = self.page_size;
        let tx = self.completions_tx.clone();

        tokio::spawn(async move {
            let result = AssertUnwindSafe(source.fetch_page(&cursor, limit))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(FetchError::TaskFailed(panic_message(panic))));

            if tx.send(Completion { request_id, result }).is_err() {
                tracing::debug!(request_id, "Feed closed before fetch completed, dropping result");
            }
        });

        self.notify_state();
        true
    }

    /// Wait for the outstanding fetch to complete and apply its result.
    ///
    /// Pends forever while nothing is in flight, which makes it suitable as a
    /// `tokio::select!` branch. Cancel-safe.
    pub async fn next_update(&mut self) {
        // The controller holds a sender, so the channel never closes here.
        if let Some(completion) = self.completions_rx.recv().await {
            self.apply(completion);
        }
    }

    /// Like [`next_update`](Self::next_update), but returns immediately when
    /// no fetch is in flight.
    pub async fn settle(&mut self) {
        if self.in_flight.is_some() {
            self.next_update().await;
        }
    }

    /// Apply a completed fetch if one is ready. Returns whether state changed.
    pub fn try_update(&mut self) -> bool {
        match self.completions_rx.try_recv() {
            Ok(completion) => {
                self.apply(completion);
                true
            }
            Err(_) => false,
        }
    }

    fn apply(&mut self, completion: Completion) {
        if self.in_flight != Some(completion.request_id) {
            tracing::warn!(
                request_id = completion.request_id,
                "Ignoring completion for a request that is not in flight"
            );
            return;
        }

        self.in_flight = None;
        self.state.loading = false;

        match completion.result {
            Ok(page) => self.apply_page(page),
            Err(err) => self.apply_error(err),
        }

        self.notify_state();
    }

    fn apply_page(&mut self, page: Page) {
        let added = page.items.len();
        self.state.items.extend(page.items);
        self.state.pages += 1;

        match page.after {
            Some(token) => self.state.cursor = Cursor::After(token),
            None => {
                self.state.cursor = Cursor::End;
                self.state.has_more = false;
            }
        }

        tracing::info!(
            added,
            total = self.state.items.len(),
            has_more = self.state.has_more,
            "Page appended"
        );
    }

    fn apply_error(&mut self, err: FetchError) {
        let kind = err.kind();
        let detail = err.to_string();

        match kind {
            ErrorKind::Schema => {
                self.state.has_more = false;
                tracing::error!(error = %detail, "Unexpected response from source, ending feed");
            }
            ErrorKind::Transport | ErrorKind::Parse => {
                tracing::warn!(
                    kind = %kind,
                    error = %detail,
                    cursor = %self.state.cursor,
                    "Fetch failed, cursor kept for the next advance"
                );
            }
        }

        for hook in &mut self.error_hooks {
            hook(kind, &detail);
        }
    }

    fn notify_state(&mut self) {
        for listener in &mut self.state_listeners {
            listener(&self.state);
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "fetch task panicked".to_string()
    }
}
