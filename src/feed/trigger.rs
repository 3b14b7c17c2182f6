//! Visibility trigger for the last rendered item.
//!
//! The frontend calls [`IntersectionTrigger::attach`] after every render with
//! the projected [`Sentinel`] and whether pagination is currently allowed,
//! then [`IntersectionTrigger::report`] with whether that row is inside the
//! viewport. `report` returns `true` once per entry into view; the caller
//! reacts by advancing the feed controller.
//!
//! Targets are identified by the page count, not the item key. A target that
//! already fired stays spent until a page is appended: after a failed fetch
//! the same row has to leave the viewport and come back before it fires a
//! second time.

use crate::feed::projection::Sentinel;

/// The single live observer.
#[derive(Debug)]
struct Observer {
    id: u64,
    page: u64,
    target: String,
    /// Last known visibility of `target`; `None` until the first report.
    intersecting: Option<bool>,
}

#[derive(Debug, Default)]
pub struct IntersectionTrigger {
    observer: Option<Observer>,
    next_id: u64,
    /// Page count of the target that last fired.
    last_fired: Option<u64>,
}

impl IntersectionTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point the trigger at `sentinel`, or detach when there is nothing to
    /// observe or `active` is false.
    ///
    /// Re-attaching to the target already observed keeps the existing
    /// observer.
    pub fn attach(&mut self, sentinel: Option<Sentinel<'_>>, active: bool) {
        let sentinel = match sentinel {
            Some(sentinel) if active => sentinel,
            _ => {
                self.disconnect();
                return;
            }
        };

        if self
            .observer
            .as_ref()
            .is_some_and(|o| o.page == sentinel.page && o.target == sentinel.key)
        {
            return;
        }

        self.disconnect();

        let spent = self.last_fired == Some(sentinel.page);
        if !spent {
            self.last_fired = None;
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        tracing::debug!(observer = id, page = sentinel.page, item = %sentinel.key, "Observing last item");
        self.observer = Some(Observer {
            id,
            page: sentinel.page,
            target: sentinel.key.to_string(),
            intersecting: spent.then_some(true),
        });
    }

    /// Drop the current observer, if any.
    pub fn disconnect(&mut self) {
        if let Some(observer) = self.observer.take() {
            tracing::debug!(observer = observer.id, item = %observer.target, "Observer disconnected");
        }
    }

    /// Feed the observed target's visibility. Returns `true` when it has just
    /// come into view.
    pub fn report(&mut self, target_visible: bool) -> bool {
        let Some(observer) = self.observer.as_mut() else {
            return false;
        };

        let entered = target_visible && observer.intersecting != Some(true);
        observer.intersecting = Some(target_visible);

        if entered {
            self.last_fired = Some(observer.page);
            tracing::info!(item = %observer.target, "Last item in view, loading more");
        }
        entered
    }

    pub fn observer_id(&self) -> Option<u64> {
        self.observer.as_ref().map(|o| o.id)
    }

    pub fn observed(&self) -> Option<&str> {
        self.observer.as_ref().map(|o| o.target.as_str())
    }
}
