use crate::feed::types::FeedState;

/// One displayable card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// Identity key (the item's url).
    pub key: &'a str,
    /// Set on the last row only; that row anchors the intersection trigger.
    pub is_last: bool,
}

/// The row the trigger observes, tagged with the page count at projection
/// time so each successful append yields a fresh target even when the last
/// key repeats or does not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sentinel<'a> {
    pub page: u64,
    pub key: &'a str,
}

/// What the renderer should draw for a given state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection<'a> {
    pub rows: Vec<Row<'a>>,
    pub show_loading: bool,
    pub show_end: bool,
    /// Row the trigger should observe.
    pub sentinel: Option<Sentinel<'a>>,
    /// Whether the trigger should be attached at all.
    pub trigger_active: bool,
}

/// Project feed state onto displayable rows. Pure.
pub fn project(state: &FeedState) -> Projection<'_> {
    let last = state.items.len().checked_sub(1);

    let rows = state
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| Row {
            title: &item.title,
            description: &item.description,
            key: &item.url,
            is_last: Some(i) == last,
        })
        .collect();

    Projection {
        rows,
        show_loading: state.loading,
        show_end: !state.has_more,
        sentinel: state.items.last().map(|item| Sentinel {
            page: state.pages,
            key: &item.url,
        }),
        trigger_active: state.can_advance(),
    }
}
