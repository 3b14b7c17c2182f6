use std::fmt;

/// Description shown for posts that carry no self text.
pub const NO_DESCRIPTION: &str = "No description available.";

/// A single post in the feed.
///
/// Built from one raw source entry by [`Item::from_entry`] and never mutated
/// afterwards. `url` doubles as the identity key for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub title: String,
    pub description: String,
    pub url: String,
}

/// Raw fields of one listing child as delivered by the source.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Deserialize)]
pub struct RawEntry {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl Item {
    /// Map a raw entry to an item. Pure: equal entries give equal items.
    pub fn from_entry(entry: &RawEntry) -> Self {
        let description = match entry.selftext.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => NO_DESCRIPTION.to_string(),
        };

        Self {
            title: entry.title.clone().unwrap_or_default(),
            description,
            url: entry.url.clone().unwrap_or_default(),
        }
    }
}

/// Opaque continuation token produced by the source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cursor {
    /// No page fetched yet; sent as the empty string.
    #[default]
    Start,
    /// Token to echo back verbatim for the next page.
    After(String),
    /// The source reported that no further pages exist.
    End,
}

impl Cursor {
    /// Value for the paging query parameter.
    pub fn as_param(&self) -> &str {
        match self {
            Cursor::Start | Cursor::End => "",
            Cursor::After(token) => token,
        }
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cursor::Start => f.write_str("<start>"),
            Cursor::After(token) => f.write_str(token),
            Cursor::End => f.write_str("<end>"),
        }
    }
}

/// One page returned by a [`PageSource`](super::PageSource).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub items: Vec<Item>,
    /// Continuation token; `None` is the authoritative end-of-data signal.
    pub after: Option<String>,
}

/// Pagination state owned by a single [`FeedController`](super::FeedController).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    /// Accumulated items, append-only within a session.
    pub items: Vec<Item>,
    pub cursor: Cursor,
    /// True while exactly one fetch is outstanding.
    pub loading: bool,
    /// Once false, stays false.
    pub has_more: bool,
    /// Pages applied successfully so far, including empty ones.
    pub pages: u64,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: Cursor::Start,
            loading: false,
            has_more: true,
            pages: 0,
        }
    }
}

impl FeedState {
    /// Whether an `advance` request would start a fetch right now.
    pub fn can_advance(&self) -> bool {
        !self.loading && self.has_more
    }
}

/// Coarse classification of fetch failures, as seen by error hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network unreachable, non-2xx status, timeout, oversized body.
    Transport,
    /// Body was not valid JSON.
    Parse,
    /// Valid JSON without the expected listing shape. Ends the feed.
    Schema,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport",
            ErrorKind::Parse => "parse",
            ErrorKind::Schema => "schema",
        };
        f.write_str(name)
    }
}
