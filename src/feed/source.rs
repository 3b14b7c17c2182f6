use crate::config::Config;
use crate::feed::types::{ErrorKind, Item, Page, RawEntry};
use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::redirect::Policy;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const MAX_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while fetching one page.
///
/// Every variant maps onto an [`ErrorKind`] via [`FetchError::kind`], which is
/// what the controller uses to decide whether the feed ends.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Body was not valid JSON
    #[error("Parse error: {0}")]
    Parse(String),
    /// JSON was valid but not shaped like a listing
    #[error("Unexpected response shape: {0}")]
    Schema(String),
    /// The background fetch task died before reporting a result
    #[error("Fetch task failed: {0}")]
    TaskFailed(String),
}

impl FetchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FetchError::Parse(_) => ErrorKind::Parse,
            FetchError::Schema(_) => ErrorKind::Schema,
            FetchError::Network(_)
            | FetchError::HttpStatus(_)
            | FetchError::Timeout
            | FetchError::ResponseTooLarge
            | FetchError::TaskFailed(_) => ErrorKind::Transport,
        }
    }
}

/// A paginated source of feed items.
///
/// `cursor` is the opaque continuation token from the previous page, or the
/// empty string for the first page. `limit` is the page size.
pub trait PageSource: Send + Sync + 'static {
    fn fetch_page(
        &self,
        cursor: &str,
        limit: u32,
    ) -> impl Future<Output = Result<Page, FetchError>> + Send;
}

#[derive(Deserialize)]
struct Listing {
    children: Vec<ListingChild>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Deserialize)]
struct ListingChild {
    data: RawEntry,
}

/// Decode a listing body into a [`Page`].
///
/// Invalid JSON is a [`FetchError::Parse`]. A body without a `data` object, or
/// whose `data` is not a listing, is a [`FetchError::Schema`]. A missing
/// `after` is treated the same as `null`.
pub fn parse_listing(bytes: &[u8]) -> Result<Page, FetchError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| FetchError::Parse(e.to_string()))?;

    let data = match value.get("data") {
        Some(data) if !data.is_null() => data,
        _ => return Err(FetchError::Schema("response has no `data` field".into())),
    };

    let listing = Listing::deserialize(data).map_err(|e| FetchError::Schema(e.to_string()))?;

    Ok(Page {
        items: listing
            .children
            .iter()
            .map(|child| Item::from_entry(&child.data))
            .collect(),
        after: listing.after,
    })
}

/// Redirect policy for listing requests.
///
/// - Limits redirects to 3 hops maximum
/// - Detects redirect loops (same URL appearing twice in chain)
fn redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        tracing::debug!(
            to = %url,
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

/// Subreddit listing endpoint: `{base}/r/{subreddit}.json?limit=N&after=C`.
#[derive(Debug, Clone)]
pub struct RedditSource {
    client: reqwest::Client,
    endpoint: Url,
    timeout: Option<Duration>,
}

impl RedditSource {
    /// Build a source for `subreddit` under `base_url` (an origin such as
    /// `https://www.reddit.com`).
    pub fn new(
        client: reqwest::Client,
        base_url: &Url,
        subreddit: &str,
        timeout: Option<Duration>,
    ) -> Result<Self, url::ParseError> {
        let endpoint = base_url.join(&format!("r/{}.json", subreddit))?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    /// Build the HTTP client and endpoint from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(redirect_policy())
            .build()
            .context("Failed to build HTTP client")?;

        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid base_url '{}'", config.base_url))?;

        let source = Self::new(client, &base_url, &config.subreddit, config.request_timeout())
            .with_context(|| format!("Invalid subreddit '{}'", config.subreddit))?;
        Ok(source)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Full request URL for one page.
    pub fn page_url(&self, cursor: &str, limit: u32) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("after", cursor);
        url
    }

    async fn fetch(&self, url: Url) -> Result<Page, FetchError> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_BODY_SIZE).await?;
        parse_listing(&bytes)
    }
}

impl PageSource for RedditSource {
    async fn fetch_page(&self, cursor: &str, limit: u32) -> Result<Page, FetchError> {
        let url = self.page_url(cursor, limit);
        tracing::info!(url = %url, "Fetching posts");

        match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.fetch(url))
                .await
                .map_err(|_| FetchError::Timeout)?,
            None => self.fetch(url).await,
        }
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
