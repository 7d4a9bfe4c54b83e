//! Cursor pagination over the content API's `next_page` links.

use std::error::Error as StdError;

use async_trait::async_trait;
use thiserror::Error;
use tracing::error;
use url::Url;

use crate::application::content::ContentError;
use crate::domain::posts::PostSummary;

const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Location of the next unfetched page, as handed out by the content API.
///
/// Access tokens are never kept inside a cursor; the client re-attaches its
/// own token when the cursor is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    url: Url,
}

impl PageCursor {
    /// Wrap a `next_page` URL returned by the content API.
    pub fn from_api(raw: &str) -> Result<Self, PaginationError> {
        let url = Url::parse(raw).map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;
        Ok(Self {
            url: without_access_token(url),
        })
    }

    /// Decode a cursor received from a browser. It must target `endpoint`.
    pub fn decode(raw: &str, endpoint: &Url) -> Result<Self, PaginationError> {
        let url = Url::parse(raw).map_err(|err| PaginationError::InvalidCursor(err.to_string()))?;

        if url.origin() != endpoint.origin() {
            return Err(PaginationError::ForeignCursor(url.origin().ascii_serialization()));
        }

        let base_path = endpoint.path().trim_end_matches('/');
        let path = url.path();
        let within_base = path == base_path || path.starts_with(&format!("{base_path}/"));
        if !within_base {
            return Err(PaginationError::ForeignCursor(url.path().to_string()));
        }

        Ok(Self {
            url: without_access_token(url),
        })
    }

    pub fn encode(&self) -> String {
        self.url.to_string()
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

fn without_access_token(mut url: Url) -> Url {
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != ACCESS_TOKEN_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if retained.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(retained);
    }
    url
}

/// One page of results plus the cursor of the page after it.
#[derive(Debug, Clone)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<PageCursor>,
}

impl<T> CursorPage<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
        }
    }

    pub fn new(items: Vec<T>, next_cursor: Option<PageCursor>) -> Self {
        Self { items, next_cursor }
    }
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("cursor does not target the configured content API: {0}")]
    ForeignCursor(String),
}

/// Anything able to resolve a cursor into the next page of summaries.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, cursor: &PageCursor) -> Result<CursorPage<PostSummary>, ContentError>;
}

/// Receiver for failures the pager swallows.
pub trait DiagnosticSink: Send + Sync {
    fn report(&self, source: &'static str, error: &(dyn StdError + 'static));
}

/// Reports swallowed failures as `tracing` error events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl DiagnosticSink for TracingDiagnostics {
    fn report(&self, source: &'static str, error: &(dyn StdError + 'static)) {
        let mut chain = Vec::new();
        let mut current = error.source();
        while let Some(inner) = current {
            chain.push(inner.to_string());
            current = inner.source();
        }
        error!(
            target = "spacetravelling::pagination",
            source = source,
            error = %error,
            chain = ?chain,
            "failed to load more posts"
        );
    }
}

/// Result of a single [`PostPager::load_more`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMore {
    /// A page arrived and `count` summaries were appended.
    Appended { count: usize },
    /// No cursor is left; nothing was fetched.
    Exhausted,
    /// A fetch is already outstanding; nothing was fetched.
    Busy,
    /// The fetch failed and was reported; state is unchanged.
    Failed,
}

/// Ordered post summaries fetched so far, the cursor of the next page and
/// whether a fetch is in flight.
#[derive(Debug, Clone, Default)]
pub struct PostPager {
    summaries: Vec<PostSummary>,
    cursor: Option<PageCursor>,
    busy: bool,
}

impl PostPager {
    pub fn new(summaries: Vec<PostSummary>, cursor: Option<PageCursor>) -> Self {
        Self {
            summaries,
            cursor,
            busy: false,
        }
    }

    pub fn from_page(page: CursorPage<PostSummary>) -> Self {
        Self::new(page.items, page.next_cursor)
    }

    /// A pager that has shown nothing yet and continues at `cursor`.
    pub fn resume(cursor: PageCursor) -> Self {
        Self::new(Vec::new(), Some(cursor))
    }

    pub fn summaries(&self) -> &[PostSummary] {
        &self.summaries
    }

    pub fn into_summaries(self) -> Vec<PostSummary> {
        self.summaries
    }

    pub fn cursor(&self) -> Option<&PageCursor> {
        self.cursor.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether the "load more" affordance should be offered.
    pub fn can_load_more(&self) -> bool {
        self.cursor.is_some() && !self.busy
    }

    /// Fetch the page at the current cursor and append it.
    ///
    /// The busy flag stays set if the returned future is dropped before it
    /// completes; later calls then report [`LoadMore::Busy`].
    pub async fn load_more<S>(&mut self, source: &S, diagnostics: &dyn DiagnosticSink) -> LoadMore
    where
        S: PageSource + ?Sized,
    {
        if self.busy {
            return LoadMore::Busy;
        }
        let Some(cursor) = self.cursor.clone() else {
            return LoadMore::Exhausted;
        };

        self.busy = true;
        let outcome = match source.fetch_page(&cursor).await {
            Ok(page) => {
                let count = page.items.len();
                self.summaries.extend(page.items);
                self.cursor = page.next_cursor;
                LoadMore::Appended { count }
            }
            Err(err) => {
                diagnostics.report("application::pagination::PostPager::load_more", &err);
                LoadMore::Failed
            }
        };
        self.busy = false;

        outcome
    }
}
