//! Content-source port: where posts come from.

use async_trait::async_trait;
use thiserror::Error;

use crate::application::pagination::{CursorPage, PageSource, PaginationError};
use crate::domain::posts::{Post, PostSummary, SiblingDirection, SiblingPost};

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content request failed: {0}")]
    Transport(String),
    #[error("content API responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("content API payload could not be decoded: {0}")]
    Decode(String),
    #[error("content API does not advertise a master ref")]
    MissingMasterRef,
    #[error("content source misconfigured: {0}")]
    Configuration(String),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
}

impl ContentError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }
}

/// Reference to unpublished content, used instead of the published snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewRef(String);

impl PreviewRef {
    /// Returns `None` for blank tokens.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait ContentSource: PageSource {
    /// First page of post summaries, newest first.
    async fn list_posts(
        &self,
        page_size: u32,
        preview: Option<&PreviewRef>,
    ) -> Result<CursorPage<PostSummary>, ContentError>;

    async fn post_by_uid(
        &self,
        uid: &str,
        preview: Option<&PreviewRef>,
    ) -> Result<Option<Post>, ContentError>;

    /// The single post adjacent to `document_id` in publication order.
    async fn sibling(
        &self,
        document_id: &str,
        direction: SiblingDirection,
        preview: Option<&PreviewRef>,
    ) -> Result<Option<SiblingPost>, ContentError>;

    /// Map a previewed document id to the uid of the post it belongs to.
    async fn resolve_preview(
        &self,
        document_id: &str,
        preview: &PreviewRef,
    ) -> Result<Option<String>, ContentError>;

    async fn health(&self) -> Result<(), ContentError>;
}
