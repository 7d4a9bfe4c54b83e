use std::sync::Arc;

use askama::Template;
use axum::{http::StatusCode, response::Response};
use datastar::prelude::ElementPatchMode;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use url::{Url, form_urlencoded};

use crate::application::content::{ContentError, ContentSource, PreviewRef};
use crate::application::error::HttpError;
use crate::application::pagination::{
    DiagnosticSink, LoadMore, PageCursor, PaginationError, PostPager,
};
use crate::application::stream::StreamBuilder;
use crate::domain::posts::{self, Post, PostSummary, SiblingDirection, SiblingPost};
use crate::domain::rich_text;
use crate::presentation::views::{
    self, CommentsView, FeedLoaderContext, FeedLoaderTemplate, PageContext, PostCard,
    PostCardsAppendTemplate, PostDetailContext, PostsPartial, SectionView, SiblingLink,
    TemplateRenderError,
};

pub const LOAD_MORE_PATH: &str = "/ui/posts";

#[derive(Clone)]
pub struct AppendPayload {
    pub cards: Vec<PostCard>,
    pub next_cursor: Option<PageCursor>,
    pub outcome: LoadMore,
}

#[derive(Clone)]
pub struct FeedService {
    content: Arc<dyn ContentSource>,
    diagnostics: Arc<dyn DiagnosticSink>,
    endpoint: Url,
    page_size: u32,
    comments: Option<CommentsView>,
}

#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    InvalidCursor(#[from] PaginationError),
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl FeedService {
    pub fn new(
        content: Arc<dyn ContentSource>,
        diagnostics: Arc<dyn DiagnosticSink>,
        endpoint: Url,
        page_size: u32,
        comments: Option<CommentsView>,
    ) -> Self {
        Self {
            content,
            diagnostics,
            endpoint,
            page_size,
            comments,
        }
    }

    pub async fn page_context(
        &self,
        preview: Option<&PreviewRef>,
    ) -> Result<PageContext, FeedError> {
        let page = self.content.list_posts(self.page_size, preview).await?;
        let pager = PostPager::from_page(page);
        let loader = loader_context(&pager);
        let cards: Vec<PostCard> = pager.into_summaries().iter().map(summary_to_card).collect();

        Ok(PageContext {
            has_results: !cards.is_empty(),
            posts: cards,
            loader,
        })
    }

    /// Fetch the page at a browser-supplied cursor.
    ///
    /// A failed fetch is reported and yields no cards with the same cursor,
    /// so the caller can offer the button again.
    pub async fn append_payload(&self, cursor: &str) -> Result<AppendPayload, FeedError> {
        let cursor = PageCursor::decode(cursor, &self.endpoint)?;
        let mut pager = PostPager::resume(cursor);
        let outcome = pager
            .load_more(self.content.as_ref(), self.diagnostics.as_ref())
            .await;
        let next_cursor = pager.cursor().cloned();
        let cards = pager.summaries().iter().map(summary_to_card).collect();

        Ok(AppendPayload {
            cards,
            next_cursor,
            outcome,
        })
    }

    pub async fn post_detail(
        &self,
        uid: &str,
        preview: Option<&PreviewRef>,
    ) -> Result<Option<PostDetailContext>, FeedError> {
        let Some(post) = self.content.post_by_uid(uid, preview).await? else {
            return Ok(None);
        };

        let (previous, next) = tokio::try_join!(
            self.content
                .sibling(&post.id, SiblingDirection::Previous, preview),
            self.content.sibling(&post.id, SiblingDirection::Next, preview),
        )?;

        Ok(Some(build_post_context(
            post,
            previous,
            next,
            self.comments.clone(),
        )))
    }

    /// Where to send the browser after entering preview for `document_id`.
    pub async fn preview_location(
        &self,
        document_id: &str,
        preview: &PreviewRef,
    ) -> Result<String, FeedError> {
        let uid = self.content.resolve_preview(document_id, preview).await?;
        Ok(uid.map(|uid| post_href(&uid)).unwrap_or_else(|| "/".to_string()))
    }

    pub async fn health(&self) -> Result<(), FeedError> {
        self.content.health().await.map_err(FeedError::from)
    }
}

pub fn post_href(uid: &str) -> String {
    format!("/post/{uid}")
}

fn iso_date(at: Option<OffsetDateTime>) -> String {
    at.and_then(|value| value.format(&Rfc3339).ok())
        .unwrap_or_default()
}

fn summary_to_card(summary: &PostSummary) -> PostCard {
    PostCard {
        uid: summary.uid.clone(),
        href: post_href(&summary.uid),
        title: summary.title.clone(),
        subtitle: summary.subtitle.clone(),
        author: summary.author.clone(),
        published: posts::format_publication_date(summary.first_publication_date),
        iso_date: iso_date(summary.first_publication_date),
    }
}

fn sibling_link(sibling: SiblingPost) -> SiblingLink {
    SiblingLink {
        href: post_href(&sibling.uid),
        title: sibling.title,
    }
}

fn loader_context(pager: &PostPager) -> FeedLoaderContext {
    match pager.cursor() {
        Some(cursor) if pager.can_load_more() => loader_for_cursor(cursor),
        _ => FeedLoaderContext::exhausted(),
    }
}

fn loader_for_cursor(cursor: &PageCursor) -> FeedLoaderContext {
    let encoded: String = form_urlencoded::byte_serialize(cursor.encode().as_bytes()).collect();
    FeedLoaderContext {
        has_more: true,
        load_more_path: format!("{LOAD_MORE_PATH}?cursor={encoded}"),
    }
}

fn build_post_context(
    post: Post,
    previous: Option<SiblingPost>,
    next: Option<SiblingPost>,
    comments: Option<CommentsView>,
) -> PostDetailContext {
    let reading_minutes = post.reading_minutes();
    let edited = post
        .was_edited()
        .then_some(post.last_publication_date)
        .flatten()
        .map(posts::format_edit_stamp);

    let sections = post
        .content
        .iter()
        .map(|section| SectionView {
            heading: section.heading.clone(),
            body_html: rich_text::as_html(&section.body),
        })
        .collect();

    PostDetailContext {
        published: posts::format_publication_date(post.first_publication_date),
        iso_date: iso_date(post.first_publication_date),
        banner_alt: post.banner.alt.unwrap_or_else(|| post.title.clone()),
        banner_url: post.banner.url,
        uid: post.uid,
        title: post.title,
        author: post.author,
        edited,
        reading_minutes,
        sections,
        previous: previous.map(sibling_link),
        next: next.map(sibling_link),
        comments,
    }
}

fn render_fragment<T: Template>(template: T) -> Result<String, HttpError> {
    template.render().map_err(|err| {
        HttpError::from(TemplateRenderError::new(
            "application::feed::render_fragment",
            "Template rendering failed",
            err,
        ))
    })
}

fn payload_loader(next_cursor: Option<&PageCursor>) -> FeedLoaderContext {
    next_cursor
        .map(loader_for_cursor)
        .unwrap_or_else(FeedLoaderContext::exhausted)
}

pub fn build_datastar_append_response(payload: AppendPayload) -> Result<Response, HttpError> {
    let AppendPayload {
        cards, next_cursor, ..
    } = payload;

    let cards_html = if cards.is_empty() {
        None
    } else {
        Some(render_fragment(PostCardsAppendTemplate { posts: cards })?)
    };

    let loader_html = render_fragment(FeedLoaderTemplate {
        view: payload_loader(next_cursor.as_ref()),
    })?;

    let mut stream = StreamBuilder::new();

    if let Some(html) = cards_html {
        stream.push_patch(html, "#post-grid", ElementPatchMode::Append);
    }

    stream.push_patch(
        loader_html,
        "#feed-sentinel-container",
        ElementPatchMode::Inner,
    );

    stream.push_signals(r#"{"feedLoading": false}"#);

    Ok(stream.into_response())
}

/// Bare HTML fragment for callers that do not send the datastar header.
/// It holds only the requested page and is not a standalone document.
pub fn build_fragment_response(payload: AppendPayload) -> Response {
    let AppendPayload {
        cards, next_cursor, ..
    } = payload;
    let content = PageContext {
        has_results: !cards.is_empty(),
        posts: cards,
        loader: payload_loader(next_cursor.as_ref()),
    };
    views::render_template_response(PostsPartial { content }, StatusCode::OK)
}
