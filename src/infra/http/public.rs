use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header::CACHE_CONTROL},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::{
    application::{
        chrome::ChromeService,
        error::HttpError,
        feed::{self, FeedError, FeedService, LOAD_MORE_PATH},
    },
    infra::assets,
    presentation::views::{
        IndexTemplate, LayoutChrome, LayoutContext, PostDetailContext, PostTemplate,
        render_not_found_response, render_template_response,
    },
};

use super::{
    DATASTAR_REQUEST_HEADER, content_health_response,
    middleware::{log_responses, set_request_context},
    preview::{self, preview_ref},
};

#[derive(Clone)]
pub struct HttpState {
    pub feed: Arc<FeedService>,
    pub chrome: Arc<ChromeService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/post/{slug}", get(post_detail))
        .route(LOAD_MORE_PATH, get(posts_partial))
        .route("/api/preview", get(preview::enter_preview))
        .route("/api/exit-preview", get(preview::exit_preview))
        .route("/_health/content", get(content_health))
        .route("/static/{*path}", get(assets::serve_public))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CursorQuery {
    cursor: Option<String>,
}

async fn index(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let preview = preview_ref(&jar);
    let chrome = state.chrome.load(preview.is_some());

    match state.feed.page_context(preview.as_ref()).await {
        Ok(content) => {
            let canonical = canonical_url(&chrome.meta.canonical, "/");
            let view = LayoutContext::new(chrome.with_canonical(canonical), content);
            let mut response = render_template_response(IndexTemplate { view }, StatusCode::OK);
            if preview.is_some() {
                set_no_store(&mut response);
            }
            response
        }
        Err(err) => feed_error_to_response(err),
    }
}

async fn post_detail(
    State(state): State<HttpState>,
    Path(slug): Path<String>,
    jar: CookieJar,
) -> Response {
    let preview = preview_ref(&jar);
    let chrome = state.chrome.load(preview.is_some());

    match state.feed.post_detail(&slug, preview.as_ref()).await {
        Ok(Some(content)) => {
            let canonical =
                canonical_url(&chrome.meta.canonical, &feed::post_href(&content.uid));
            let chrome = post_chrome(chrome, &content, canonical);
            let view = LayoutContext::new(chrome, content);
            let mut response = render_template_response(PostTemplate { view }, StatusCode::OK);
            if preview.is_some() {
                set_no_store(&mut response);
            }
            response
        }
        Ok(None) => render_not_found_response(chrome),
        Err(err) => feed_error_to_response(err),
    }
}

async fn posts_partial(
    State(state): State<HttpState>,
    headers: HeaderMap,
    Query(params): Query<CursorQuery>,
) -> Result<Response, HttpError> {
    let Some(cursor) = params.cursor.filter(|cursor| !cursor.is_empty()) else {
        return Err(HttpError::new(
            "infra::http::posts_partial",
            StatusCode::BAD_REQUEST,
            "Missing cursor",
            "load-more request without a cursor",
        ));
    };

    let payload = state.feed.append_payload(&cursor).await?;

    if headers.contains_key(DATASTAR_REQUEST_HEADER) {
        return feed::build_datastar_append_response(payload);
    }

    Ok(feed::build_fragment_response(payload))
}

async fn content_health(State(state): State<HttpState>) -> Response {
    content_health_response(state.feed.health().await)
}

async fn fallback(State(state): State<HttpState>, jar: CookieJar) -> Response {
    let chrome = state.chrome.load(preview_ref(&jar).is_some());
    render_not_found_response(chrome)
}

fn feed_error_to_response(err: FeedError) -> Response {
    HttpError::from(err).into_response()
}

fn set_no_store(response: &mut Response) {
    let value = HeaderValue::from_static("no-store");
    response.headers_mut().insert(CACHE_CONTROL, value);
}

fn post_chrome(chrome: LayoutChrome, content: &PostDetailContext, canonical: String) -> LayoutChrome {
    let meta = chrome
        .meta
        .clone()
        .with_canonical(canonical)
        .with_title(&content.title);
    chrome.with_meta(meta)
}

pub(crate) fn canonical_url(base: &str, path: &str) -> String {
    let root = format!("{}/", base.trim_end_matches('/'));
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        root
    } else {
        format!("{root}{trimmed}")
    }
}
