//! Preview mode: a cookie carrying the ref of unpublished content.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::application::{content::PreviewRef, error::HttpError};

use super::public::HttpState;

pub const PREVIEW_COOKIE: &str = "io.prismic.preview";

/// The preview ref carried by the request, if any.
pub fn preview_ref(jar: &CookieJar) -> Option<PreviewRef> {
    jar.get(PREVIEW_COOKIE)
        .and_then(|cookie| PreviewRef::new(cookie.value()))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct PreviewQuery {
    token: Option<String>,
    #[serde(rename = "documentId")]
    document_id: Option<String>,
}

pub(super) async fn enter_preview(
    State(state): State<HttpState>,
    jar: CookieJar,
    Query(query): Query<PreviewQuery>,
) -> Response {
    const SOURCE: &str = "infra::http::preview::enter_preview";

    let Some(preview) = query.token.and_then(PreviewRef::new) else {
        return HttpError::new(
            SOURCE,
            StatusCode::BAD_REQUEST,
            "Missing preview token",
            "preview request without a token",
        )
        .into_response();
    };

    let location = match query.document_id.as_deref().filter(|id| !id.is_empty()) {
        Some(document_id) => match state.feed.preview_location(document_id, &preview).await {
            Ok(location) => location,
            Err(err) => return HttpError::from(err).into_response(),
        },
        None => "/".to_string(),
    };

    let cookie = Cookie::build((PREVIEW_COOKIE, preview.as_str().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build();

    (jar.add(cookie), Redirect::to(&location)).into_response()
}

pub(super) async fn exit_preview(jar: CookieJar) -> Response {
    let jar = jar.remove(Cookie::build(PREVIEW_COOKIE).path("/"));
    (jar, Redirect::to("/")).into_response()
}
