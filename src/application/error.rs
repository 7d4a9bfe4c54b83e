use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    application::{content::ContentError, feed::FeedError},
    infra::error::InfraError,
};

#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

#[derive(Debug)]
pub struct HttpError {
    status: StatusCode,
    public_message: &'static str,
    report: ErrorReport,
}

impl HttpError {
    pub fn new(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        detail: impl Into<String>,
    ) -> Self {
        let report = ErrorReport::from_message(source, status, detail);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn from_error(
        source: &'static str,
        status: StatusCode,
        public_message: &'static str,
        error: &dyn StdError,
    ) -> Self {
        let report = ErrorReport::from_error(source, status, error);
        Self {
            status,
            public_message,
            report,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.public_message).into_response();
        self.report.attach(&mut response);
        response
    }
}

/// Upstream failures surface as 502; local misconfiguration as 500.
fn content_status(error: &ContentError) -> (StatusCode, &'static str) {
    match error {
        ContentError::Configuration(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error",
        ),
        ContentError::Pagination(_) => (StatusCode::BAD_REQUEST, "Invalid cursor"),
        ContentError::Transport(_)
        | ContentError::Status { .. }
        | ContentError::Decode(_)
        | ContentError::MissingMasterRef => {
            (StatusCode::BAD_GATEWAY, "Content service unavailable")
        }
    }
}

impl From<ContentError> for HttpError {
    fn from(error: ContentError) -> Self {
        let (status, message) = content_status(&error);
        HttpError::from_error(
            "infra::http::content_error_to_http_error",
            status,
            message,
            &error,
        )
    }
}

impl From<FeedError> for HttpError {
    fn from(error: FeedError) -> Self {
        match error {
            FeedError::InvalidCursor(err) => HttpError::from_error(
                "infra::http::feed_error_to_http_error",
                StatusCode::BAD_REQUEST,
                "Invalid cursor",
                &err,
            ),
            FeedError::Content(err) => {
                let (status, message) = content_status(&err);
                HttpError::from_error(
                    "infra::http::feed_error_to_http_error",
                    status,
                    message,
                    &err,
                )
            }
        }
    }
}

/// Failures that abort startup or the serve loop.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }
}
