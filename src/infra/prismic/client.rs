use std::time::Instant;

use metrics::{counter, histogram};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::application::content::ContentError;
use crate::application::pagination::PageCursor;
use crate::config::PrismicSettings;
use crate::infra::telemetry::{CONTENT_REQUEST_MS, CONTENT_REQUESTS_TOTAL};

use super::models::{ApiRoot, SearchResponse};
use super::query::DocumentQuery;

const SEARCH_PATH: &str = "documents/search";
const ACCESS_TOKEN_PARAM: &str = "access_token";

/// Thin client over the Prismic REST v2 API.
#[derive(Clone, Debug)]
pub struct PrismicClient {
    http: Client,
    endpoint: Url,
    access_token: Option<String>,
}

impl PrismicClient {
    pub fn new(settings: &PrismicSettings) -> Result<Self, ContentError> {
        let mut builder = Client::builder().user_agent(Self::user_agent());
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|err| ContentError::Configuration(err.to_string()))?;

        Ok(Self {
            http,
            endpoint: settings.api_endpoint.clone(),
            access_token: settings.access_token.clone(),
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("spacetravelling/", env!("CARGO_PKG_VERSION"))
    }

    /// Reference of the currently published content.
    pub async fn master_ref(&self) -> Result<String, ContentError> {
        let url = self.authorized(self.endpoint.clone());
        let root: ApiRoot = self.get_json("api_root", url).await?;
        root.master_ref()
            .map(str::to_string)
            .ok_or(ContentError::MissingMasterRef)
    }

    pub async fn search<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        reference: &str,
        query: &DocumentQuery,
    ) -> Result<SearchResponse<T>, ContentError> {
        let mut url = self.search_url()?;
        query.apply(&mut url, reference);
        self.get_json(operation, self.authorized(url)).await
    }

    /// Fetch the page a cursor points at. The cursor never carries a token.
    pub async fn follow<T: DeserializeOwned>(
        &self,
        cursor: &PageCursor,
    ) -> Result<SearchResponse<T>, ContentError> {
        let url = self.authorized(cursor.url().clone());
        self.get_json("next_page", url).await
    }

    fn search_url(&self) -> Result<Url, ContentError> {
        let mut base = self.endpoint.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.set_query(None);
        base.join(SEARCH_PATH)
            .map_err(|err| ContentError::Configuration(err.to_string()))
    }

    fn authorized(&self, mut url: Url) -> Url {
        if let Some(token) = self.access_token.as_deref() {
            url.query_pairs_mut().append_pair(ACCESS_TOKEN_PARAM, token);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        url: Url,
    ) -> Result<T, ContentError> {
        let started = Instant::now();
        let result = self.send(url).await;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let outcome = match &result {
            Ok(_) => "ok",
            Err(ContentError::Status { .. }) => "status",
            Err(ContentError::Decode(_)) => "decode",
            Err(_) => "transport",
        };
        counter!(CONTENT_REQUESTS_TOTAL, "operation" => operation, "outcome" => outcome)
            .increment(1);
        histogram!(CONTENT_REQUEST_MS, "operation" => operation).record(elapsed_ms);
        debug!(
            target = "spacetravelling::prismic",
            operation = operation,
            outcome = outcome,
            elapsed_ms = elapsed_ms,
            "content API request finished"
        );

        result
    }

    async fn send<T: DeserializeOwned>(&self, url: Url) -> Result<T, ContentError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|err| ContentError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ContentError::Transport(err.without_url().to_string()))?;

        if status != StatusCode::OK {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            return Err(ContentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| ContentError::decode(format!("failed to parse body: {err}")))
    }
}
