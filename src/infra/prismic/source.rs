use async_trait::async_trait;

use crate::application::content::{ContentError, ContentSource, PreviewRef};
use crate::application::pagination::{CursorPage, PageCursor, PageSource};
use crate::domain::posts::{Post, PostSummary, SiblingDirection, SiblingPost};

use super::client::PrismicClient;
use super::models::{Document, PostData, SearchResponse, SummaryData, TitleData};
use super::query::{DocumentQuery, Predicate, PublicationOrder};

/// [`ContentSource`] backed by a Prismic repository.
#[derive(Clone, Debug)]
pub struct PrismicContentSource {
    client: PrismicClient,
    document_type: String,
}

impl PrismicContentSource {
    pub fn new(client: PrismicClient, document_type: impl Into<String>) -> Self {
        Self {
            client,
            document_type: document_type.into(),
        }
    }

    async fn reference(&self, preview: Option<&PreviewRef>) -> Result<String, ContentError> {
        match preview {
            Some(preview) => Ok(preview.as_str().to_string()),
            None => self.client.master_ref().await,
        }
    }

    fn type_predicate(&self) -> Predicate {
        Predicate::at("document.type", self.document_type.as_str())
    }

    fn field(&self, name: &str) -> String {
        format!("{}.{name}", self.document_type)
    }

    fn summary_query(&self) -> DocumentQuery {
        DocumentQuery::new(self.type_predicate()).fetch([
            self.field("title"),
            self.field("subtitle"),
            self.field("author"),
        ])
    }
}

fn into_summary_page(
    response: SearchResponse<SummaryData>,
) -> Result<CursorPage<PostSummary>, ContentError> {
    let items = response
        .results
        .into_iter()
        .map(Document::into_summary)
        .collect::<Result<Vec<_>, _>>()?;
    let next_cursor = response
        .next_page
        .as_deref()
        .map(PageCursor::from_api)
        .transpose()?;
    Ok(CursorPage::new(items, next_cursor))
}

#[async_trait]
impl PageSource for PrismicContentSource {
    async fn fetch_page(
        &self,
        cursor: &PageCursor,
    ) -> Result<CursorPage<PostSummary>, ContentError> {
        let response = self.client.follow::<SummaryData>(cursor).await?;
        into_summary_page(response)
    }
}

#[async_trait]
impl ContentSource for PrismicContentSource {
    async fn list_posts(
        &self,
        page_size: u32,
        preview: Option<&PreviewRef>,
    ) -> Result<CursorPage<PostSummary>, ContentError> {
        let reference = self.reference(preview).await?;
        let query = self
            .summary_query()
            .page_size(page_size)
            .ordered(PublicationOrder::NewestFirst);
        let response = self.client.search("list_posts", &reference, &query).await?;
        into_summary_page(response)
    }

    async fn post_by_uid(
        &self,
        uid: &str,
        preview: Option<&PreviewRef>,
    ) -> Result<Option<Post>, ContentError> {
        let reference = self.reference(preview).await?;
        let predicate = Predicate::at(format!("my.{}.uid", self.document_type), uid);
        let query = DocumentQuery::new(predicate).page_size(1);
        let response: SearchResponse<PostData> =
            self.client.search("post_by_uid", &reference, &query).await?;

        response
            .results
            .into_iter()
            .next()
            .map(Document::into_post)
            .transpose()
    }

    async fn sibling(
        &self,
        document_id: &str,
        direction: SiblingDirection,
        preview: Option<&PreviewRef>,
    ) -> Result<Option<SiblingPost>, ContentError> {
        let reference = self.reference(preview).await?;
        // Walking newest-first past the current post reaches older ones.
        let order = match direction {
            SiblingDirection::Previous => PublicationOrder::NewestFirst,
            SiblingDirection::Next => PublicationOrder::OldestFirst,
        };
        let query = DocumentQuery::new(self.type_predicate())
            .fetch([self.field("title")])
            .page_size(1)
            .ordered(order)
            .after(document_id);
        let response: SearchResponse<TitleData> =
            self.client.search("sibling", &reference, &query).await?;

        response
            .results
            .into_iter()
            .next()
            .map(Document::into_sibling)
            .transpose()
    }

    async fn resolve_preview(
        &self,
        document_id: &str,
        preview: &PreviewRef,
    ) -> Result<Option<String>, ContentError> {
        let query = DocumentQuery::new(Predicate::at("document.id", document_id))
            .fetch([self.field("title")])
            .page_size(1);
        let response: SearchResponse<TitleData> = self
            .client
            .search("resolve_preview", preview.as_str(), &query)
            .await?;

        Ok(response.results.into_iter().next().and_then(|doc| doc.uid))
    }

    async fn health(&self) -> Result<(), ContentError> {
        self.client.master_ref().await.map(|_| ())
    }
}
