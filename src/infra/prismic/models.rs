//! Wire shapes of the Prismic REST v2 API and their mapping onto domain types.

use serde::Deserialize;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::application::content::ContentError;
use crate::domain::posts::{Banner, ContentSection, Post, PostSummary, SiblingPost};
use crate::domain::rich_text::{BlockKind, RichTextBlock, Span, SpanKind};

#[derive(Debug, Deserialize)]
pub struct ApiRoot {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

impl ApiRoot {
    pub fn master_ref(&self) -> Option<&str> {
        self.refs
            .iter()
            .find(|entry| entry.is_master_ref)
            .map(|entry| entry.reference.as_str())
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiRef {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchResponse<T> {
    #[serde(default = "Vec::new")]
    pub results: Vec<Document<T>>,
    pub next_page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub id: String,
    pub uid: Option<String>,
    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,
    pub data: T,
}

impl<T> Document<T> {
    fn require_uid(&self) -> Result<String, ContentError> {
        self.uid
            .clone()
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| ContentError::decode(format!("document `{}` has no uid", self.id)))
    }
}

#[derive(Debug, Deserialize)]
pub struct SummaryData {
    #[serde(default)]
    pub title: Option<TextField>,
    #[serde(default)]
    pub subtitle: Option<TextField>,
    #[serde(default)]
    pub author: Option<TextField>,
}

#[derive(Debug, Deserialize)]
pub struct PostData {
    #[serde(default)]
    pub title: Option<TextField>,
    #[serde(default)]
    pub banner: Option<ImageField>,
    #[serde(default)]
    pub author: Option<TextField>,
    #[serde(default)]
    pub content: Vec<ContentSlice>,
}

#[derive(Debug, Deserialize)]
pub struct TitleData {
    #[serde(default)]
    pub title: Option<TextField>,
}

#[derive(Debug, Deserialize)]
pub struct ContentSlice {
    #[serde(default)]
    pub heading: Option<TextField>,
    #[serde(default)]
    pub body: Vec<RichTextNode>,
}

#[derive(Debug, Deserialize)]
pub struct ImageField {
    pub url: Option<String>,
    pub alt: Option<String>,
}

/// Key-text fields arrive as strings, title/rich-text fields as node arrays.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TextField {
    Plain(String),
    Rich(Vec<RichTextNode>),
}

impl TextField {
    fn into_text(self) -> String {
        match self {
            TextField::Plain(text) => text,
            TextField::Rich(nodes) => nodes
                .into_iter()
                .map(|node| node.text)
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

fn text_of(field: Option<TextField>) -> String {
    field.map(TextField::into_text).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<SpanNode>,
    pub url: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpanNode {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Option<SpanData>,
}

#[derive(Debug, Deserialize)]
pub struct SpanData {
    pub url: Option<String>,
}

impl RichTextNode {
    /// `None` for node types that carry nothing renderable.
    fn into_block(self) -> Option<RichTextBlock> {
        let kind = match self.kind.as_str() {
            "paragraph" => BlockKind::Paragraph,
            "preformatted" => BlockKind::Preformatted,
            "list-item" => BlockKind::ListItem,
            "o-list-item" => BlockKind::OrderedListItem,
            "image" => BlockKind::Image {
                url: self.url.clone()?,
                alt: self.alt.clone(),
            },
            heading => match heading
                .strip_prefix("heading")
                .and_then(|level| level.parse::<u8>().ok())
            {
                Some(level) => BlockKind::Heading(level),
                None if !self.text.is_empty() => BlockKind::Paragraph,
                None => return None,
            },
        };

        let spans = self.spans.into_iter().filter_map(SpanNode::into_span).collect();
        Some(RichTextBlock {
            kind,
            text: self.text,
            spans,
        })
    }
}

impl SpanNode {
    fn into_span(self) -> Option<Span> {
        let kind = match self.kind.as_str() {
            "strong" => SpanKind::Strong,
            "em" => SpanKind::Em,
            "hyperlink" => SpanKind::Hyperlink {
                url: self.data.and_then(|data| data.url)?,
            },
            _ => return None,
        };
        Some(Span {
            start: self.start,
            end: self.end,
            kind,
        })
    }
}

/// Prismic timestamps look like `2021-03-25T19:25:28+0000`.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, ContentError> {
    let compact = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second][offset_hour sign:mandatory][offset_minute]"
    );
    OffsetDateTime::parse(raw, &compact)
        .or_else(|_| OffsetDateTime::parse(raw, &Rfc3339))
        .map_err(|err| ContentError::decode(format!("invalid timestamp `{raw}`: {err}")))
}

fn parse_optional_timestamp(raw: Option<&str>) -> Result<Option<OffsetDateTime>, ContentError> {
    raw.map(parse_timestamp).transpose()
}

impl Document<SummaryData> {
    pub fn into_summary(self) -> Result<PostSummary, ContentError> {
        let uid = self.require_uid()?;
        let first_publication_date =
            parse_optional_timestamp(self.first_publication_date.as_deref())?;
        Ok(PostSummary {
            uid,
            first_publication_date,
            title: text_of(self.data.title),
            subtitle: text_of(self.data.subtitle),
            author: text_of(self.data.author),
        })
    }
}

impl Document<PostData> {
    pub fn into_post(self) -> Result<Post, ContentError> {
        let uid = self.require_uid()?;
        let first_publication_date =
            parse_optional_timestamp(self.first_publication_date.as_deref())?;
        let last_publication_date =
            parse_optional_timestamp(self.last_publication_date.as_deref())?;

        let banner = self
            .data
            .banner
            .map(|image| Banner {
                url: image.url.unwrap_or_default(),
                alt: image.alt.filter(|alt| !alt.trim().is_empty()),
            })
            .unwrap_or(Banner {
                url: String::new(),
                alt: None,
            });

        let content = self
            .data
            .content
            .into_iter()
            .map(|slice| ContentSection {
                heading: text_of(slice.heading),
                body: slice
                    .body
                    .into_iter()
                    .filter_map(RichTextNode::into_block)
                    .collect(),
            })
            .collect();

        Ok(Post {
            id: self.id,
            uid,
            first_publication_date,
            last_publication_date,
            title: text_of(self.data.title),
            banner,
            author: text_of(self.data.author),
            content,
        })
    }
}

impl Document<TitleData> {
    pub fn into_sibling(self) -> Result<SiblingPost, ContentError> {
        Ok(SiblingPost {
            uid: self.require_uid()?,
            title: text_of(self.data.title),
        })
    }
}
