use time::{Date, Month, OffsetDateTime};

use crate::domain::{reading_time, rich_text::RichTextBlock};

const PT_BR_SHORT_MONTHS: [&str; 12] = [
    "jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez",
];

/// Listing entry for a published post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<OffsetDateTime>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A single post as fetched for its detail page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Content-source document id; used for sibling lookups.
    pub id: String,
    pub uid: String,
    pub first_publication_date: Option<OffsetDateTime>,
    pub last_publication_date: Option<OffsetDateTime>,
    pub title: String,
    pub banner: Banner,
    pub author: String,
    pub content: Vec<ContentSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub url: String,
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentSection {
    pub heading: String,
    pub body: Vec<RichTextBlock>,
}

/// Neighbouring post reference used for prev/next navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingPost {
    pub uid: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingDirection {
    /// The chronologically earlier post.
    Previous,
    /// The chronologically later post.
    Next,
}

impl Post {
    pub fn reading_minutes(&self) -> u32 {
        reading_time::estimate_minutes(&self.content)
    }

    /// True when the post was republished after its first publication.
    pub fn was_edited(&self) -> bool {
        match (self.first_publication_date, self.last_publication_date) {
            (Some(first), Some(last)) => last > first,
            _ => false,
        }
    }
}

/// Format a date as `d MMM yyyy` with pt-BR month abbreviations, e.g. `25 mar 2021`.
pub fn format_human_date(date: Date) -> String {
    format!(
        "{} {} {}",
        date.day(),
        short_month_label(date.month()),
        date.year()
    )
}

pub fn format_publication_date(at: Option<OffsetDateTime>) -> String {
    at.map(|value| format_human_date(value.date()))
        .unwrap_or_default()
}

/// Edit marker shown under the post header, e.g. `* editado em 25 mar 2021, às 19:25`.
pub fn format_edit_stamp(at: OffsetDateTime) -> String {
    format!(
        "* editado em {}, às {:02}:{:02}",
        format_human_date(at.date()),
        at.hour(),
        at.minute()
    )
}

fn short_month_label(month: Month) -> &'static str {
    PT_BR_SHORT_MONTHS[usize::from(u8::from(month)) - 1]
}
