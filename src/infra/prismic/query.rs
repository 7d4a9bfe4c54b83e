//! Builder for `documents/search` query strings.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self::At {
            path: path.into(),
            value: value.into(),
        }
    }

    fn render(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
                format!("[at({path}, \"{escaped}\")]")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationOrder {
    NewestFirst,
    OldestFirst,
}

impl PublicationOrder {
    fn render(self) -> &'static str {
        match self {
            PublicationOrder::NewestFirst => "[document.first_publication_date desc]",
            PublicationOrder::OldestFirst => "[document.first_publication_date]",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    predicates: Vec<Predicate>,
    fetch: Vec<String>,
    page_size: Option<u32>,
    order: Option<PublicationOrder>,
    after: Option<String>,
}

impl DocumentQuery {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicates: vec![predicate],
            ..Self::default()
        }
    }

    pub fn fetch<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fetch.extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    pub fn ordered(mut self, order: PublicationOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Only documents that come after `document_id` in the chosen order.
    pub fn after(mut self, document_id: impl Into<String>) -> Self {
        self.after = Some(document_id.into());
        self
    }

    /// Append the query parameters for `reference` to a search URL.
    pub fn apply(&self, url: &mut Url, reference: &str) {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("ref", reference);

        let q: String = self.predicates.iter().map(Predicate::render).collect();
        pairs.append_pair("q", &format!("[{q}]"));

        if !self.fetch.is_empty() {
            pairs.append_pair("fetch", &self.fetch.join(","));
        }
        if let Some(size) = self.page_size {
            pairs.append_pair("pageSize", &size.to_string());
        }
        if let Some(order) = self.order {
            pairs.append_pair("orderings", order.render());
        }
        if let Some(after) = self.after.as_deref() {
            pairs.append_pair("after", after);
        }
    }
}
