//! Prismic REST v2 adapter for the content-source port.

mod client;
mod models;
mod query;
mod source;

pub use client::PrismicClient;
pub use query::{DocumentQuery, Predicate, PublicationOrder};
pub use source::PrismicContentSource;
