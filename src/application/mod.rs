//! Application services orchestrating content retrieval and rendering.

pub mod chrome;
pub mod content;
pub mod error;
pub mod feed;
pub mod pagination;
pub mod stream;
