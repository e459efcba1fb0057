//! GitHub REST integration: client, response types, pagination.

pub mod client;
pub mod error;
pub mod pagination;
pub mod types;

pub use client::GitHubClient;
pub use error::GitHubError;
pub use pagination::{FetchError, collect_pages};
