//! The catalog seam.
//!
//! A [`Catalog`] executes one advanced search and returns one page of results.
//! It is the engine's only network dependency: a
//! [`SearchSession`](crate::SearchSession) calls it at most once per debounce
//! window and treats it as fallible with no latency bound.
//!
//! # Examples
//!
//! ```rust
//! use kensaku::prelude::*;
//! use kensaku::error::Result;
//! use async_trait::async_trait;
//!
//! struct FixedCatalog;
//!
//! #[async_trait]
//! impl Catalog for FixedCatalog {
//!     fn id(&self) -> &str { "fixed" }
//!
//!     async fn advanced_search(&self, request: &SearchRequest) -> Result<SearchResponse> {
//!         let hit = AnimeSummary::new(format!("{}-{}", request.query, request.page), "Fixed");
//!         Ok(SearchResponse::new(vec![hit], request.page < 3))
//!     }
//! }
//! ```

use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    error::Result,
    types::{SearchRequest, SearchResponse},
};

/// Executes advanced searches against a media catalog.
///
/// # Implementation Guidelines
///
/// - Use the [`net::HttpClient`](crate::net::HttpClient) for HTTP requests
/// - Return detailed errors using the [`Error`](crate::Error) types
/// - Omit unconstrained filters from the outgoing query rather than sending
///   empty values
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn id(&self) -> &str;

    /// Fetches one page of results for `request`.
    ///
    /// # Errors
    ///
    /// * [`Error::Network`](crate::Error::Network) - For network/connection issues
    /// * [`Error::Catalog`](crate::Error::Catalog) - For non-success HTTP answers
    /// * [`Error::Json`](crate::Error::Json) or [`Error::Parse`](crate::Error::Parse) -
    ///   For payloads that are not a result page
    async fn advanced_search(&self, request: &SearchRequest) -> Result<SearchResponse>;
}

#[async_trait]
impl<T> Catalog for Arc<T>
where
    T: Catalog + ?Sized,
{
    fn id(&self) -> &str {
        (**self).id()
    }

    async fn advanced_search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        (**self).advanced_search(request).await
    }
}
