//! Core data types exchanged with the catalog.
//!
//! - [`AnimeSummary`] - One search hit, rendered as a card by the UI
//! - [`SearchRequest`] - A fully resolved catalog query for one page
//! - [`SearchFilters`] - The filter part of a request, in wire form
//! - [`SearchResponse`] - One page of hits plus the "more available" flag
//!
//! # Examples
//!
//! ```rust
//! use kensaku::types::{SearchRequestBuilder, SearchFilters};
//!
//! let request = SearchRequestBuilder::default()
//!     .query("frieren")
//!     .page(2u32)
//!     .filters(SearchFilters {
//!         genres: vec!["Fantasy".to_string()],
//!         sort: vec!["SCORE_DESC".to_string()],
//!         ..Default::default()
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(request.page_size, 17);
//! assert!(request.filters.year.is_none());
//! ```

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Number of results requested per page.
pub const PAGE_SIZE: u32 = 17;

/// Highest page a search session will ever request.
pub const MAX_PAGE: u32 = 10;

/// A catalog entry as returned by an advanced search.
///
/// The engine treats these as opaque; only the rendering layer looks inside.
///
/// # Fields
///
/// * `id` - Catalog identifier, used to link to the watch page
/// * `title` - Best available title
/// * `image` - Poster image URL
/// * `cover` - Banner image URL
/// * `format` - Media format token (`TV`, `MOVIE`, ...)
/// * `status` - Release status token (`RELEASING`, `FINISHED`, ...)
/// * `rating` - Average score out of 100
/// * `release_year` - Year the first episode aired
/// * `total_episodes` - Episode count, when known
/// * `genres` - Genre names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimeSummary {
    pub id: String,

    pub title: String,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub cover: Option<String>,

    #[serde(default)]
    pub format: Option<String>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub rating: Option<u32>,

    #[serde(default)]
    pub release_year: Option<u16>,

    #[serde(default)]
    pub total_episodes: Option<u32>,

    #[serde(default)]
    pub genres: Vec<String>,
}

impl AnimeSummary {
    /// Creates a summary with only an id and a title.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image: None,
            cover: None,
            format: None,
            status: None,
            rating: None,
            release_year: None,
            total_episodes: None,
            genres: Vec::new(),
        }
    }
}

/// Filter part of a catalog request, in wire form.
///
/// Unconstrained single-valued dimensions are `None` rather than empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Sort tokens such as `POPULARITY_DESC`.
    #[serde(default)]
    pub sort: Vec<String>,
}

/// A catalog query for one page of results.
///
/// Requests are derived from a [`FilterSelection`](crate::FilterSelection) when
/// the session issues a fetch and are never stored beyond that call.
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct SearchRequest {
    #[builder(default)]
    pub query: String,
    #[builder(default = "1")]
    pub page: u32,
    #[builder(default = "PAGE_SIZE")]
    pub page_size: u32,
    #[builder(default)]
    pub filters: SearchFilters,
}

impl SearchRequest {
    /// The single sort token, if the request carries one.
    pub fn sort(&self) -> Option<&str> {
        self.filters.sort.first().map(String::as_str)
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<AnimeSummary>,
    #[serde(default)]
    pub has_next_page: bool,
}

impl SearchResponse {
    pub fn new(results: Vec<AnimeSummary>, has_next_page: bool) -> Self {
        Self {
            results,
            has_next_page,
        }
    }
}
