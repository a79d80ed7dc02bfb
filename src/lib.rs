//! # Kensaku - search state engine for a media catalog
//!
//! Kensaku drives an anime search page: a free-text query plus genre, year,
//! season, format and status filters and a sort order, with results loaded a
//! page at a time. It keeps three things consistent:
//!
//! - the filter selection the user is editing,
//! - the address-bar query string that makes a search shareable,
//! - the results fetched from the catalog.
//!
//! Bursts of filter edits are debounced into one request, responses that were
//! overtaken by a newer request are discarded, and pages accumulate up to a
//! fixed cap.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use kensaku::prelude::*;
//! use kensaku::catalogs::AniListCatalog;
//! use kensaku::query_string::MemoryAddressBar;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = SearchSession::mount(
//!         AniListCatalog::new("https://api.consumet.org"),
//!         MemoryAddressBar::new("?query=naruto"),
//!         SessionConfig::default(),
//!     );
//!
//!     // Several edits in a row produce a single request.
//!     session.set_genres([Genre::Action, Genre::Adventure]);
//!     session.set_format(Choice::Only(Format::Tv));
//!
//!     let mut updates = session.subscribe();
//!     while updates.changed().await.is_ok() {
//!         let results = updates.borrow_and_update().clone();
//!         if !results.loading {
//!             println!("{} results on page {}", results.items.len(), results.page);
//!             break;
//!         }
//!     }
//!
//!     // Infinite scroll asks for the next page.
//!     session.request_more();
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`filters`]: the filter selection store
//! - [`options`]: closed filter vocabularies and the "Any" sentinel
//! - [`query_string`]: address-bar encoding, decoding and synchronization
//! - [`orchestrator`]: debounce timer and request-token bookkeeping
//! - [`pagination`]: page cap and replace-vs-append result merging
//! - [`session`]: the page instance wiring it all together
//! - [`catalog`] / [`catalogs`]: the catalog seam and its HTTP implementation
//! - [`net`]: HTTP client and rate limiting
//! - [`error`]: error handling

pub mod catalog;
pub mod catalogs;
pub mod config;
pub mod error;
pub mod filters;
pub mod net;
pub mod options;
pub mod orchestrator;
pub mod pagination;
pub mod query_string;
pub mod session;
pub mod types;

/// Prelude module for convenient imports.
///
/// ```rust
/// use kensaku::prelude::*;
///
/// // Now you have access to:
/// // - SearchSession, ResultSet, SessionConfig
/// // - Catalog trait
/// // - FilterSelection and the filter vocabularies
/// // - AnimeSummary, SearchRequest, SearchResponse
/// ```
pub mod prelude {
    pub use crate::{
        catalog::Catalog,
        config::SessionConfig,
        filters::FilterSelection,
        options::{
            Choice, FilterOption, Format, Genre, Season, SortDirection, SortField, Status, Year,
        },
        session::{ResultSet, SearchSession},
        types::{AnimeSummary, SearchFilters, SearchRequest, SearchResponse},
    };
}

// Re-export main types at crate root for direct access
pub use catalog::Catalog;
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use filters::FilterSelection;
pub use options::{
    Choice, FilterOption, Format, Genre, Season, SortDirection, SortField, Status, Year,
};
pub use session::{ResultSet, SearchSession};
pub use types::{AnimeSummary, SearchRequest, SearchResponse};
