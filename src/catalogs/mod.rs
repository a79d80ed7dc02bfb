//! Catalog implementations with conditional compilation support.
//!
//! Each catalog is behind its own feature flag:
//! - `catalog-anilist` - AniList advanced search through a consumet-compatible API (default)
//!
//! Build without any bundled catalog (bring your own [`Catalog`](crate::Catalog)):
//! ```bash
//! cargo build --no-default-features
//! ```

#[cfg(feature = "catalog-anilist")]
pub mod anilist;

#[cfg(feature = "catalog-anilist")]
pub use anilist::AniListCatalog;
