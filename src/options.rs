//! Filter vocabularies and the "unconstrained" sentinel.
//!
//! Every single-valued filter dimension is a [`Choice`]: either [`Choice::Any`]
//! (no constraint) or [`Choice::Only`] holding a value from a closed vocabulary.
//! The vocabularies are:
//!
//! - [`Genre`] - multi-valued, held as a list on the selection
//! - [`Year`] - a validated calendar year
//! - [`Season`], [`Format`], [`Status`] - airing season, media format, release status
//! - [`SortField`] and [`SortDirection`] - the catalog sort order
//!
//! Each value has a wire token (what goes into the query string and the catalog
//! request) and a display name for widgets. [`FilterOption`] is the
//! `{ value, label }` view handed to the rendering layer.
//!
//! # Examples
//!
//! ```rust
//! use kensaku::options::{Choice, Format, FilterOption};
//!
//! let format: Choice<Format> = Choice::Only("TV_SHORT".parse().unwrap());
//! assert_eq!(format.param().as_deref(), Some("TV_SHORT"));
//! assert_eq!(format.option(), FilterOption::new("TV_SHORT", "TV_SHORT"));
//!
//! let any: Choice<Format> = Choice::Any;
//! assert_eq!(any.option(), FilterOption::any());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Label shown for an unconstrained dimension.
pub const ANY_LABEL: &str = "Any";

/// A `{ value, label }` pair describing one selectable filter value.
///
/// An empty `value` means "no constraint" and is displayed as `"Any"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilterOption {
    pub value: String,
    pub label: String,
}

impl FilterOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }

    /// The unconstrained option: `{ value: "", label: "Any" }`.
    pub fn any() -> Self {
        Self::new("", ANY_LABEL)
    }

    pub fn is_any(&self) -> bool {
        self.value.is_empty()
    }
}

/// A value that can appear in a filter dimension.
///
/// The `Display` implementation must produce the wire token, and `FromStr`
/// must accept it back.
pub trait FilterValue: FromStr<Err = Error> + fmt::Display + Clone + PartialEq {
    /// Name of the dimension, used in error messages and logs.
    const DIMENSION: &'static str;

    /// Wire token for this value.
    fn to_param(&self) -> String {
        self.to_string()
    }
}

/// A single-valued filter dimension: unconstrained, or exactly one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Choice<T> {
    /// No constraint.
    Any,
    /// Constrained to one value.
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::Any
    }
}

impl<T> Choice<T> {
    pub fn is_any(&self) -> bool {
        matches!(self, Choice::Any)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Choice::Any => None,
            Choice::Only(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Choice<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Choice::Only(value),
            None => Choice::Any,
        }
    }
}

impl<T: FilterValue> Choice<T> {
    /// Wire token, or `None` when unconstrained.
    pub fn param(&self) -> Option<String> {
        self.as_option().map(FilterValue::to_param)
    }

    /// The rendering-facing view. Constrained values carry `label == value`.
    pub fn option(&self) -> FilterOption {
        match self.param() {
            Some(token) => FilterOption::new(token.clone(), token),
            None => FilterOption::any(),
        }
    }

    /// Parses an optional raw parameter. Missing, empty and unknown values all
    /// decode to [`Choice::Any`].
    pub fn from_param(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Choice::Any;
        };

        match raw.parse::<T>() {
            Ok(value) => Choice::Only(value),
            Err(e) => {
                tracing::debug!(dimension = T::DIMENSION, error = %e, "ignoring filter parameter");
                Choice::Any
            }
        }
    }
}

macro_rules! filter_vocabulary {
    (
        $(#[$meta:meta])*
        $name:ident, $dimension:literal {
            $( $variant:ident => $token:literal, $display:literal; )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )+
        }

        impl $name {
            /// Every value of this vocabulary, in display order.
            pub const ALL: &'static [$name] = &[$( $name::$variant ),+];

            /// Wire token used in query strings and catalog requests.
            pub fn as_param(&self) -> &'static str {
                match self {
                    $( $name::$variant => $token, )+
                }
            }

            /// Human-readable name for filter widgets.
            pub fn display_name(&self) -> &'static str {
                match self {
                    $( $name::$variant => $display, )+
                }
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $( $token => Ok($name::$variant), )+
                    other => Err(Error::invalid_option($dimension, other)),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_param())
            }
        }

        impl FilterValue for $name {
            const DIMENSION: &'static str = $dimension;
        }
    };
}

filter_vocabulary! {
    /// Catalog genres. Tokens match their display names.
    Genre, "genre" {
        Action => "Action", "Action";
        Adventure => "Adventure", "Adventure";
        Cars => "Cars", "Cars";
        Comedy => "Comedy", "Comedy";
        Drama => "Drama", "Drama";
        Ecchi => "Ecchi", "Ecchi";
        Fantasy => "Fantasy", "Fantasy";
        Horror => "Horror", "Horror";
        MahouShoujo => "Mahou Shoujo", "Mahou Shoujo";
        Mecha => "Mecha", "Mecha";
        Music => "Music", "Music";
        Mystery => "Mystery", "Mystery";
        Psychological => "Psychological", "Psychological";
        Romance => "Romance", "Romance";
        SciFi => "Sci-Fi", "Sci-Fi";
        SliceOfLife => "Slice of Life", "Slice of Life";
        Sports => "Sports", "Sports";
        Supernatural => "Supernatural", "Supernatural";
        Thriller => "Thriller", "Thriller";
    }
}

filter_vocabulary! {
    /// Airing season.
    Season, "season" {
        Winter => "WINTER", "Winter";
        Spring => "SPRING", "Spring";
        Summer => "SUMMER", "Summer";
        Fall => "FALL", "Fall";
    }
}

filter_vocabulary! {
    /// Media format.
    Format, "format" {
        Tv => "TV", "TV";
        TvShort => "TV_SHORT", "TV Short";
        Movie => "MOVIE", "Movie";
        Special => "SPECIAL", "Special";
        Ova => "OVA", "OVA";
        Ona => "ONA", "ONA";
        Music => "MUSIC", "Music";
    }
}

filter_vocabulary! {
    /// Release status.
    Status, "status" {
        Releasing => "RELEASING", "Airing";
        Finished => "FINISHED", "Finished";
        NotYetReleased => "NOT_YET_RELEASED", "Not Yet Aired";
        Cancelled => "CANCELLED", "Cancelled";
        Hiatus => "HIATUS", "Hiatus";
    }
}

filter_vocabulary! {
    /// Field the catalog sorts by.
    SortField, "sort" {
        Popularity => "POPULARITY", "Popularity";
        Trending => "TRENDING", "Trending";
        Score => "SCORE", "Score";
        Favourites => "FAVOURITES", "Favourites";
        StartDate => "START_DATE", "Release Date";
        UpdatedAt => "UPDATED_AT", "Recently Updated";
        TitleRomaji => "TITLE_ROMAJI", "Title";
        Episodes => "EPISODES", "Episodes";
    }
}

impl Default for SortField {
    fn default() -> Self {
        SortField::Popularity
    }
}

impl SortField {
    /// The `FilterOption` view of this sort field.
    pub fn option(&self) -> FilterOption {
        FilterOption::new(self.as_param(), self.display_name())
    }
}

/// Direction of the catalog sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_param(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    /// The opposite direction, for a toggle widget.
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            other => Err(Error::invalid_option("sort direction", other)),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_param())
    }
}

/// Builds the catalog sort token, e.g. `POPULARITY_DESC`.
pub fn sort_param(field: SortField, direction: SortDirection) -> String {
    format!("{}_{}", field.as_param(), direction.as_param())
}

/// A release year between [`Year::MIN`] and [`Year::MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Year(u16);

impl Year {
    pub const MIN: u16 = 1900;
    pub const MAX: u16 = 2100;

    pub fn new(year: u16) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&year) {
            Ok(Year(year))
        } else {
            Err(Error::invalid_option("year", year.to_string()))
        }
    }

    pub fn get(&self) -> u16 {
        self.0
    }
}

impl FromStr for Year {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let year = s
            .parse::<u16>()
            .map_err(|_| Error::invalid_option("year", s))?;
        Year::new(year)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FilterValue for Year {
    const DIMENSION: &'static str = "year";
}
