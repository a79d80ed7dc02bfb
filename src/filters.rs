//! The filter selection store.
//!
//! [`FilterSelection`] holds the free-text query and the value of every filter
//! dimension. It is plain state: setters report whether anything changed and
//! leave it to the owner (normally a [`SearchSession`](crate::SearchSession)) to
//! rewrite the address bar, reset pagination and schedule a fetch.
//!
//! # Examples
//!
//! ```rust
//! use kensaku::{FilterSelection, Genre, Season};
//! use kensaku::options::Choice;
//!
//! let mut selection = FilterSelection::with_query("one piece");
//! assert!(selection.toggle_genre(Genre::Adventure));
//! assert!(selection.set_season(Choice::Only(Season::Fall)));
//! assert!(!selection.set_season(Choice::Only(Season::Fall)));
//!
//! selection.reset();
//! assert_eq!(selection.query(), "one piece");
//! assert!(selection.is_default());
//! ```

use crate::options::{
    sort_param, Choice, FilterOption, Format, Genre, Season, SortDirection, SortField, Status,
    Year,
};
use crate::types::{SearchFilters, SearchRequest};

/// Which part of a selection a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SelectionChange {
    /// The free-text query changed.
    pub query: bool,
    /// Any other dimension, sort included, changed.
    pub filters: bool,
}

impl SelectionChange {
    pub fn any(&self) -> bool {
        self.query || self.filters
    }
}

/// Current value of every search dimension for one page instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    query: String,
    genres: Vec<Genre>,
    year: Choice<Year>,
    season: Choice<Season>,
    format: Choice<Format>,
    status: Choice<Status>,
    sort_field: SortField,
    sort_direction: SortDirection,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// A default selection carrying the given query.
    pub fn with_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn genres(&self) -> &[Genre] {
        &self.genres
    }

    pub fn year(&self) -> Choice<Year> {
        self.year
    }

    pub fn season(&self) -> Choice<Season> {
        self.season
    }

    pub fn format(&self) -> Choice<Format> {
        self.format
    }

    pub fn status(&self) -> Choice<Status> {
        self.status
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    /// Genres as `{ value, label }` pairs for a multi-select widget.
    pub fn genre_options(&self) -> Vec<FilterOption> {
        self.genres
            .iter()
            .map(|genre| FilterOption::new(genre.as_param(), genre.as_param()))
            .collect()
    }

    pub fn set_query(&mut self, query: impl Into<String>) -> bool {
        replace(&mut self.query, query.into())
    }

    /// Replaces the genre set. Duplicates are dropped, first occurrence wins.
    pub fn set_genres(&mut self, genres: impl IntoIterator<Item = Genre>) -> bool {
        let mut deduped: Vec<Genre> = Vec::new();
        for genre in genres {
            if !deduped.contains(&genre) {
                deduped.push(genre);
            }
        }
        replace(&mut self.genres, deduped)
    }

    /// Adds the genre if absent, removes it otherwise. Always a change.
    pub fn toggle_genre(&mut self, genre: Genre) -> bool {
        match self.genres.iter().position(|g| *g == genre) {
            Some(index) => {
                self.genres.remove(index);
            }
            None => self.genres.push(genre),
        }
        true
    }

    pub fn set_year(&mut self, year: Choice<Year>) -> bool {
        replace(&mut self.year, year)
    }

    pub fn set_season(&mut self, season: Choice<Season>) -> bool {
        replace(&mut self.season, season)
    }

    pub fn set_format(&mut self, format: Choice<Format>) -> bool {
        replace(&mut self.format, format)
    }

    pub fn set_status(&mut self, status: Choice<Status>) -> bool {
        replace(&mut self.status, status)
    }

    pub fn set_sort_field(&mut self, field: SortField) -> bool {
        replace(&mut self.sort_field, field)
    }

    pub fn set_sort_direction(&mut self, direction: SortDirection) -> bool {
        replace(&mut self.sort_direction, direction)
    }

    /// Restores every dimension except the query to its default.
    pub fn reset(&mut self) -> bool {
        let cleared = Self::with_query(self.query.clone());
        replace(self, cleared)
    }

    /// `true` when nothing but the query constrains the search.
    pub fn is_default(&self) -> bool {
        *self == Self::with_query(self.query.clone())
    }

    /// Applies `edit` and reports which parts of the selection it changed.
    pub fn update<F>(&mut self, edit: F) -> SelectionChange
    where
        F: FnOnce(&mut FilterSelection),
    {
        let before = self.clone();
        edit(self);
        self.diff(&before)
    }

    /// Compares against an earlier state of the same selection.
    pub fn diff(&self, before: &FilterSelection) -> SelectionChange {
        SelectionChange {
            query: self.query != before.query,
            filters: self.genres != before.genres
                || self.year != before.year
                || self.season != before.season
                || self.format != before.format
                || self.status != before.status
                || self.sort_field != before.sort_field
                || self.sort_direction != before.sort_direction,
        }
    }

    /// Wire form of the filter dimensions.
    pub fn to_filters(&self) -> SearchFilters {
        SearchFilters {
            genres: self.genres.iter().map(|g| g.as_param().to_string()).collect(),
            year: self.year.param(),
            season: self.season.param(),
            format: self.format.param(),
            status: self.status.param(),
            sort: vec![sort_param(self.sort_field, self.sort_direction)],
        }
    }

    /// Builds the catalog request for `page` of this selection.
    pub fn to_request(&self, page: u32, page_size: u32) -> SearchRequest {
        SearchRequest {
            query: self.query.clone(),
            page,
            page_size,
            filters: self.to_filters(),
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        return false;
    }
    *slot = value;
    true
}
