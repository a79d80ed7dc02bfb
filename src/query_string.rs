//! Address-bar synchronization.
//!
//! The query string is the only persisted form of a search: it makes searches
//! shareable and bookmarkable. This module maps a [`FilterSelection`] to and
//! from `application/x-www-form-urlencoded` parameters:
//!
//! | parameter | written when                 | decoded as                 |
//! |-----------|------------------------------|----------------------------|
//! | `query`   | always, even if empty        | the raw string             |
//! | `genres`  | at least one genre selected  | comma-separated genre list |
//! | `year`    | constrained                  | a single year              |
//! | `season`  | constrained                  | a single season token      |
//! | `format`  | constrained                  | a single format token      |
//! | `status`  | constrained                  | a single status token      |
//!
//! Decoding is loss-tolerant: missing or unknown values fall back to "Any".
//!
//! # Examples
//!
//! ```rust
//! use kensaku::query_string::{decode, encode};
//! use kensaku::{FilterSelection, Genre};
//!
//! let mut selection = FilterSelection::with_query("x");
//! selection.set_genres([Genre::Action]);
//!
//! let encoded = encode(&selection);
//! assert_eq!(encoded, "query=x&genres=Action");
//! assert_eq!(decode(&encoded), selection);
//! ```

use parking_lot::Mutex;
use std::sync::Arc;
use url::form_urlencoded;

use crate::filters::FilterSelection;
use crate::options::{Choice, Genre};

/// Read/write access to the host's address bar.
///
/// Implementations own navigation. The search engine only ever replaces the
/// current entry; it never adds history.
pub trait AddressBar: Send {
    /// The current query string, with or without a leading `?`.
    fn query_string(&self) -> String;

    /// Replaces the current query string without adding a history entry.
    fn replace(&mut self, query_string: &str);
}

/// Encodes a selection as a query string.
///
/// Sort order is not part of the address-bar representation.
pub fn encode(selection: &FilterSelection) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("query", selection.query());

    if !selection.genres().is_empty() {
        let genres = selection
            .genres()
            .iter()
            .map(Genre::as_param)
            .collect::<Vec<_>>()
            .join(",");
        serializer.append_pair("genres", &genres);
    }

    let singles = [
        ("year", selection.year().param()),
        ("season", selection.season().param()),
        ("format", selection.format().param()),
        ("status", selection.status().param()),
    ];
    for (name, value) in singles {
        if let Some(value) = value {
            serializer.append_pair(name, &value);
        }
    }

    serializer.finish()
}

/// Decodes a query string into a selection with default sort order.
pub fn decode(query_string: &str) -> FilterSelection {
    let params = Params::parse(query_string);

    let mut selection = FilterSelection::with_query(params.get("query").unwrap_or_default());
    selection.set_genres(decode_genres(params.get("genres")));
    selection.set_year(Choice::from_param(params.get("year")));
    selection.set_season(Choice::from_param(params.get("season")));
    selection.set_format(Choice::from_param(params.get("format")));
    selection.set_status(Choice::from_param(params.get("status")));
    selection
}

/// The `query` parameter of a query string, empty when absent.
pub fn query_param(query_string: &str) -> String {
    Params::parse(query_string)
        .get("query")
        .unwrap_or_default()
        .to_string()
}

fn decode_genres(raw: Option<&str>) -> Vec<Genre> {
    let Some(raw) = raw else {
        return Vec::new();
    };

    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match token.parse::<Genre>() {
            Ok(genre) => Some(genre),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring genre parameter");
                None
            }
        })
        .collect()
}

/// Decoded parameters. Lookups return the first occurrence of a name.
struct Params(Vec<(String, String)>);

impl Params {
    fn parse(query_string: &str) -> Self {
        let raw = query_string.strip_prefix('?').unwrap_or(query_string);
        Params(
            form_urlencoded::parse(raw.as_bytes())
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect(),
        )
    }

    fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Keeps one address bar in step with a selection.
pub struct UrlSynchronizer {
    bar: Box<dyn AddressBar>,
}

impl UrlSynchronizer {
    pub fn new(bar: impl AddressBar + 'static) -> Self {
        Self { bar: Box::new(bar) }
    }

    /// Mount-time decode of the current address bar.
    pub fn read(&self) -> FilterSelection {
        decode(&self.bar.query_string())
    }

    /// Writes the encoded selection, skipping the write when the address bar
    /// already holds exactly that string. Returns whether it wrote.
    pub fn write(&mut self, selection: &FilterSelection) -> bool {
        let encoded = encode(selection);
        let current = self.bar.query_string();
        if current.strip_prefix('?').unwrap_or(&current) == encoded {
            return false;
        }
        self.bar.replace(&encoded);
        true
    }

    /// The address bar's `query` parameter when it differs from `current`.
    pub fn external_query(&self, current: &str) -> Option<String> {
        let observed = query_param(&self.bar.query_string());
        (observed != current).then_some(observed)
    }
}

impl std::fmt::Debug for UrlSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSynchronizer")
            .field("query_string", &self.bar.query_string())
            .finish()
    }
}

#[derive(Debug, Default)]
struct History {
    entries: Vec<String>,
    cursor: usize,
    replacements: usize,
}

/// In-memory address bar with a navigation history.
///
/// Clones share the same history, so a host (or a test) can keep one handle
/// to navigate while a session owns another.
///
/// ```rust
/// use kensaku::query_string::{AddressBar, MemoryAddressBar};
///
/// let mut bar = MemoryAddressBar::new("?query=naruto");
/// bar.navigate("query=bleach");
/// bar.replace("query=bleach&year=2004");
/// assert_eq!(bar.history_len(), 2);
///
/// bar.back();
/// assert_eq!(bar.query_string(), "query=naruto");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryAddressBar {
    history: Arc<Mutex<History>>,
}

impl MemoryAddressBar {
    pub fn new(initial: impl Into<String>) -> Self {
        let initial = initial.into();
        let initial = initial.strip_prefix('?').unwrap_or(&initial).to_string();
        Self {
            history: Arc::new(Mutex::new(History {
                entries: vec![initial],
                ..Default::default()
            })),
        }
    }

    /// Pushes a new history entry, dropping any forward entries.
    pub fn navigate(&self, query_string: impl Into<String>) {
        let mut history = self.history.lock();
        let cursor = history.cursor;
        history.entries.truncate(cursor + 1);
        history.entries.push(query_string.into());
        history.cursor += 1;
    }

    /// Moves one entry back. Returns `false` at the oldest entry.
    pub fn back(&self) -> bool {
        let mut history = self.history.lock();
        if history.cursor == 0 {
            return false;
        }
        history.cursor -= 1;
        true
    }

    /// Moves one entry forward. Returns `false` at the newest entry.
    pub fn forward(&self) -> bool {
        let mut history = self.history.lock();
        if history.cursor + 1 >= history.entries.len() {
            return false;
        }
        history.cursor += 1;
        true
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().entries.len()
    }

    /// Number of `replace` calls so far.
    pub fn replacements(&self) -> usize {
        self.history.lock().replacements
    }
}

impl Default for MemoryAddressBar {
    fn default() -> Self {
        Self::new("")
    }
}

impl AddressBar for MemoryAddressBar {
    fn query_string(&self) -> String {
        let history = self.history.lock();
        history.entries[history.cursor].clone()
    }

    fn replace(&mut self, query_string: &str) {
        let mut history = self.history.lock();
        let cursor = history.cursor;
        history.entries[cursor] = query_string.to_string();
        history.replacements += 1;
    }
}
