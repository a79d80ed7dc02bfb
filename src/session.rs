//! The search page instance.
//!
//! A [`SearchSession`] ties the pieces together for one mounted search page:
//!
//! 1. A filter setter updates the [`FilterSelection`].
//! 2. The address bar is rewritten in place (no history entry).
//! 3. Pagination resets to page 1 and the result list is cleared.
//! 4. The debounce timer is re-armed; when it expires one catalog request is
//!    issued for the current selection and page.
//! 5. If that request is still the current one when it completes, its page is
//!    merged into the [`ResultSet`]; otherwise it is discarded.
//!
//! Rendering code reads [`SearchSession::results`] or waits on
//! [`SearchSession::subscribe`], and calls [`SearchSession::request_more`] from
//! its infinite-scroll trigger.
//!
//! # Examples
//!
//! ```rust,no_run
//! use kensaku::prelude::*;
//! use kensaku::catalogs::AniListCatalog;
//! use kensaku::query_string::MemoryAddressBar;
//!
//! # async fn example() -> kensaku::Result<()> {
//! let session = SearchSession::mount(
//!     AniListCatalog::new("https://api.consumet.org"),
//!     MemoryAddressBar::new("?query=frieren&genres=Fantasy"),
//!     SessionConfig::default(),
//! );
//!
//! session.set_season(Choice::Only(Season::Fall));
//!
//! let mut updates = session.subscribe();
//! while updates.borrow_and_update().loading {
//!     updates.changed().await.ok();
//! }
//! println!("{} results", session.results().items.len());
//! # Ok(())
//! # }
//! ```

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::sync::watch;

use crate::{
    catalog::Catalog,
    config::SessionConfig,
    filters::FilterSelection,
    options::{Choice, Format, Genre, Season, SortDirection, SortField, Status, Year},
    orchestrator::{FetchOrchestrator, FetchPhase, ScheduleTicket},
    pagination::Pagination,
    query_string::{AddressBar, UrlSynchronizer},
    types::AnimeSummary,
};

/// What the rendering layer sees of the accumulated results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Results loaded so far for the current filter set.
    pub items: Vec<AnimeSummary>,
    /// Whether the catalog reported more results after the last page.
    pub has_next_page: bool,
    /// A request is in flight.
    pub loading: bool,
    /// Current page number, starting at 1.
    pub page: u32,
    /// Failure message of the most recent request, if it failed.
    pub error: Option<String>,
}

impl ResultSet {
    /// First page of a new filter set is loading; show placeholders.
    pub fn is_reloading(&self) -> bool {
        self.loading && self.page == 1
    }

    /// Nothing is loading, nothing failed and nothing was found.
    pub fn is_empty_result(&self) -> bool {
        !self.loading && self.items.is_empty() && self.error.is_none()
    }
}

/// Window title for a query: `"{query} - {site}"`, or just the site name.
pub fn window_title(query: &str, site_name: &str) -> String {
    if query.is_empty() {
        site_name.to_string()
    } else {
        format!("{} - {}", query, site_name)
    }
}

struct SessionState {
    filters: FilterSelection,
    url: UrlSynchronizer,
    pagination: Pagination,
    fetch: FetchOrchestrator,
    closed: bool,
}

impl SessionState {
    fn snapshot(&self) -> ResultSet {
        ResultSet {
            items: self.pagination.items().to_vec(),
            has_next_page: self.pagination.has_next_page(),
            loading: self.fetch.loading(),
            page: self.pagination.page(),
            error: self.fetch.error().map(str::to_string),
        }
    }
}

struct Shared<C> {
    catalog: C,
    config: SessionConfig,
    state: Mutex<SessionState>,
    results: watch::Sender<ResultSet>,
}

impl<C: Catalog + 'static> Shared<C> {
    fn publish(&self, state: &SessionState) {
        self.results.send_replace(state.snapshot());
    }

    /// Starts a fresh result list for the current selection and schedules
    /// its first page.
    fn restart(this: &Arc<Self>, state: &mut SessionState) {
        state.pagination.reset();
        state.fetch.invalidate();
        Self::schedule(this, state);
        this.publish(state);
    }

    /// (Re)arms the debounce timer.
    fn schedule(this: &Arc<Self>, state: &mut SessionState) {
        let ticket = state.fetch.schedule();
        let delay = this.config.debounce();
        let weak: Weak<Self> = Arc::downgrade(this);

        let timer = tokio::spawn(async move {
            if delay.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(delay).await;
            }
            if let Some(shared) = weak.upgrade() {
                shared.dispatch(ticket).await;
            }
        });

        state.fetch.arm(ticket, timer);
        tracing::debug!(catalog = this.catalog.id(), ?delay, "fetch scheduled");
    }

    /// Issues the request for an expired timer and commits its outcome if it
    /// is still current.
    async fn dispatch(self: Arc<Self>, ticket: ScheduleTicket) {
        let (token, request) = {
            let mut state = self.state.lock();
            if state.closed || !state.fetch.fire(ticket) {
                return;
            }
            let page = state.pagination.page();
            let request = state.filters.to_request(page, self.config.page_size);
            let token = state.fetch.issue(page);
            self.publish(&state);
            (token, request)
        };

        tracing::debug!(
            catalog = self.catalog.id(),
            token = token.get(),
            page = request.page,
            query = %request.query,
            "issuing catalog request"
        );
        let outcome = self.catalog.advanced_search(&request).await;

        let mut state = self.state.lock();
        let Some(page) = state.fetch.settle(token) else {
            tracing::debug!(token = token.get(), "discarding stale response");
            return;
        };

        match outcome {
            Ok(response) => {
                tracing::debug!(
                    token = token.get(),
                    page,
                    results = response.results.len(),
                    has_next_page = response.has_next_page,
                    "committing response"
                );
                state.pagination.merge_response(page, response);
            }
            Err(e) => {
                tracing::warn!(
                    catalog = self.catalog.id(),
                    page,
                    query = %request.query,
                    error = %e,
                    "catalog request failed"
                );
                state.pagination.rewind(page);
                state.fetch.fail(e.to_string());
            }
        }
        self.publish(&state);
    }
}

/// One mounted search page.
///
/// All methods take `&self`; state transitions are serialized internally.
/// Dropping the session unmounts it (see [`close`](SearchSession::close)).
pub struct SearchSession<C: Catalog + 'static> {
    shared: Arc<Shared<C>>,
}

impl<C: Catalog + 'static> SearchSession<C> {
    /// Mounts a session: decodes the selection from the address bar, writes
    /// its canonical form back and schedules the first page.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mount(
        catalog: C,
        address_bar: impl AddressBar + 'static,
        config: SessionConfig,
    ) -> Self {
        let mut url = UrlSynchronizer::new(address_bar);
        let filters = url.read();
        url.write(&filters);

        let state = SessionState {
            filters,
            url,
            pagination: Pagination::new(config.max_page),
            fetch: FetchOrchestrator::new(),
            closed: false,
        };
        let (results, _) = watch::channel(state.snapshot());

        let shared = Arc::new(Shared {
            catalog,
            config,
            state: Mutex::new(state),
            results,
        });

        {
            let mut state = shared.state.lock();
            Shared::schedule(&shared, &mut state);
        }
        tracing::debug!(catalog = shared.catalog.id(), "search session mounted");

        Self { shared }
    }

    /// Applies `edit` to the selection as one change.
    ///
    /// If anything changed, the address bar is rewritten, pagination restarts
    /// and one fetch is scheduled. Returns whether anything changed.
    pub fn update<F>(&self, edit: F) -> bool
    where
        F: FnOnce(&mut FilterSelection),
    {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        if state.closed {
            tracing::debug!("ignoring filter change on a closed session");
            return false;
        }

        let change = state.filters.update(edit);
        if !change.any() {
            return false;
        }

        state.url.write(&state.filters);
        Shared::restart(&self.shared, state);
        true
    }

    pub fn set_query(&self, query: impl Into<String>) -> bool {
        let query = query.into();
        self.update(|f| {
            f.set_query(query);
        })
    }

    pub fn set_genres(&self, genres: impl IntoIterator<Item = Genre>) -> bool {
        self.update(|f| {
            f.set_genres(genres);
        })
    }

    pub fn toggle_genre(&self, genre: Genre) -> bool {
        self.update(|f| {
            f.toggle_genre(genre);
        })
    }

    pub fn set_year(&self, year: Choice<Year>) -> bool {
        self.update(|f| {
            f.set_year(year);
        })
    }

    pub fn set_season(&self, season: Choice<Season>) -> bool {
        self.update(|f| {
            f.set_season(season);
        })
    }

    pub fn set_format(&self, format: Choice<Format>) -> bool {
        self.update(|f| {
            f.set_format(format);
        })
    }

    pub fn set_status(&self, status: Choice<Status>) -> bool {
        self.update(|f| {
            f.set_status(status);
        })
    }

    pub fn set_sort_field(&self, field: SortField) -> bool {
        self.update(|f| {
            f.set_sort_field(field);
        })
    }

    pub fn set_sort_direction(&self, direction: SortDirection) -> bool {
        self.update(|f| {
            f.set_sort_direction(direction);
        })
    }

    /// Restores every filter and the sort order to defaults; keeps the query.
    pub fn reset_filters(&self) -> bool {
        self.update(|f| {
            f.reset();
        })
    }

    /// Loads the next page, unless the cap is reached or a load is pending.
    ///
    /// Returns whether a new page was scheduled.
    pub fn request_more(&self) -> bool {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        if state.closed {
            return false;
        }

        let busy = state.fetch.is_busy();
        if !state.pagination.request_more(busy) {
            tracing::debug!(
                page = state.pagination.page(),
                busy,
                "load more ignored"
            );
            return false;
        }

        Shared::schedule(&self.shared, state);
        self.shared.publish(state);
        true
    }

    /// Picks up an external change of the address bar's `query` parameter
    /// (back/forward navigation, an opened link).
    ///
    /// The new query replaces the in-memory one and restarts the search. The
    /// address bar is then rewritten from the whole selection, so filters that
    /// survive the change stay visible in it; the next call finds the queries
    /// equal and does nothing. Returns whether the query changed.
    pub fn sync_from_address_bar(&self) -> bool {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        if state.closed {
            return false;
        }

        let Some(query) = state.url.external_query(state.filters.query()) else {
            return false;
        };
        tracing::debug!(%query, "query changed in the address bar");

        state.filters.set_query(query);
        state.url.write(&state.filters);
        Shared::restart(&self.shared, state);
        true
    }

    /// Unmounts the session: cancels the pending timer and makes any in-flight
    /// response stale. Later setters are ignored.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.fetch.cancel_pending();
        state.fetch.invalidate();
        self.shared.publish(&state);
        tracing::debug!(catalog = self.shared.catalog.id(), "search session closed");
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// A copy of the current selection.
    pub fn filters(&self) -> FilterSelection {
        self.shared.state.lock().filters.clone()
    }

    pub fn query(&self) -> String {
        self.shared.state.lock().filters.query().to_string()
    }

    pub fn page(&self) -> u32 {
        self.shared.state.lock().pagination.page()
    }

    /// Whether showing a "load more" trigger makes sense right now.
    pub fn can_request_more(&self) -> bool {
        let state = self.shared.state.lock();
        !state.fetch.is_busy() && state.pagination.can_request_more()
    }

    pub fn phase(&self) -> FetchPhase {
        self.shared.state.lock().fetch.phase()
    }

    /// Number of catalog requests issued since mount.
    pub fn requests_issued(&self) -> u64 {
        self.shared.state.lock().fetch.issued()
    }

    pub fn results(&self) -> ResultSet {
        self.shared.state.lock().snapshot()
    }

    /// Receiver notified after every state transition.
    pub fn subscribe(&self) -> watch::Receiver<ResultSet> {
        self.shared.results.subscribe()
    }

    pub fn window_title(&self) -> String {
        let state = self.shared.state.lock();
        window_title(state.filters.query(), &self.shared.config.site_name)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    pub fn catalog(&self) -> &C {
        &self.shared.catalog
    }
}

impl<C: Catalog + 'static> Drop for SearchSession<C> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<C: Catalog + 'static> std::fmt::Debug for SearchSession<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("SearchSession")
            .field("catalog", &self.shared.catalog.id())
            .field("filters", &state.filters)
            .field("page", &state.pagination.page())
            .field("phase", &state.fetch.phase())
            .field("closed", &state.closed)
            .finish()
    }
}
