//! Integration tests for Kensaku
//!
//! End-to-end tests that drive a mounted search session against in-memory
//! catalogs with Tokio's paused clock.

use kensaku::orchestrator::FetchPhase;
use kensaku::prelude::*;
use kensaku::query_string::{AddressBar, MemoryAddressBar, decode};
use std::time::Duration;
use tokio::time::sleep;

// Import test utilities from mod
mod common;
use common::{GatedCatalog, PagedCatalog, TEST_DEBOUNCE_MS, anime, config, ids, settle};

#[cfg(test)]
mod mount_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_mount_decodes_address_bar_and_fetches() {
        let catalog = GatedCatalog::new();
        let bar = MemoryAddressBar::new("?query=naruto&genres=Action,Comedy&year=2002&format=TV");
        let session = SearchSession::mount(catalog.clone(), bar.clone(), config(0));

        let filters = session.filters();
        assert_eq!(filters.query(), "naruto");
        assert_eq!(filters.genres(), &[Genre::Action, Genre::Comedy]);
        assert_eq!(filters.year(), Choice::Only(Year::new(2002).unwrap()));
        assert_eq!(filters.format(), Choice::Only(Format::Tv));
        assert!(filters.season().is_any());
        assert_eq!(session.phase(), FetchPhase::Scheduled);

        // Canonical form is written back in place
        assert_eq!(
            bar.query_string(),
            "query=naruto&genres=Action%2CComedy&year=2002&format=TV"
        );
        assert_eq!(bar.history_len(), 1);

        settle().await;
        let call = catalog.next_call();
        assert_eq!(call.request.query, "naruto");
        assert_eq!(call.request.page, 1);
        assert_eq!(call.request.page_size, 17);
        assert_eq!(call.request.filters.genres, vec!["Action", "Comedy"]);
        assert_eq!(call.request.filters.year.as_deref(), Some("2002"));
        assert_eq!(call.request.filters.format.as_deref(), Some("TV"));
        assert_eq!(call.request.filters.season, None);
        assert_eq!(call.request.sort(), Some("POPULARITY_DESC"));
        assert!(session.results().is_reloading());

        call.respond(SearchResponse::new(vec![anime("a"), anime("b")], true));
        settle().await;

        let results = session.results();
        assert_eq!(ids(&results), vec!["a", "b"]);
        assert!(!results.loading);
        assert!(results.has_next_page);
        assert_eq!(results.page, 1);
        assert_eq!(session.phase(), FetchPhase::Idle);
        assert!(session.can_request_more());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_with_empty_address_bar() {
        let catalog = PagedCatalog::new(0, 1);
        let bar = MemoryAddressBar::default();
        let session = SearchSession::mount(catalog.clone(), bar.clone(), config(0));

        assert!(session.filters().is_default());
        assert_eq!(bar.query_string(), "query=");

        settle().await;
        let results = session.results();
        assert!(results.is_empty_result());
        assert!(!session.can_request_more());
        assert_eq!(catalog.requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_ignores_unknown_values() {
        let catalog = PagedCatalog::new(1, 1);
        let bar = MemoryAddressBar::new("query=x&genres=Action,Nope&season=MONSOON&year=abc");
        let session = SearchSession::mount(catalog, bar.clone(), config(0));

        let filters = session.filters();
        assert_eq!(filters.genres(), &[Genre::Action]);
        assert!(filters.season().is_any());
        assert!(filters.year().is_any());
        assert_eq!(bar.query_string(), "query=x&genres=Action");
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_title_follows_query() {
        let session = SearchSession::mount(
            PagedCatalog::new(1, 1),
            MemoryAddressBar::new("?query=naruto"),
            config(0),
        );
        assert_eq!(session.window_title(), "naruto - Miruro");

        session.set_query("");
        assert_eq!(session.window_title(), "Miruro");
    }
}

#[cfg(test)]
mod debounce_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_edits_issues_one_request() {
        let catalog = PagedCatalog::new(3, 5);
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::default(),
            config(TEST_DEBOUNCE_MS),
        );

        sleep(Duration::from_millis(100)).await;
        session.set_query("o");
        sleep(Duration::from_millis(100)).await;
        session.set_query("on");
        sleep(Duration::from_millis(100)).await;
        session.set_query("one");
        assert!(catalog.requests().is_empty());

        sleep(Duration::from_millis(TEST_DEBOUNCE_MS - 1)).await;
        assert!(catalog.requests().is_empty());
        assert_eq!(session.phase(), FetchPhase::Scheduled);

        sleep(Duration::from_millis(2)).await;
        let requests = catalog.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].query, "one");
        assert_eq!(session.requests_issued(), 1);
        assert_eq!(ids(&session.results()), vec!["one-1-0", "one-1-1", "one-1-2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_debounce_coalesces_synchronous_edits() {
        let catalog = PagedCatalog::new(1, 1);
        let session = SearchSession::mount(catalog.clone(), MemoryAddressBar::default(), config(0));
        settle().await;
        assert_eq!(catalog.requests().len(), 1);

        session.set_genres([Genre::Action, Genre::Drama]);
        session.set_year(Choice::Only(Year::new(2013).unwrap()));
        session.set_status(Choice::Only(Status::Finished));
        settle().await;

        let requests = catalog.requests();
        assert_eq!(requests.len(), 2);
        let last = &requests[1];
        assert_eq!(last.filters.genres, vec!["Action", "Drama"]);
        assert_eq!(last.filters.year.as_deref(), Some("2013"));
        assert_eq!(last.filters.status.as_deref(), Some("FINISHED"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_applies_edits_as_one_change() {
        let catalog = PagedCatalog::new(1, 1);
        let bar = MemoryAddressBar::default();
        let session = SearchSession::mount(catalog.clone(), bar.clone(), config(0));
        settle().await;
        let replacements = bar.replacements();

        let changed = session.update(|f| {
            f.set_query("frieren");
            f.set_season(Choice::Only(Season::Fall));
            f.set_format(Choice::Only(Format::Tv));
        });
        assert!(changed);
        assert_eq!(bar.replacements(), replacements + 1);
        assert_eq!(bar.query_string(), "query=frieren&season=FALL&format=TV");

        settle().await;
        assert_eq!(catalog.requests().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unchanged_setter_does_not_refetch() {
        let catalog = PagedCatalog::new(1, 1);
        let bar = MemoryAddressBar::new("query=x");
        let session = SearchSession::mount(catalog.clone(), bar.clone(), config(0));
        settle().await;

        assert!(!session.set_query("x"));
        assert!(!session.set_year(Choice::Any));
        assert!(!session.set_sort_direction(SortDirection::Desc));
        assert!(!session.reset_filters());
        settle().await;

        assert_eq!(catalog.requests().len(), 1);
        assert_eq!(bar.replacements(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sort_change_refetches_without_touching_address_bar() {
        let catalog = PagedCatalog::new(1, 1);
        let bar = MemoryAddressBar::new("query=x");
        let session = SearchSession::mount(catalog.clone(), bar.clone(), config(0));
        settle().await;

        assert!(session.set_sort_field(SortField::Score));
        assert!(session.set_sort_direction(SortDirection::Asc));
        settle().await;

        let requests = catalog.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].sort(), Some("SCORE_ASC"));
        assert_eq!(bar.query_string(), "query=x");
        assert_eq!(bar.replacements(), 0);
    }
}

#[cfg(test)]
mod staleness_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_older_response_arriving_last_is_discarded() {
        let catalog = GatedCatalog::new();
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::new("query=a"),
            config(0),
        );
        settle().await;
        let first = catalog.next_call();

        session.set_query("b");
        settle().await;
        let second = catalog.next_call();
        assert_eq!(second.request.query, "b");

        second.respond(SearchResponse::new(vec![anime("b1")], false));
        settle().await;
        assert_eq!(ids(&session.results()), vec!["b1"]);

        first.respond(SearchResponse::new(vec![anime("a1")], true));
        settle().await;
        let results = session.results();
        assert_eq!(ids(&results), vec!["b1"]);
        assert!(!results.has_next_page);
        assert!(!results.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_response_arriving_first_is_discarded() {
        let catalog = GatedCatalog::new();
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::new("query=a"),
            config(0),
        );
        settle().await;
        let first = catalog.next_call();

        session.set_query("b");
        settle().await;
        let second = catalog.next_call();

        first.respond(SearchResponse::new(vec![anime("a1")], true));
        settle().await;
        let results = session.results();
        assert!(results.items.is_empty());
        assert!(results.loading);

        second.respond(SearchResponse::new(vec![anime("b1")], false));
        settle().await;
        assert_eq!(ids(&session.results()), vec!["b1"]);
        assert!(!session.results().loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_page_response_after_filter_change_is_discarded() {
        let catalog = GatedCatalog::new();
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::new("query=a"),
            config(0),
        );
        settle().await;
        catalog
            .next_call()
            .respond(SearchResponse::new(vec![anime("a1")], true));
        settle().await;

        assert!(session.request_more());
        settle().await;
        let page_two = catalog.next_call();
        assert_eq!(page_two.request.page, 2);

        session.set_query("b");
        assert_eq!(session.page(), 1);
        assert!(session.results().items.is_empty());
        settle().await;
        let fresh = catalog.next_call();
        assert_eq!(fresh.request.page, 1);

        page_two.respond(SearchResponse::new(vec![anime("a2")], true));
        fresh.respond(SearchResponse::new(vec![anime("b1")], false));
        settle().await;
        assert_eq!(ids(&session.results()), vec!["b1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_makes_in_flight_response_stale() {
        let catalog = GatedCatalog::new();
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::new("query=a&genres=Action"),
            config(TEST_DEBOUNCE_MS),
        );
        sleep(Duration::from_millis(TEST_DEBOUNCE_MS + 1)).await;
        let first = catalog.next_call();

        assert!(session.reset_filters());
        assert!(!session.results().loading);

        // Still inside the quiet period of the reset
        first.respond(SearchResponse::new(vec![anime("old")], true));
        settle().await;
        assert!(session.results().items.is_empty());
        assert_eq!(session.phase(), FetchPhase::Scheduled);
    }
}

#[cfg(test)]
mod pagination_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_pages_accumulate_in_order() {
        let catalog = PagedCatalog::new(2, 3);
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::new("query=q"),
            config(0),
        );
        settle().await;

        while session.can_request_more() {
            assert!(session.request_more());
            settle().await;
        }

        let results = session.results();
        assert_eq!(
            ids(&results),
            vec!["q-1-0", "q-1-1", "q-2-0", "q-2-1", "q-3-0", "q-3-1"]
        );
        assert!(!results.has_next_page);
        assert_eq!(results.page, 3);

        let pages: Vec<u32> = catalog.requests().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_page_number_never_exceeds_cap() {
        let catalog = PagedCatalog::new(1, 100);
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::new("query=q"),
            config(0),
        );
        settle().await;

        for _ in 0..20 {
            session.request_more();
            settle().await;
        }

        assert_eq!(session.page(), 10);
        assert!(!session.can_request_more());
        assert!(!session.request_more());

        let requests = catalog.requests();
        assert_eq!(requests.len(), 10);
        assert!(requests.iter().all(|r| r.page <= 10));
        assert_eq!(session.results().items.len(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_configured_page_cap() {
        let catalog = PagedCatalog::new(1, 100);
        let config = SessionConfig::builder().max_page(3u32).build().unwrap();
        let session = SearchSession::mount(catalog.clone(), MemoryAddressBar::default(), config);
        settle().await;

        for _ in 0..5 {
            session.request_more();
            settle().await;
        }
        assert_eq!(session.page(), 3);
        assert_eq!(catalog.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_more_ignored_while_load_pending() {
        let catalog = GatedCatalog::new();
        let session = SearchSession::mount(catalog.clone(), MemoryAddressBar::default(), config(0));

        // Scheduled
        assert!(!session.request_more());
        settle().await;

        // In flight
        assert_eq!(session.phase(), FetchPhase::InFlight);
        assert!(!session.request_more());
        assert_eq!(session.page(), 1);

        catalog
            .next_call()
            .respond(SearchResponse::new(vec![anime("a")], true));
        settle().await;

        assert!(session.request_more());
        assert!(!session.request_more());
        assert_eq!(session.page(), 2);
        assert!(!session.results().is_reloading());
        assert!(!session.results().loading);

        settle().await;
        let call = catalog.next_call();
        assert_eq!(call.request.page, 2);
        assert_eq!(catalog.pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_change_resets_results() {
        let catalog = PagedCatalog::new(2, 5);
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::new("query=x"),
            config(0),
        );
        settle().await;
        session.request_more();
        settle().await;
        assert_eq!(session.results().items.len(), 4);
        assert_eq!(session.page(), 2);

        session.set_query("y");
        let results = session.results();
        assert!(results.items.is_empty());
        assert_eq!(results.page, 1);
        assert!(!results.has_next_page);

        settle().await;
        assert_eq!(ids(&session.results()), vec!["y-1-0", "y-1-1"]);
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_loaded_results() {
        let catalog = PagedCatalog::new(2, 5);
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::new("query=x"),
            config(0),
        );
        settle().await;

        catalog.set_failing(true);
        session.request_more();
        settle().await;

        let results = session.results();
        assert_eq!(ids(&results), vec!["x-1-0", "x-1-1"]);
        assert!(!results.loading);
        assert!(results.error.as_deref().unwrap().contains("503"));
        assert_eq!(session.phase(), FetchPhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_page_is_requested_again() {
        let catalog = PagedCatalog::new(2, 5);
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::new("query=x"),
            config(0),
        );
        settle().await;

        catalog.set_failing(true);
        assert!(session.request_more());
        settle().await;
        assert_eq!(session.page(), 1);
        assert!(session.can_request_more());

        catalog.set_failing(false);
        assert!(session.request_more());
        settle().await;

        let pages: Vec<u32> = catalog.requests().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2, 2]);
        assert_eq!(
            ids(&session.results()),
            vec!["x-1-0", "x-1-1", "x-2-0", "x-2-1"]
        );
        assert!(session.results().error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_filter_change_clears_error_before_refetch() {
        let catalog = GatedCatalog::new();
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::default(),
            config(TEST_DEBOUNCE_MS),
        );
        sleep(Duration::from_millis(TEST_DEBOUNCE_MS + 1)).await;
        catalog.next_call().fail("HTTP 500");
        settle().await;
        assert!(session.results().error.is_some());

        session.set_query("other");
        let results = session.results();
        assert!(results.error.is_none());
        assert!(results.items.is_empty());
        assert_eq!(session.phase(), FetchPhase::Scheduled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_request_clears_error() {
        let catalog = GatedCatalog::new();
        let session = SearchSession::mount(catalog.clone(), MemoryAddressBar::default(), config(0));
        settle().await;
        catalog.next_call().fail("HTTP 500");
        settle().await;
        assert!(session.results().error.is_some());
        assert!(!session.results().is_empty_result());

        session.set_query("retry");
        settle().await;
        assert!(session.results().error.is_none());
        assert!(session.results().loading);

        catalog
            .next_call()
            .respond(SearchResponse::new(Vec::new(), false));
        settle().await;
        assert!(session.results().is_empty_result());
    }
}

#[cfg(test)]
mod address_bar_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_changes_replace_address_bar_without_history() {
        let catalog = PagedCatalog::new(1, 1);
        let bar = MemoryAddressBar::new("?query=a");
        let session = SearchSession::mount(catalog, bar.clone(), config(0));
        assert_eq!(bar.replacements(), 0);

        session.set_query("b");
        session.set_genres([Genre::Action]);
        session.toggle_genre(Genre::SliceOfLife);

        assert_eq!(bar.history_len(), 1);
        assert_eq!(bar.replacements(), 3);
        assert_eq!(bar.query_string(), "query=b&genres=Action%2CSlice+of+Life");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_filters_keeps_query() {
        let catalog = PagedCatalog::new(1, 1);
        let bar = MemoryAddressBar::new("?query=naruto&genres=Action&year=2002");
        let session = SearchSession::mount(catalog.clone(), bar.clone(), config(0));
        settle().await;

        assert!(session.reset_filters());
        let filters = session.filters();
        assert_eq!(filters.query(), "naruto");
        assert!(filters.genres().is_empty());
        assert!(filters.year().is_any());
        assert_eq!(bar.query_string(), "query=naruto");

        settle().await;
        let requests = catalog.requests();
        let last = requests.last().unwrap();
        assert_eq!(last.query, "naruto");
        assert!(last.filters.genres.is_empty());
        assert_eq!(last.filters.year, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_query_change_restarts_search() {
        let catalog = PagedCatalog::new(1, 1);
        let bar = MemoryAddressBar::new("query=a");
        let session = SearchSession::mount(catalog.clone(), bar.clone(), config(0));
        settle().await;
        assert!(!session.sync_from_address_bar());

        bar.navigate("query=b");
        assert!(session.sync_from_address_bar());
        assert_eq!(session.query(), "b");
        assert_eq!(bar.replacements(), 0);
        assert_eq!(bar.query_string(), "query=b");

        settle().await;
        assert_eq!(catalog.requests().last().unwrap().query, "b");
        assert!(!session.sync_from_address_bar());

        assert!(bar.back());
        assert!(session.sync_from_address_bar());
        assert_eq!(session.query(), "a");
        settle().await;

        assert_eq!(catalog.requests().len(), 3);
        assert_eq!(bar.history_len(), 2);
        assert_eq!(bar.replacements(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_external_query_change_keeps_filters_in_address_bar() {
        let catalog = PagedCatalog::new(1, 1);
        let bar = MemoryAddressBar::new("query=a");
        let session = SearchSession::mount(catalog.clone(), bar.clone(), config(0));
        session.set_genres([Genre::Horror]);
        settle().await;
        assert_eq!(bar.query_string(), "query=a&genres=Horror");

        bar.navigate("query=b");
        assert!(session.sync_from_address_bar());
        assert_eq!(bar.query_string(), "query=b&genres=Horror");
        assert_eq!(decode(&bar.query_string()), session.filters());
        assert_eq!(bar.history_len(), 2);

        // The rewritten address bar decodes to the same query
        assert!(!session.sync_from_address_bar());
        settle().await;

        let last = catalog.requests().last().cloned().unwrap();
        assert_eq!(last.query, "b");
        assert_eq!(last.filters.genres, vec!["Horror"]);
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_close_discards_in_flight_response() {
        let catalog = GatedCatalog::new();
        let session = SearchSession::mount(catalog.clone(), MemoryAddressBar::default(), config(0));
        settle().await;
        let call = catalog.next_call();

        session.close();
        assert!(session.is_closed());
        assert!(!session.results().loading);

        call.respond(SearchResponse::new(vec![anime("late")], true));
        settle().await;
        assert!(session.results().items.is_empty());

        assert!(!session.set_query("ignored"));
        assert!(!session.request_more());
        settle().await;
        assert_eq!(catalog.pending_len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_cancels_pending_timer() {
        let catalog = PagedCatalog::new(1, 1);
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::default(),
            config(TEST_DEBOUNCE_MS),
        );
        session.close();
        assert_eq!(session.phase(), FetchPhase::Idle);

        sleep(Duration::from_millis(TEST_DEBOUNCE_MS * 2)).await;
        assert!(catalog.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_unmounts_session() {
        let catalog = PagedCatalog::new(1, 1);
        let session = SearchSession::mount(
            catalog.clone(),
            MemoryAddressBar::default(),
            config(TEST_DEBOUNCE_MS),
        );
        drop(session);

        sleep(Duration::from_millis(TEST_DEBOUNCE_MS * 2)).await;
        assert!(catalog.requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_each_transition() {
        let catalog = GatedCatalog::new();
        let session = SearchSession::mount(catalog.clone(), MemoryAddressBar::default(), config(0));
        let mut updates = session.subscribe();

        settle().await;
        assert!(updates.has_changed().unwrap());
        assert!(updates.borrow_and_update().loading);

        catalog
            .next_call()
            .respond(SearchResponse::new(vec![anime("a")], false));
        updates.changed().await.unwrap();

        let results = updates.borrow_and_update().clone();
        assert!(!results.loading);
        assert_eq!(ids(&results), vec!["a"]);
        assert_eq!(results, session.results());
    }
}
