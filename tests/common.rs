//! Common test utilities
//!
//! In-memory catalogs and helpers shared by the integration tests.
// Common test utilities - all must be public

use async_trait::async_trait;
use kensaku::prelude::*;
use kensaku::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

#[allow(dead_code)]
pub const TEST_DEBOUNCE_MS: u64 = 300;

/// Lets every runnable task make progress without firing pending timers.
#[allow(dead_code)]
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

#[allow(dead_code)]
pub fn anime(id: &str) -> AnimeSummary {
    AnimeSummary::new(id, id.to_uppercase())
}

#[allow(dead_code)]
pub fn ids(results: &ResultSet) -> Vec<String> {
    results.items.iter().map(|a| a.id.clone()).collect()
}

#[allow(dead_code)]
pub fn config(debounce_ms: u64) -> SessionConfig {
    SessionConfig::builder()
        .debounce_ms(debounce_ms)
        .build()
        .unwrap()
}

/// A request waiting for the test to answer it.
pub struct PendingCall {
    pub request: SearchRequest,
    reply: oneshot::Sender<Result<SearchResponse>>,
}

impl PendingCall {
    #[allow(dead_code)]
    pub fn respond(self, response: SearchResponse) {
        let _ = self.reply.send(Ok(response));
    }

    #[allow(dead_code)]
    pub fn fail(self, message: &str) {
        let _ = self.reply.send(Err(Error::catalog("gated", message)));
    }
}

/// Catalog whose calls block until the test answers them, in any order.
#[derive(Clone, Default)]
pub struct GatedCatalog {
    pending: Arc<Mutex<Vec<PendingCall>>>,
}

impl GatedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns the oldest unanswered call.
    #[allow(dead_code)]
    pub fn next_call(&self) -> PendingCall {
        let mut pending = self.pending.lock();
        assert!(!pending.is_empty(), "no catalog call is pending");
        pending.remove(0)
    }

    #[allow(dead_code)]
    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }
}

#[async_trait]
impl Catalog for GatedCatalog {
    fn id(&self) -> &str {
        "gated"
    }

    async fn advanced_search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let (reply, answer) = oneshot::channel();
        self.pending.lock().push(PendingCall {
            request: request.clone(),
            reply,
        });
        answer
            .await
            .unwrap_or_else(|_| Err(Error::Other("call abandoned".to_string())))
    }
}

/// Catalog that answers immediately with `per_page` hits per page and reports
/// more pages until `total_pages`.
#[derive(Clone)]
pub struct PagedCatalog {
    per_page: usize,
    total_pages: u32,
    failing: Arc<Mutex<bool>>,
    requests: Arc<Mutex<Vec<SearchRequest>>>,
}

impl PagedCatalog {
    pub fn new(per_page: usize, total_pages: u32) -> Self {
        Self {
            per_page,
            total_pages,
            failing: Arc::new(Mutex::new(false)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every request seen so far, in issue order.
    #[allow(dead_code)]
    pub fn requests(&self) -> Vec<SearchRequest> {
        self.requests.lock().clone()
    }

    #[allow(dead_code)]
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock() = failing;
    }
}

#[async_trait]
impl Catalog for PagedCatalog {
    fn id(&self) -> &str {
        "paged"
    }

    async fn advanced_search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        self.requests.lock().push(request.clone());
        if *self.failing.lock() {
            return Err(Error::catalog("paged", "HTTP 503 Service Unavailable"));
        }

        let results = (0..self.per_page)
            .map(|i| anime(&format!("{}-{}-{}", request.query, request.page, i)))
            .collect();
        Ok(SearchResponse::new(results, request.page < self.total_pages))
    }
}
