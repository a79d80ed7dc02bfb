//! Debounce and staleness bookkeeping for catalog fetches.
//!
//! [`FetchOrchestrator`] is the state machine behind a session's request
//! pipeline:
//!
//! ```text
//! Idle ──schedule──▶ Scheduled ──fire──▶ InFlight ──settle──▶ Idle
//!                      ▲    │                │
//!                      └────┘ reschedule     └─ invalidate: response discarded
//! ```
//!
//! It owns the pending debounce timer (an abortable Tokio task) and hands out
//! monotonically increasing [`RequestToken`]s. A response may only be committed
//! if its token is still the current one; issuing a newer request, resetting
//! the filter set or closing the session all make older tokens stale.
//!
//! The orchestrator never awaits anything itself. Spawning the timer and
//! calling the catalog is the session's job, which keeps these rules testable
//! without a runtime.

use tokio::task::JoinHandle;

/// Identifies one issued catalog request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Identifies one arming of the debounce timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTicket(u64);

/// Coarse pipeline state, as seen by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// Nothing pending.
    Idle,
    /// The debounce timer is armed.
    Scheduled,
    /// A request is waiting for its response.
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlight {
    token: RequestToken,
    page: u32,
}

/// Single-flight request bookkeeping for one session.
#[derive(Debug, Default)]
pub struct FetchOrchestrator {
    timer: Option<JoinHandle<()>>,
    armed: Option<ScheduleTicket>,
    tickets: u64,
    tokens: u64,
    in_flight: Option<InFlight>,
    loading: bool,
    error: Option<String>,
    issued: u64,
}

impl FetchOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> FetchPhase {
        if self.armed.is_some() {
            FetchPhase::Scheduled
        } else if self.in_flight.is_some() {
            FetchPhase::InFlight
        } else {
            FetchPhase::Idle
        }
    }

    /// `true` while a fetch is scheduled or in flight.
    pub fn is_busy(&self) -> bool {
        self.phase() != FetchPhase::Idle
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    /// Message of the last failed request, cleared when the next one is issued
    /// or the filter set is invalidated.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Total number of requests issued so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Cancels any pending timer and enters `Scheduled` with a fresh ticket.
    pub fn schedule(&mut self) -> ScheduleTicket {
        self.cancel_pending();
        self.tickets += 1;
        let ticket = ScheduleTicket(self.tickets);
        self.armed = Some(ticket);
        ticket
    }

    /// Stores the timer task for `ticket`. A timer for a superseded ticket is
    /// aborted straight away.
    pub fn arm(&mut self, ticket: ScheduleTicket, timer: JoinHandle<()>) {
        if self.armed == Some(ticket) {
            self.timer = Some(timer);
        } else {
            timer.abort();
        }
    }

    /// Aborts the pending timer, if any. Returns whether one was pending.
    pub fn cancel_pending(&mut self) -> bool {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.armed.take().is_some()
    }

    /// Called by an expired timer. Returns `false` if the ticket was
    /// superseded or cancelled in the meantime, in which case nothing may be
    /// issued.
    pub fn fire(&mut self, ticket: ScheduleTicket) -> bool {
        if self.armed != Some(ticket) {
            return false;
        }
        self.armed = None;
        // The timer task is the caller; dropping the handle detaches it so a
        // later cancel cannot abort the request it is about to make.
        self.timer = None;
        true
    }

    /// Issues a request for `page`: the new token becomes the only one whose
    /// response may be committed.
    pub fn issue(&mut self, page: u32) -> RequestToken {
        self.tokens += 1;
        self.issued += 1;
        let token = RequestToken(self.tokens);
        self.in_flight = Some(InFlight { token, page });
        self.loading = true;
        self.error = None;
        token
    }

    /// Makes every outstanding token stale without issuing a new request.
    ///
    /// The recorded failure belonged to the abandoned requests and is cleared
    /// with them.
    pub fn invalidate(&mut self) {
        self.tokens += 1;
        self.in_flight = None;
        self.loading = false;
        self.error = None;
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.in_flight.is_some_and(|f| f.token == token)
    }

    /// Completes the request identified by `token`.
    ///
    /// Returns the page it was issued for, or `None` if the token is stale
    /// and its response must be discarded.
    pub fn settle(&mut self, token: RequestToken) -> Option<u32> {
        let in_flight = self.in_flight.filter(|f| f.token == token)?;
        self.in_flight = None;
        self.loading = false;
        Some(in_flight.page)
    }

    /// Records the failure of the request that was just settled.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }
}

impl Drop for FetchOrchestrator {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
