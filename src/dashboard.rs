//! Async coordinator that runs ingestion cycles against a [`Session`].
//!
//! Each mutation that changes the filter spawns one cycle. The session lock
//! is only held for the synchronous bookkeeping, never across the fetch.
//! Committed generations are announced on a broadcast channel.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::errors::QuakeError;
use crate::feed::{FeedSource, FeedWindow};
use crate::ingest::{self, EventCollection};
use crate::presentation::DashboardView;
use crate::state::{CycleOutcome, CycleRequest, FilterState, Generation, Session};

/// Buffered commit notifications per subscriber.
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Shared handle to the session and the feed it pulls from.
pub struct Dashboard {
    session: Mutex<Session>,
    source: Arc<dyn FeedSource>,
    cycle_timeout: Duration,
    updates: broadcast::Sender<Generation>,
}

impl Dashboard {
    #[must_use]
    pub fn new(
        source: Arc<dyn FeedSource>,
        filter: FilterState,
        cycle_timeout: Duration,
    ) -> Arc<Self> {
        let (updates, _rx) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Arc::new(Self {
            session: Mutex::new(Session::with_filter(filter)),
            source,
            cycle_timeout,
            updates,
        })
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        // Session updates are single assignments; a poisoned lock still holds consistent state.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to committed generations.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Generation> {
        self.updates.subscribe()
    }

    #[must_use]
    pub fn filter(&self) -> FilterState {
        self.session().filter()
    }

    /// Latest issued generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.session().generation()
    }

    /// Current collection.
    #[must_use]
    pub fn events(&self) -> Arc<EventCollection> {
        self.session().events()
    }

    /// Snapshot for one render.
    #[must_use]
    pub fn view(&self) -> DashboardView {
        let session = self.session();
        DashboardView::new(
            session.filter(),
            session.generation(),
            session.is_loading(),
            session.last_error().map(str::to_string),
            &session.events(),
        )
    }

    /// Start a cycle for the current filter.
    pub fn refresh(self: &Arc<Self>) -> JoinHandle<CycleOutcome> {
        let request = self.session().refresh();
        self.spawn_cycle(request)
    }

    /// Change the time window; starts a cycle only if it changed.
    pub fn set_time_window(
        self: &Arc<Self>,
        window: FeedWindow,
    ) -> Option<JoinHandle<CycleOutcome>> {
        let request = self.session().set_time_window(window)?;
        Some(self.spawn_cycle(request))
    }

    /// Change the magnitude threshold; starts a cycle only if it changed.
    pub fn set_min_magnitude(
        self: &Arc<Self>,
        min_magnitude: f64,
    ) -> Option<JoinHandle<CycleOutcome>> {
        let request = self.session().set_min_magnitude(min_magnitude)?;
        Some(self.spawn_cycle(request))
    }

    fn spawn_cycle(self: &Arc<Self>, request: CycleRequest) -> JoinHandle<CycleOutcome> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_cycle(request).await })
    }

    async fn run_cycle(&self, request: CycleRequest) -> CycleOutcome {
        let fetch = ingest::ingest(
            self.source.as_ref(),
            request.filter.window,
            request.filter.min_magnitude,
        );
        let result = tokio::time::timeout(self.cycle_timeout, fetch)
            .await
            .unwrap_or_else(|_| Err(QuakeError::Timeout(self.cycle_timeout)));

        let outcome = self.session().complete(&request, result);
        if outcome == CycleOutcome::Committed {
            // No subscribers is fine.
            let _ = self.updates.send(request.generation);
        }
        outcome
    }
}
