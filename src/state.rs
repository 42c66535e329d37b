//! Parameter state holder.
//!
//! [`Session`] owns the filter, the current collection and the generation
//! counter. Mutators hand out a [`CycleRequest`] carrying a snapshot of the
//! filter and a fresh generation; [`Session::complete`] commits a result only
//! if its generation is still the latest one issued, so a slow superseded
//! fetch can never overwrite newer state.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::QuakeError;
use crate::feed::FeedWindow;
use crate::ingest::EventCollection;

/// Lowest selectable magnitude threshold.
pub const MIN_MAGNITUDE_FLOOR: f64 = 0.0;

/// Highest selectable magnitude threshold.
pub const MIN_MAGNITUDE_CEIL: f64 = 10.0;

/// User-controlled ingestion parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FilterState {
    pub window: FeedWindow,
    pub min_magnitude: f64,
}

/// Monotonically increasing ingestion cycle tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Generation(pub u64);

/// One ingestion cycle to run: what to fetch and which generation it is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleRequest {
    pub generation: Generation,
    pub filter: FilterState,
}

/// What [`Session::complete`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Result was current and is now visible
    Committed,
    /// A newer cycle was requested; result discarded
    Superseded,
}

/// Single owner of filter, collection and error state.
#[derive(Debug, Default)]
pub struct Session {
    filter: FilterState,
    latest: Generation,
    committed: Generation,
    events: Arc<EventCollection>,
    last_error: Option<String>,
}

impl Session {
    /// Create a session with the default filter (`day`, 0.0).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session with a specific starting filter.
    #[must_use]
    pub fn with_filter(filter: FilterState) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn filter(&self) -> FilterState {
        self.filter
    }

    /// Change the time window. Returns `None` if unchanged.
    pub fn set_time_window(&mut self, window: FeedWindow) -> Option<CycleRequest> {
        if self.filter.window == window {
            return None;
        }
        self.filter.window = window;
        Some(self.next_cycle())
    }

    /// Change the magnitude threshold. Returns `None` if unchanged.
    ///
    /// The value is taken as given; range limits belong to the input control.
    pub fn set_min_magnitude(&mut self, min_magnitude: f64) -> Option<CycleRequest> {
        if self.filter.min_magnitude == min_magnitude {
            return None;
        }
        self.filter.min_magnitude = min_magnitude;
        Some(self.next_cycle())
    }

    /// Request a cycle for the current filter, e.g. on first load.
    pub fn refresh(&mut self) -> CycleRequest {
        self.next_cycle()
    }

    fn next_cycle(&mut self) -> CycleRequest {
        self.latest = Generation(self.latest.0 + 1);
        debug!(generation = self.latest.0, window = %self.filter.window, "cycle requested");
        CycleRequest {
            generation: self.latest,
            filter: self.filter,
        }
    }

    /// Record the result of a cycle.
    ///
    /// On failure the previous collection stays visible and the error
    /// message is kept until the next successful cycle.
    pub fn complete(
        &mut self,
        request: &CycleRequest,
        result: Result<EventCollection, QuakeError>,
    ) -> CycleOutcome {
        if request.generation != self.latest {
            debug!(
                generation = request.generation.0,
                latest = self.latest.0,
                "discarding superseded cycle"
            );
            return CycleOutcome::Superseded;
        }

        self.committed = request.generation;
        match result {
            Ok(events) => {
                info!(
                    generation = request.generation.0,
                    window = %request.filter.window,
                    count = events.len(),
                    "cycle committed"
                );
                self.events = Arc::new(events);
                self.last_error = None;
            }
            Err(e) => {
                warn!(generation = request.generation.0, "cycle failed: {}", e);
                self.last_error = Some(e.to_string());
            }
        }
        CycleOutcome::Committed
    }

    /// Read-only view of the current collection.
    #[must_use]
    pub fn events(&self) -> Arc<EventCollection> {
        Arc::clone(&self.events)
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the latest requested cycle is still outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.committed != self.latest
    }

    /// Latest issued generation.
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::testing::{collection, feature};

    fn events_for(filter: FilterState, mags: &[f64]) -> EventCollection {
        let features = mags
            .iter()
            .enumerate()
            .map(|(i, m)| feature(&format!("ev{i}"), Some(*m), Some((1.0, 1.0))))
            .collect();
        EventCollection::from_feed(&collection(features), filter)
    }

    #[test]
    fn test_initial_state() {
        let session = Session::new();
        assert_eq!(session.filter().window, FeedWindow::Day);
        assert_eq!(session.filter().min_magnitude, 0.0);
        assert!(session.events().is_empty());
        assert!(!session.is_loading());
        assert_eq!(session.generation(), Generation(0));
    }

    #[test]
    fn test_unchanged_values_do_not_start_cycles() {
        let mut session = Session::new();
        assert!(session.set_time_window(FeedWindow::Day).is_none());
        assert!(session.set_min_magnitude(0.0).is_none());
        assert_eq!(session.generation(), Generation(0));

        let req = session.set_min_magnitude(2.5).expect("changed");
        assert_eq!(req.generation, Generation(1));
        assert_eq!(req.filter.min_magnitude, 2.5);
        assert!(session.set_min_magnitude(2.5).is_none());
    }

    #[test]
    fn test_negative_zero_threshold_is_unchanged() {
        let mut session = Session::new();
        assert!(session.set_min_magnitude(-0.0).is_none());
        assert_eq!(session.generation(), Generation(0));
    }

    #[test]
    fn test_request_snapshots_filter() {
        let mut session = Session::new();
        let req = session.set_time_window(FeedWindow::Week).expect("changed");
        session.set_min_magnitude(5.0);
        assert_eq!(req.filter.window, FeedWindow::Week);
        assert_eq!(req.filter.min_magnitude, 0.0);
    }

    #[test]
    fn test_commit_current_cycle() {
        let mut session = Session::new();
        let req = session.refresh();
        assert!(session.is_loading());

        let outcome = session.complete(&req, Ok(events_for(req.filter, &[1.0, 2.0])));
        assert_eq!(outcome, CycleOutcome::Committed);
        assert_eq!(session.events().len(), 2);
        assert!(!session.is_loading());
    }

    #[test]
    fn test_stale_cycle_never_overwrites_newer() {
        let mut session = Session::new();
        let a = session.refresh();
        let b = session.set_time_window(FeedWindow::Week).expect("changed");

        // B resolves first, then A.
        assert_eq!(
            session.complete(&b, Ok(events_for(b.filter, &[4.0]))),
            CycleOutcome::Committed
        );
        assert_eq!(
            session.complete(&a, Ok(events_for(a.filter, &[1.0, 2.0, 3.0]))),
            CycleOutcome::Superseded
        );

        let events = session.events();
        assert_eq!(events.filter().window, FeedWindow::Week);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_out_of_order_completion_waits_for_latest() {
        let mut session = Session::new();
        let a = session.refresh();
        let b = session.set_min_magnitude(3.0).expect("changed");

        assert_eq!(
            session.complete(&a, Ok(events_for(a.filter, &[1.0]))),
            CycleOutcome::Superseded
        );
        assert!(session.is_loading());
        assert!(session.events().is_empty());

        session.complete(&b, Ok(events_for(b.filter, &[3.5])));
        assert!(!session.is_loading());
        assert_eq!(session.events().filter().min_magnitude, 3.0);
    }

    #[test]
    fn test_failure_keeps_previous_collection() {
        let mut session = Session::new();
        let first = session.refresh();
        session.complete(&first, Ok(events_for(first.filter, &[2.0, 3.0])));

        let second = session.set_time_window(FeedWindow::Month).expect("changed");
        let outcome = session.complete(
            &second,
            Err(QuakeError::Api {
                status: 500,
                message: "Internal Server Error".into(),
            }),
        );
        assert_eq!(outcome, CycleOutcome::Committed);
        assert_eq!(session.events().len(), 2);
        assert_eq!(
            session.last_error(),
            Some("USGS feed error (HTTP 500): Internal Server Error")
        );

        let third = session.refresh();
        session.complete(&third, Ok(events_for(third.filter, &[5.0])));
        assert_eq!(session.last_error(), None);
        assert_eq!(session.events().len(), 1);
    }
}
