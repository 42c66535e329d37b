//! Feed ingestion and normalization.
//!
//! Turns a raw feed document into the ordered [`EventCollection`] that the
//! map and panels consume. Records without an id or a usable lat/lng pair
//! are dropped; everything else gets explicit defaults.

use serde::Serialize;
use tracing::debug;

use crate::errors::QuakeError;
use crate::feed::{FeedSource, FeedWindow};
use crate::models::{Feature, FeatureCollection};
use crate::state::FilterState;

/// Place name used when the feed has none.
pub const UNKNOWN_PLACE: &str = "Unknown location";

/// Canonical in-memory representation of one seismic event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEvent {
    pub id: String,
    /// 0.0 when the feed reports no magnitude
    pub magnitude: f64,
    pub place: String,
    /// Epoch millis
    pub time: Option<i64>,
    pub lat: f64,
    pub lng: f64,
    pub depth: Option<f64>,
    pub url: Option<String>,
    pub felt: Option<i64>,
    pub tsunami: bool,
    pub significance: i64,
}

impl NormalizedEvent {
    /// Normalize a raw record, or `None` if it is unusable.
    ///
    /// Coordinates of exactly 0.0 are valid.
    #[must_use]
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let id = feature.id.as_deref().filter(|id| !id.is_empty())?;
        let lat = feature.latitude()?;
        let lng = feature.longitude()?;
        let props = &feature.properties;

        Some(Self {
            id: id.to_string(),
            magnitude: props.mag.filter(|m| m.is_finite()).unwrap_or(0.0),
            place: props
                .place
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| UNKNOWN_PLACE.to_string()),
            time: props.time,
            lat,
            lng,
            depth: feature.depth_km(),
            url: props.url.clone(),
            felt: props.felt,
            tsunami: props.tsunami.is_some_and(|t| t != 0),
            significance: props.sig.unwrap_or(0),
        })
    }
}

/// Events produced by one ingestion cycle, in feed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventCollection {
    filter: FilterState,
    generated: Option<i64>,
    events: Vec<NormalizedEvent>,
}

impl EventCollection {
    /// Build a collection from a parsed feed.
    #[must_use]
    pub fn from_feed(feed: &FeatureCollection, filter: FilterState) -> Self {
        let total = feed.features.len();
        let normalized: Vec<NormalizedEvent> = feed
            .features
            .iter()
            .filter_map(NormalizedEvent::from_feature)
            .collect();
        let dropped = total - normalized.len();

        let events: Vec<NormalizedEvent> = normalized
            .into_iter()
            .filter(|e| e.magnitude >= filter.min_magnitude)
            .collect();

        debug!(
            total,
            dropped,
            kept = events.len(),
            min_magnitude = filter.min_magnitude,
            "normalized feed"
        );

        Self {
            filter,
            generated: feed.generated(),
            events,
        }
    }

    /// Filter this collection was produced for.
    #[must_use]
    pub fn filter(&self) -> FilterState {
        self.filter
    }

    /// Feed generation time (ms since epoch), if reported.
    #[must_use]
    pub fn generated(&self) -> Option<i64> {
        self.generated
    }

    #[must_use]
    pub fn events(&self) -> &[NormalizedEvent] {
        &self.events
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NormalizedEvent> {
        self.events.iter()
    }
}

impl<'a> IntoIterator for &'a EventCollection {
    type Item = &'a NormalizedEvent;
    type IntoIter = std::slice::Iter<'a, NormalizedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

/// Run one full ingestion cycle.
///
/// # Errors
///
/// Returns whatever the source reports: network-kind errors for transport
/// or status failures, parse-kind errors for malformed documents. No
/// partial collection is ever returned.
pub async fn ingest(
    source: &dyn FeedSource,
    window: FeedWindow,
    min_magnitude: f64,
) -> Result<EventCollection, QuakeError> {
    let feed = source.fetch(window).await?;
    Ok(EventCollection::from_feed(
        &feed,
        FilterState {
            window,
            min_magnitude,
        },
    ))
}
