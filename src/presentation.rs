//! Values derived from normalized events for display.
//!
//! Marker color and radius, the magnitude legend, summary statistics and
//! the fit-bounds request handed to the map. All functions here are pure.

use serde::Serialize;

use crate::ingest::{EventCollection, NormalizedEvent};
use crate::state::{FilterState, Generation};

/// Events at or above this magnitude count as significant.
pub const SIGNIFICANT_MAGNITUDE: f64 = 4.0;

/// Smallest marker radius in pixels.
pub const MIN_RADIUS: f64 = 3.0;

/// Pixels of radius per unit of magnitude.
const RADIUS_PER_MAGNITUDE: f64 = 2.5;

/// Padding around fitted bounds in pixels.
pub const FIT_PADDING_PX: u32 = 50;

/// Zoom cap when fitting bounds, so a single event doesn't fill the map.
pub const FIT_MAX_ZOOM: u8 = 8;

/// Magnitude band used for marker color and the legend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MagnitudeBand {
    Major,
    Strong,
    Moderate,
    Light,
    Minor,
    VeryMinor,
    Micro,
}

impl MagnitudeBand {
    /// Bands from strongest to weakest.
    pub const ALL: [Self; 7] = [
        Self::Major,
        Self::Strong,
        Self::Moderate,
        Self::Light,
        Self::Minor,
        Self::VeryMinor,
        Self::Micro,
    ];

    /// Band containing `magnitude`. Total: NaN falls into `Micro`.
    #[must_use]
    pub fn of(magnitude: f64) -> Self {
        match magnitude {
            m if m >= 7.0 => Self::Major,
            m if m >= 6.0 => Self::Strong,
            m if m >= 5.0 => Self::Moderate,
            m if m >= 4.0 => Self::Light,
            m if m >= 3.0 => Self::Minor,
            m if m >= 2.0 => Self::VeryMinor,
            _ => Self::Micro,
        }
    }

    /// Fill color as a hex string.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Major => "#8B0000",
            Self::Strong => "#FF0000",
            Self::Moderate => "#FF4500",
            Self::Light => "#FFA500",
            Self::Minor => "#FFD700",
            Self::VeryMinor => "#ADFF2F",
            Self::Micro => "#32CD32",
        }
    }

    /// Fill color as an RGB triple.
    #[must_use]
    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            Self::Major => (0x8B, 0x00, 0x00),
            Self::Strong => (0xFF, 0x00, 0x00),
            Self::Moderate => (0xFF, 0x45, 0x00),
            Self::Light => (0xFF, 0xA5, 0x00),
            Self::Minor => (0xFF, 0xD7, 0x00),
            Self::VeryMinor => (0xAD, 0xFF, 0x2F),
            Self::Micro => (0x32, 0xCD, 0x32),
        }
    }

    /// Magnitude range shown in the legend.
    #[must_use]
    pub const fn range(self) -> &'static str {
        match self {
            Self::Major => "7.0+",
            Self::Strong => "6.0-6.9",
            Self::Moderate => "5.0-5.9",
            Self::Light => "4.0-4.9",
            Self::Minor => "3.0-3.9",
            Self::VeryMinor => "2.0-2.9",
            Self::Micro => "<2.0",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Major => "Major",
            Self::Strong => "Strong",
            Self::Moderate => "Moderate",
            Self::Light => "Light",
            Self::Minor => "Minor",
            Self::VeryMinor => "Very Minor",
            Self::Micro => "Micro",
        }
    }
}

/// Marker fill color for a magnitude.
#[must_use]
pub fn magnitude_color(magnitude: f64) -> &'static str {
    MagnitudeBand::of(magnitude).color()
}

/// Marker radius for a magnitude, never below [`MIN_RADIUS`].
#[must_use]
pub fn marker_radius(magnitude: f64) -> f64 {
    (magnitude * RADIUS_PER_MAGNITUDE).max(MIN_RADIUS)
}

/// One legend row.
#[derive(Debug, Clone, Serialize)]
pub struct LegendEntry {
    pub band: MagnitudeBand,
    pub range: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

/// Legend rows from strongest to weakest.
#[must_use]
pub fn legend() -> Vec<LegendEntry> {
    MagnitudeBand::ALL
        .iter()
        .map(|&band| LegendEntry {
            band,
            range: band.range(),
            label: band.label(),
            color: band.color(),
        })
        .collect()
}

/// Summary figures for the statistics panel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Statistics {
    pub total: usize,
    pub significant: usize,
    /// 0.0 for an empty collection
    pub max_magnitude: f64,
}

impl Statistics {
    #[must_use]
    pub fn of(events: &[NormalizedEvent]) -> Self {
        Self {
            total: events.len(),
            significant: events
                .iter()
                .filter(|e| e.magnitude >= SIGNIFICANT_MAGNITUDE)
                .count(),
            max_magnitude: events.iter().fold(0.0, |max, e| e.magnitude.max(max)),
        }
    }
}

/// Geographic box enclosing a set of events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl MapBounds {
    /// Smallest box containing every event, or `None` if there are none.
    #[must_use]
    pub fn fit(events: &[NormalizedEvent]) -> Option<Self> {
        let first = events.first()?;
        let start = Self {
            south: first.lat,
            west: first.lng,
            north: first.lat,
            east: first.lng,
        };
        Some(events.iter().skip(1).fold(start, |b, e| Self {
            south: b.south.min(e.lat),
            west: b.west.min(e.lng),
            north: b.north.max(e.lat),
            east: b.east.max(e.lng),
        }))
    }
}

/// Request to fit the map view to a set of points.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FitBounds {
    pub bounds: MapBounds,
    pub padding: u32,
    pub max_zoom: u8,
}

impl FitBounds {
    #[must_use]
    pub fn of(events: &[NormalizedEvent]) -> Option<Self> {
        MapBounds::fit(events).map(|bounds| Self {
            bounds,
            padding: FIT_PADDING_PX,
            max_zoom: FIT_MAX_ZOOM,
        })
    }
}

/// One map marker, the shape the map layer draws.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub magnitude: f64,
    pub color: &'static str,
    pub radius: f64,
    pub place: String,
    pub time: Option<i64>,
    pub depth: Option<f64>,
    pub url: Option<String>,
    pub felt: Option<i64>,
    /// 0 or 1
    pub tsunami: u8,
    pub significance: i64,
}

impl From<&NormalizedEvent> for Marker {
    fn from(e: &NormalizedEvent) -> Self {
        Self {
            id: e.id.clone(),
            lat: e.lat,
            lng: e.lng,
            magnitude: e.magnitude,
            color: magnitude_color(e.magnitude),
            radius: marker_radius(e.magnitude),
            place: e.place.clone(),
            time: e.time,
            depth: e.depth,
            url: e.url.clone(),
            felt: e.felt,
            tsunami: u8::from(e.tsunami),
            significance: e.significance,
        }
    }
}

/// Everything the page needs for one render.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub filter: FilterState,
    pub generation: Generation,
    pub loading: bool,
    pub error: Option<String>,
    /// Filter the displayed markers were fetched with
    pub shown_filter: FilterState,
    pub markers: Vec<Marker>,
    pub statistics: Statistics,
    pub fit: Option<FitBounds>,
}

impl DashboardView {
    #[must_use]
    pub fn new(
        filter: FilterState,
        generation: Generation,
        loading: bool,
        error: Option<String>,
        events: &EventCollection,
    ) -> Self {
        Self {
            filter,
            generation,
            loading,
            error,
            shown_filter: events.filter(),
            markers: events.iter().map(Marker::from).collect(),
            statistics: Statistics::of(events.events()),
            fit: FitBounds::of(events.events()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, magnitude: f64, lat: f64, lng: f64) -> NormalizedEvent {
        NormalizedEvent {
            id: id.into(),
            magnitude,
            place: "somewhere".into(),
            time: None,
            lat,
            lng,
            depth: None,
            url: None,
            felt: None,
            tsunami: false,
            significance: 0,
        }
    }

    #[test]
    fn test_radius() {
        assert!((marker_radius(0.0) - 3.0).abs() < f64::EPSILON);
        assert!((marker_radius(4.0) - 10.0).abs() < f64::EPSILON);
        assert!((marker_radius(1.0) - 3.0).abs() < f64::EPSILON);
        assert!((marker_radius(-1.0) - 3.0).abs() < f64::EPSILON);
        assert!((marker_radius(f64::NAN) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_color_bands() {
        assert_eq!(magnitude_color(7.5), "#8B0000");
        assert_eq!(magnitude_color(7.0), "#8B0000");
        assert_eq!(magnitude_color(6.99), "#FF0000");
        assert_eq!(magnitude_color(5.0), "#FF4500");
        assert_eq!(magnitude_color(4.2), "#FFA500");
        assert_eq!(magnitude_color(3.0), "#FFD700");
        assert_eq!(magnitude_color(2.0), "#ADFF2F");
        assert_eq!(magnitude_color(1.5), "#32CD32");
        assert_eq!(magnitude_color(-0.5), "#32CD32");
        assert_eq!(magnitude_color(f64::NAN), "#32CD32");
    }

    #[test]
    fn test_legend_matches_bands() {
        let rows = legend();
        assert_eq!(rows.len(), 7);
        assert_eq!(rows[0].range, "7.0+");
        assert_eq!(rows[0].label, "Major");
        assert_eq!(rows[6].range, "<2.0");
        assert_eq!(rows[5].label, "Very Minor");
        for row in &rows {
            assert_eq!(row.color, row.band.color());
        }
    }

    #[test]
    fn test_statistics() {
        let events = vec![
            event("a", 5.2, 1.0, 1.0),
            event("b", 1.8, 1.0, 1.0),
            event("c", 4.0, 1.0, 1.0),
        ];
        let stats = Statistics::of(&events);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.significant, 2);
        assert!((stats.max_magnitude - 5.2).abs() < f64::EPSILON);

        let empty = Statistics::of(&[]);
        assert_eq!(empty.total, 0);
        assert!(empty.max_magnitude.abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_bounds() {
        assert!(MapBounds::fit(&[]).is_none());

        let events = vec![
            event("a", 1.0, 38.0, 142.0),
            event("b", 1.0, -33.4, -70.6),
            event("c", 1.0, 0.0, 0.0),
        ];
        let bounds = MapBounds::fit(&events).expect("bounds");
        assert_eq!(bounds.south, -33.4);
        assert_eq!(bounds.north, 38.0);
        assert_eq!(bounds.west, -70.6);
        assert_eq!(bounds.east, 142.0);

        let fit = FitBounds::of(&events).expect("fit");
        assert_eq!(fit.padding, 50);
        assert_eq!(fit.max_zoom, 8);
    }

    #[test]
    fn test_marker_encoding() {
        let mut e = event("a", 6.2, 10.0, 20.0);
        e.tsunami = true;
        let marker = Marker::from(&e);
        assert_eq!(marker.color, "#FF0000");
        assert!((marker.radius - 15.5).abs() < 1e-9);
        assert_eq!(marker.tsunami, 1);
    }
}
