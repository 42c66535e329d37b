//! Data models for USGS summary feed responses.
//!
//! These structures match the GeoJSON format of the summary feeds. Upstream
//! quality varies, so every per-record field is optional and a null or
//! wrong-typed value reads as absent instead of failing the document. The
//! decision about what is usable is left to [`crate::ingest`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::errors::QuakeError;

/// Deserialize `T`, treating null or a wrong-typed value as `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Like [`lenient`], falling back to `T::default()`.
fn lenient_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(lenient(deserializer)?.unwrap_or_default())
}

/// Event ids are strings upstream; bare numbers are accepted as their text.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Each entry that isn't an object becomes an empty (unusable) feature.
fn lenient_features<'de, D>(deserializer: D) -> Result<Vec<Feature>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Vec::<Value>::deserialize(deserializer)?;
    Ok(values
        .into_iter()
        .map(|v| serde_json::from_value(v).unwrap_or_default())
        .collect())
}

/// Top-level GeoJSON response from USGS feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    /// "FeatureCollection" when present
    #[serde(rename = "type", default)]
    pub type_: Option<String>,

    /// Feed metadata
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<Metadata>,

    /// Earthquake events
    #[serde(deserialize_with = "lenient_features")]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Validate the response structure.
    ///
    /// # Errors
    ///
    /// Returns [`QuakeError::InvalidResponse`] if the document declares a
    /// type other than `FeatureCollection`.
    pub fn validate(&self) -> Result<(), QuakeError> {
        match self.type_.as_deref() {
            None | Some("FeatureCollection") => Ok(()),
            Some(other) => Err(QuakeError::InvalidResponse(format!(
                "expected type 'FeatureCollection', got '{other}'"
            ))),
        }
    }

    /// When the feed was generated (ms since epoch), if reported.
    #[must_use]
    pub fn generated(&self) -> Option<i64> {
        self.metadata.as_ref().and_then(|m| m.generated)
    }
}

/// Metadata about the feed response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Metadata {
    /// When this feed was generated (ms since epoch)
    #[serde(default, deserialize_with = "lenient")]
    pub generated: Option<i64>,
}

/// A single raw earthquake record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Feature {
    /// Unique event ID
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,

    /// Geographic location
    #[serde(default, deserialize_with = "lenient")]
    pub geometry: Option<Geometry>,

    /// Event properties
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub properties: Properties,
}

impl Feature {
    fn coordinate(&self, index: usize) -> Option<f64> {
        self.geometry
            .as_ref()?
            .coordinates
            .get(index)?
            .as_f64()
            .filter(|v| v.is_finite())
    }

    /// Longitude in degrees, if numeric.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.coordinate(0)
    }

    /// Latitude in degrees, if numeric.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.coordinate(1)
    }

    /// Depth in kilometers (positive down), if numeric.
    #[must_use]
    pub fn depth_km(&self) -> Option<f64> {
        self.coordinate(2)
    }
}

/// Geographic geometry for an event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Geometry {
    /// Coordinates: [longitude, latitude, depth_km]
    ///
    /// Kept as raw JSON values so a single non-numeric entry drops one
    /// record instead of failing the whole document.
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub coordinates: Vec<Value>,
}

/// Event properties from the summary feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Properties {
    /// Magnitude value
    #[serde(default, deserialize_with = "lenient")]
    pub mag: Option<f64>,

    /// Human-readable place description
    #[serde(default, deserialize_with = "lenient")]
    pub place: Option<String>,

    /// Event time (ms since epoch)
    #[serde(default, deserialize_with = "lenient")]
    pub time: Option<i64>,

    /// Tsunami flag: 0 or 1
    #[serde(default, deserialize_with = "lenient")]
    pub tsunami: Option<i64>,

    /// Significance score (0-1000+)
    #[serde(default, deserialize_with = "lenient")]
    pub sig: Option<i64>,

    /// Event page URL
    #[serde(default, deserialize_with = "lenient")]
    pub url: Option<String>,

    /// Number of "Did You Feel It?" reports
    #[serde(default, deserialize_with = "lenient")]
    pub felt: Option<i64>,
}
