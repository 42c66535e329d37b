//! USGS summary feed client.
//!
//! Provides async HTTP access to the day/week/month summary feeds.
//! Uses reqwest with rustls for TLS.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::errors::QuakeError;
use crate::models::FeatureCollection;

/// Default request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakemap/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
pub const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Time window selecting which summary feed to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedWindow {
    #[default]
    Day,
    Week,
    Month,
}

impl FeedWindow {
    /// All windows, in selector order.
    pub const ALL: [Self; 3] = [Self::Day, Self::Week, Self::Month];

    /// Short name used on the command line and in the API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Summary feed file for this window.
    #[must_use]
    pub const fn feed_file(self) -> &'static str {
        match self {
            Self::Day => "all_day.geojson",
            Self::Week => "all_week.geojson",
            Self::Month => "all_month.geojson",
        }
    }

    /// Selector label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Day => "Past Day",
            Self::Week => "Past Week",
            Self::Month => "Past Month",
        }
    }

    /// Full endpoint URL under `base_url`.
    #[must_use]
    pub fn endpoint(self, base_url: &str) -> String {
        format!(
            "{}/earthquakes/feed/v1.0/summary/{}",
            base_url.trim_end_matches('/'),
            self.feed_file()
        )
    }
}

impl fmt::Display for FeedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FeedWindow {
    type Err = QuakeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(QuakeError::UnknownWindow(s.to_string())),
        }
    }
}

/// Connection settings for the feed client.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: USGS_BASE_URL.to_string(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Anything that can produce a raw feed document for a window.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Retrieve and parse the feed for `window`.
    async fn fetch(&self, window: FeedWindow) -> Result<FeatureCollection, QuakeError>;
}

/// Client for the USGS summary feeds.
pub struct FeedClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl FeedClient {
    /// Create a new feed client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(config: &FeedConfig) -> Result<Self, QuakeError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            timeout: config.timeout,
        })
    }

    /// Configured request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch a summary GeoJSON feed.
    ///
    /// # Errors
    ///
    /// Returns a network-kind error if the request fails, times out or
    /// returns a non-success status, and a parse-kind error if the body is
    /// not a feature collection.
    #[instrument(skip(self), fields(window = window.as_str()))]
    pub async fn fetch_feed(&self, window: FeedWindow) -> Result<FeatureCollection, QuakeError> {
        let url = window.endpoint(&self.base_url);

        debug!("fetching feed from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            };
            return Err(QuakeError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;
        let feed: FeatureCollection = serde_json::from_slice(&body)?;

        // Validate response structure
        feed.validate()?;

        debug!("fetched {} features", feed.features.len());
        Ok(feed)
    }

    fn transport_error(&self, e: reqwest::Error) -> QuakeError {
        if e.is_timeout() {
            QuakeError::Timeout(self.timeout)
        } else {
            QuakeError::Http(e)
        }
    }
}

#[async_trait]
impl FeedSource for FeedClient {
    async fn fetch(&self, window: FeedWindow) -> Result<FeatureCollection, QuakeError> {
        self.fetch_feed(window).await
    }
}
