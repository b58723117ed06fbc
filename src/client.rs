//! USGS Earthquake feed client.
//!
//! Provides async HTTP access to the USGS summary feeds.
//! Uses reqwest with rustls for TLS.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::errors::QuakemapError;
use crate::models::{FeatureCollection, Quake};

/// Default request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("quakemap/", env!("CARGO_PKG_VERSION"));

/// USGS base URL for earthquake feeds.
pub const USGS_BASE_URL: &str = "https://earthquake.usgs.gov";

/// Lookback periods offered by the summary feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    Hour,
    #[default]
    Day,
    Week,
    Month,
}

impl TimeWindow {
    /// Get the token used in feed URLs and in the UI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Get the URL path segment of the "all magnitudes" feed for this window.
    #[must_use]
    pub fn feed_path(self) -> String {
        format!("earthquakes/feed/v1.0/summary/all_{}.geojson", self.as_str())
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(format!(
                "unknown time window: {s} (expected: hour, day, week, month)"
            )),
        }
    }
}

/// Anything that can supply the event collection for a time window.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch events, surfacing failures to the caller.
    async fn try_fetch(&self, window: TimeWindow) -> Result<Vec<Quake>, QuakemapError>;

    /// Fetch events, logging any failure and yielding an empty collection.
    async fn fetch(&self, window: TimeWindow) -> Vec<Quake> {
        match self.try_fetch(window).await {
            Ok(quakes) => quakes,
            Err(e) => {
                warn!("error fetching earthquake data for {window} window: {e}");
                Vec::new()
            }
        }
    }
}

/// Client for the USGS summary feeds.
pub struct UsgsClient {
    client: Client,
    base_url: String,
}

impl UsgsClient {
    /// Create a client against a custom feed host.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn with_base_url(base_url: &str) -> Result<Self, QuakemapError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Full URL of the feed for a window.
    #[must_use]
    pub fn feed_url(&self, window: TimeWindow) -> String {
        format!("{}/{}", self.base_url, window.feed_path())
    }
}

#[async_trait]
impl FeedSource for UsgsClient {
    #[instrument(skip(self), fields(window = window.as_str()))]
    async fn try_fetch(&self, window: TimeWindow) -> Result<Vec<Quake>, QuakemapError> {
        let url = self.feed_url(window);

        debug!("fetching feed from {}", url);

        let response = self.client.get(&url).send().await?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(QuakemapError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let bytes = response.bytes().await?;
        let feed: FeatureCollection = serde_json::from_slice(&bytes)?;
        feed.validate()?;

        let quakes = feed.into_quakes();
        debug!("fetched {} events", quakes.len());
        Ok(quakes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_parse() {
        assert_eq!("hour".parse::<TimeWindow>().unwrap(), TimeWindow::Hour);
        assert_eq!("WEEK".parse::<TimeWindow>().unwrap(), TimeWindow::Week);
        assert!("year".parse::<TimeWindow>().is_err());
        assert_eq!(TimeWindow::default(), TimeWindow::Day);
    }

    #[test]
    fn test_feed_url() {
        let client = UsgsClient::with_base_url("http://localhost:9000/").unwrap();
        assert_eq!(
            client.feed_url(TimeWindow::Month),
            "http://localhost:9000/earthquakes/feed/v1.0/summary/all_month.geojson"
        );
    }

    /// Serve canned feed responses on an ephemeral loopback port.
    async fn spawn_feed_host() -> String {
        use axum::{Router, http::StatusCode, routing::get};

        let app = Router::new()
            .route(
                "/earthquakes/feed/v1.0/summary/all_hour.geojson",
                get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") }),
            )
            .route(
                "/earthquakes/feed/v1.0/summary/all_day.geojson",
                get(|| async { "<html>maintenance</html>" }),
            )
            .route(
                "/earthquakes/feed/v1.0/summary/all_week.geojson",
                get(|| async { r#"{"type": "Feature", "features": []}"# }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn test_error_status_and_bad_body_yield_empty() {
        let client = UsgsClient::with_base_url(&spawn_feed_host().await).unwrap();

        match client.try_fetch(TimeWindow::Hour).await {
            Err(QuakemapError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert!(matches!(
            client.try_fetch(TimeWindow::Day).await,
            Err(QuakemapError::Parse(_))
        ));
        assert!(matches!(
            client.try_fetch(TimeWindow::Week).await,
            Err(QuakemapError::InvalidResponse(_))
        ));

        for window in [TimeWindow::Hour, TimeWindow::Day, TimeWindow::Week] {
            assert!(client.fetch(window).await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_unreachable_feed_yields_empty() {
        // Port 1 on loopback refuses connections.
        let client = UsgsClient::with_base_url("http://127.0.0.1:1").unwrap();

        assert!(client.try_fetch(TimeWindow::Day).await.is_err());
        assert!(client.fetch(TimeWindow::Day).await.is_empty());
    }
}
