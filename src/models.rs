//! Data models for the USGS GeoJSON summary feeds.
//!
//! The wire structures mirror the feed format loosely: only the fields the
//! map needs are declared, and anything optional upstream stays optional here.
//! [`Quake`] is the normalized, immutable event record the rest of the crate
//! works with.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::QuakemapError;

/// Placeholder used when the feed omits a place description.
pub const UNKNOWN_PLACE: &str = "Unknown location";

/// Top-level GeoJSON response from USGS feeds.
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    /// Always "FeatureCollection"
    #[serde(rename = "type")]
    pub type_: String,

    /// Earthquake events
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    /// Validate the response structure.
    pub fn validate(&self) -> Result<(), QuakemapError> {
        if self.type_ != "FeatureCollection" {
            return Err(QuakemapError::InvalidResponse(format!(
                "expected type 'FeatureCollection', got '{}'",
                self.type_
            )));
        }
        Ok(())
    }

    /// Convert every drawable feature into a [`Quake`].
    ///
    /// Features without a magnitude or a position cannot be placed on the
    /// map and are skipped.
    #[must_use]
    pub fn into_quakes(self) -> Vec<Quake> {
        let total = self.features.len();
        let quakes: Vec<Quake> = self
            .features
            .into_iter()
            .filter_map(|f| {
                let id = f.id.clone();
                let quake = Quake::from_feature(f);
                if quake.is_none() {
                    debug!("skipping undrawable feature {}", id);
                }
                quake
            })
            .collect();

        if quakes.len() != total {
            debug!("kept {} of {} features", quakes.len(), total);
        }
        quakes
    }
}

/// A single earthquake feature as delivered by the feed.
#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    /// Unique event ID
    #[serde(default)]
    pub id: String,

    /// Geographic location
    pub geometry: Geometry,

    /// Event properties
    pub properties: Properties,
}

/// Geographic geometry for an event.
#[derive(Debug, Clone, Deserialize)]
pub struct Geometry {
    /// Coordinates: [longitude, latitude, depth_km]
    pub coordinates: Vec<f64>,
}

/// Event properties used by the map.
#[derive(Debug, Clone, Deserialize)]
pub struct Properties {
    /// Magnitude value
    pub mag: Option<f64>,

    /// Human-readable place description
    pub place: Option<String>,

    /// Event time (ms since epoch)
    pub time: i64,

    /// Event page URL
    pub url: Option<String>,
}

/// One earthquake occurrence, normalized for filtering and rendering.
///
/// Records are never mutated once built from the feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quake {
    pub id: String,
    pub magnitude: f64,
    pub place: String,
    /// Event time (ms since epoch)
    pub time_ms: i64,
    pub depth_km: f64,
    pub longitude: f64,
    pub latitude: f64,
    pub url: Option<String>,
}

impl Quake {
    /// Build a record from a feed feature.
    ///
    /// Returns `None` when the feature lacks a magnitude or has fewer than
    /// two coordinates. A missing depth is taken as 0 km.
    #[must_use]
    pub fn from_feature(feature: Feature) -> Option<Self> {
        let magnitude = feature.properties.mag.filter(|m| m.is_finite())?;
        let coords = &feature.geometry.coordinates;
        let longitude = *coords.first()?;
        let latitude = *coords.get(1)?;
        let depth_km = coords.get(2).copied().unwrap_or(0.0);

        Some(Self {
            id: feature.id,
            magnitude,
            place: feature
                .properties
                .place
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_PLACE.to_string()),
            time_ms: feature.properties.time,
            depth_km,
            longitude,
            latitude,
            url: feature.properties.url,
        })
    }

    /// Get the event time as a `DateTime<Utc>`.
    #[must_use]
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.time_ms).single()
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sample_feed() {
        let feed: FeatureCollection =
            serde_json::from_str(fixtures::SAMPLE_FEED).expect("failed to parse sample feed");

        feed.validate().expect("invalid feed");
        assert_eq!(feed.features.len(), 4);

        let quakes = feed.into_quakes();
        assert_eq!(quakes.len(), 3, "feature without magnitude is dropped");
        assert_eq!(quakes[0].id, "ci40000001");
        assert!((quakes[1].depth_km - 410.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_missing_place_and_depth_defaults() {
        let feed: FeatureCollection = serde_json::from_str(fixtures::SAMPLE_FEED).unwrap();
        let quakes = feed.into_quakes();
        let nc = quakes.iter().find(|q| q.id == "nc0002").unwrap();

        assert_eq!(nc.place, UNKNOWN_PLACE);
        assert!(nc.depth_km.abs() < f64::EPSILON);
        assert!((nc.latitude - 38.8).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_wrong_type() {
        let feed: FeatureCollection =
            serde_json::from_str(r#"{"type": "Feature", "features": []}"#).unwrap();
        assert!(matches!(
            feed.validate(),
            Err(QuakemapError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_time_conversion() {
        let q = fixtures::quake("a", 1.0, 0, 0.0);
        assert_eq!(q.time().unwrap().timestamp(), 0);
    }
}
