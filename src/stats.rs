//! Summary statistics over the filtered event collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::QuakemapError;
use crate::models::Quake;
use crate::render::popup_html;

/// Zoom level used when the map jumps to an event.
pub const LOCATE_ZOOM: u8 = 8;

/// Placeholder shown for undefined metrics.
pub const NO_VALUE: &str = "—";

/// Aggregate metrics for a non-empty selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub count: usize,
    pub average_magnitude: f64,
    pub strongest: Quake,
    pub weakest: Quake,
    pub most_recent: Quake,
    /// Relative age of `most_recent`, e.g. "3 hours ago"
    pub most_recent_ago: String,
}

/// What the statistics panel shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Statistics {
    /// Nothing passed the filter (or nothing was fetched)
    NoData,
    Summary(Summary),
}

impl Statistics {
    /// Compute the panel for a filtered selection.
    ///
    /// Ties for strongest, weakest and most recent resolve to the earliest
    /// event in collection order.
    #[must_use]
    pub fn compute(events: &[&Quake], now: DateTime<Utc>) -> Self {
        let Some((&first, rest)) = events.split_first() else {
            return Self::NoData;
        };

        let mut sum = first.magnitude;
        let mut strongest = first;
        let mut weakest = first;
        let mut most_recent = first;

        for &quake in rest {
            sum += quake.magnitude;
            if quake.magnitude > strongest.magnitude {
                strongest = quake;
            }
            if quake.magnitude < weakest.magnitude {
                weakest = quake;
            }
            if quake.time_ms > most_recent.time_ms {
                most_recent = quake;
            }
        }

        let count = events.len();
        #[allow(clippy::cast_precision_loss)]
        let average_magnitude = sum / count as f64;
        let most_recent_ago = most_recent
            .time()
            .map_or_else(|| "unknown".to_string(), |t| time_ago(t, now));

        Self::Summary(Summary {
            count,
            average_magnitude,
            strongest: strongest.clone(),
            weakest: weakest.clone(),
            most_recent: most_recent.clone(),
            most_recent_ago,
        })
    }

    #[must_use]
    pub fn count(&self) -> usize {
        match self {
            Self::NoData => 0,
            Self::Summary(s) => s.count,
        }
    }

    /// Text for the panel rows: (total, average, max, min, most recent).
    #[must_use]
    pub fn display(&self) -> PanelText {
        match self {
            Self::NoData => PanelText {
                total: "0".to_string(),
                average: NO_VALUE.to_string(),
                max: NO_VALUE.to_string(),
                min: NO_VALUE.to_string(),
                most_recent: NO_VALUE.to_string(),
            },
            Self::Summary(s) => PanelText {
                total: s.count.to_string(),
                average: format!("{:.2}", s.average_magnitude),
                max: format!("{:.2}", s.strongest.magnitude),
                min: format!("{:.2}", s.weakest.magnitude),
                most_recent: s.most_recent_ago.clone(),
            },
        }
    }

    /// Resolve a click-to-locate target to a map focus.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when there is no data to locate.
    pub fn locate(&self, target: LocateTarget) -> Result<Focus, QuakemapError> {
        let Self::Summary(summary) = self else {
            return Err(QuakemapError::NotFound(format!(
                "no {} earthquake in the current selection",
                target.as_str()
            )));
        };

        let quake = match target {
            LocateTarget::MostRecent => &summary.most_recent,
            LocateTarget::Strongest => &summary.strongest,
            LocateTarget::Weakest => &summary.weakest,
        };

        Ok(Focus {
            id: quake.id.clone(),
            lat: quake.latitude,
            lon: quake.longitude,
            zoom: LOCATE_ZOOM,
            popup: popup_html(Some(target.title()), quake),
        })
    }
}

/// Rendered strings for the statistics sidebar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelText {
    pub total: String,
    pub average: String,
    pub max: String,
    pub min: String,
    pub most_recent: String,
}

/// Which summary event a sidebar click should reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LocateTarget {
    MostRecent,
    Strongest,
    Weakest,
}

impl LocateTarget {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MostRecent => "most-recent",
            Self::Strongest => "strongest",
            Self::Weakest => "weakest",
        }
    }

    const fn title(self) -> &'static str {
        match self {
            Self::MostRecent => "Most Recent Earthquake",
            Self::Strongest => "Strongest Earthquake",
            Self::Weakest => "Weakest Earthquake",
        }
    }
}

impl std::str::FromStr for LocateTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "most-recent" => Ok(Self::MostRecent),
            "strongest" => Ok(Self::Strongest),
            "weakest" => Ok(Self::Weakest),
            _ => Err(format!(
                "unknown locate target: {s} (expected: most-recent, strongest, weakest)"
            )),
        }
    }
}

/// Where the map should center and what popup to open there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Focus {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub zoom: u8,
    pub popup: String,
}

/// Human relative time, e.g. "a few seconds ago" or "5 days ago".
#[must_use]
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = now.signed_duration_since(then).num_seconds().max(0);
    let mins = rounded(secs, 60);
    let hours = rounded(secs, 3_600);
    let days = rounded(secs, 86_400);

    match secs {
        s if s < 45 => "a few seconds ago".to_string(),
        s if s < 90 => "a minute ago".to_string(),
        _ if mins < 45 => format!("{mins} minutes ago"),
        _ if mins < 90 => "an hour ago".to_string(),
        _ if hours < 22 => format!("{hours} hours ago"),
        _ if hours < 36 => "a day ago".to_string(),
        _ if days < 26 => format!("{days} days ago"),
        _ if days < 46 => "a month ago".to_string(),
        _ if days < 320 => format!("{} months ago", rounded(days * 4_800, DAYS_PER_400_YEARS).max(2)),
        _ if days < 548 => "a year ago".to_string(),
        _ => format!("{} years ago", rounded(days * 400, DAYS_PER_400_YEARS).max(2)),
    }
}

/// Days in a Gregorian 400-year cycle (4800 months).
const DAYS_PER_400_YEARS: i64 = 146_097;

fn rounded(value: i64, unit: i64) -> i64 {
    (value + unit / 2) / unit
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::models::fixtures::quake;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_summary_of_known_set() {
        let t3 = now().timestamp_millis() - 2 * 3_600_000;
        let events = [
            quake("a", 3.0, t3 - 20_000, 10.0),
            quake("b", 5.5, t3 - 10_000, 10.0),
            quake("c", 7.2, t3, 10.0),
        ];
        let refs: Vec<&Quake> = events.iter().collect();

        let Statistics::Summary(s) = Statistics::compute(&refs, now()) else {
            panic!("expected a summary");
        };

        assert_eq!(s.count, 3);
        assert!((s.average_magnitude - 15.7 / 3.0).abs() < 1e-9);
        assert_eq!(s.strongest.id, "c");
        assert_eq!(s.weakest.id, "a");
        assert_eq!(s.most_recent.id, "c");
        assert_eq!(s.most_recent_ago, "2 hours ago");
    }

    #[test]
    fn test_ties_keep_first() {
        let events = [quake("first", 4.0, 100, 1.0), quake("second", 4.0, 100, 1.0)];
        let refs: Vec<&Quake> = events.iter().collect();

        let Statistics::Summary(s) = Statistics::compute(&refs, now()) else {
            panic!("expected a summary");
        };
        assert_eq!(s.strongest.id, "first");
        assert_eq!(s.weakest.id, "first");
        assert_eq!(s.most_recent.id, "first");
    }

    #[test]
    fn test_empty_selection_is_no_data() {
        let stats = Statistics::compute(&[], now());
        assert_eq!(stats, Statistics::NoData);
        assert_eq!(stats.count(), 0);

        let text = stats.display();
        assert_eq!(text.total, "0");
        assert_eq!(text.average, NO_VALUE);
        assert!(!text.average.contains("NaN"));
        assert!(matches!(
            stats.locate(LocateTarget::MostRecent),
            Err(QuakemapError::NotFound(_))
        ));
    }

    #[test]
    fn test_display_two_decimals() {
        let events = [quake("a", 3.0, 0, 1.0), quake("b", 4.25, 1, 1.0)];
        let refs: Vec<&Quake> = events.iter().collect();
        let text = Statistics::compute(&refs, now()).display();

        assert_eq!(text.total, "2");
        assert_eq!(text.average, "3.62");
        assert_eq!(text.max, "4.25");
        assert_eq!(text.min, "3.00");
    }

    #[test]
    fn test_locate_most_recent() {
        let mut late = quake("late", 2.0, 500, 1.0);
        late.latitude = -12.5;
        late.longitude = 166.0;
        let events = [quake("early", 6.0, 100, 1.0), late];
        let refs: Vec<&Quake> = events.iter().collect();

        let focus = Statistics::compute(&refs, now())
            .locate(LocateTarget::MostRecent)
            .unwrap();
        assert_eq!(focus.id, "late");
        assert!((focus.lat + 12.5).abs() < f64::EPSILON);
        assert_eq!(focus.zoom, LOCATE_ZOOM);
        assert!(focus.popup.starts_with("<b>Most Recent Earthquake</b>"));
    }

    #[test]
    fn test_time_ago_thresholds() {
        let at = |d: Duration| time_ago(now() - d, now());

        assert_eq!(at(Duration::seconds(10)), "a few seconds ago");
        assert_eq!(at(Duration::seconds(60)), "a minute ago");
        assert_eq!(at(Duration::minutes(5)), "5 minutes ago");
        assert_eq!(at(Duration::minutes(50)), "an hour ago");
        assert_eq!(at(Duration::hours(3)), "3 hours ago");
        assert_eq!(at(Duration::hours(23)), "a day ago");
        assert_eq!(at(Duration::days(4)), "4 days ago");
        assert_eq!(at(Duration::days(30)), "a month ago");
        assert_eq!(at(Duration::days(90)), "3 months ago");
        assert_eq!(at(Duration::days(315)), "10 months ago");
        assert_eq!(at(Duration::days(400)), "a year ago");
        assert_eq!(at(Duration::days(1_100)), "3 years ago");
        assert_eq!(time_ago(now() + Duration::minutes(3), now()), "a few seconds ago");
    }

    #[test]
    fn test_locate_target_parse() {
        assert_eq!(
            "most-recent".parse::<LocateTarget>().unwrap(),
            LocateTarget::MostRecent
        );
        assert!("latest".parse::<LocateTarget>().is_err());
    }
}
