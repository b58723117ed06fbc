//! Event filtering logic.
//!
//! Holds the user's filter controls: the magnitude slider pair (which can
//! never cross) and the depth bucket. Filtering is a pure function of the
//! collection and these values.

use serde::{Deserialize, Serialize};

use crate::errors::QuakemapError;
use crate::models::Quake;

/// Lower end of the magnitude slider domain. The `all_*` feeds carry
/// micro-events with small negative magnitudes.
pub const MAGNITUDE_FLOOR: f64 = -2.0;

/// Upper end of the magnitude slider domain.
pub const MAGNITUDE_CEILING: f64 = 10.0;

/// Upper bound of the shallow bucket (km).
const SHALLOW_MAX_KM: f64 = 70.0;

/// Upper bound of the intermediate bucket (km).
const INTERMEDIATE_MAX_KM: f64 = 300.0;

/// Categorical grouping of event depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepthBucket {
    /// No depth restriction
    #[default]
    #[serde(alias = "all")]
    Any,
    /// depth <= 70 km
    Shallow,
    /// 70 km < depth <= 300 km
    Intermediate,
    /// depth > 300 km
    Deep,
}

impl DepthBucket {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Shallow => "shallow",
            Self::Intermediate => "intermediate",
            Self::Deep => "deep",
        }
    }

    /// Check if a depth in km falls in this bucket.
    #[must_use]
    pub fn contains(self, depth_km: f64) -> bool {
        match self {
            Self::Any => true,
            Self::Shallow => depth_km <= SHALLOW_MAX_KM,
            Self::Intermediate => depth_km > SHALLOW_MAX_KM && depth_km <= INTERMEDIATE_MAX_KM,
            Self::Deep => depth_km > INTERMEDIATE_MAX_KM,
        }
    }
}

impl std::str::FromStr for DepthBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "any" | "all" => Ok(Self::Any),
            "shallow" => Ok(Self::Shallow),
            "intermediate" => Ok(Self::Intermediate),
            "deep" => Ok(Self::Deep),
            _ => Err(format!(
                "unknown depth bucket: {s} (expected: any, shallow, intermediate, deep)"
            )),
        }
    }
}

/// Inclusive magnitude bounds driven by two sliders.
///
/// `min <= max` holds after every mutation: moving one slider past the
/// other drags the other along.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MagnitudeRange {
    min: f64,
    max: f64,
}

impl Default for MagnitudeRange {
    fn default() -> Self {
        Self {
            min: MAGNITUDE_FLOOR,
            max: MAGNITUDE_CEILING,
        }
    }
}

impl MagnitudeRange {
    /// Build a range, clamping each bound to the slider domain.
    ///
    /// # Errors
    ///
    /// Returns an error if either bound is not finite or if `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self, QuakemapError> {
        let min = slider_value(min)?;
        let max = slider_value(max)?;
        if min > max {
            return Err(QuakemapError::InvalidFilter(format!(
                "minimum magnitude {min} exceeds maximum {max}"
            )));
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Move the minimum slider; drags the maximum up if crossed.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite.
    pub fn set_min(&mut self, value: f64) -> Result<(), QuakemapError> {
        self.min = slider_value(value)?;
        if self.min > self.max {
            self.max = self.min;
        }
        debug_assert!(self.min <= self.max);
        Ok(())
    }

    /// Move the maximum slider; drags the minimum down if crossed.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not finite.
    pub fn set_max(&mut self, value: f64) -> Result<(), QuakemapError> {
        self.max = slider_value(value)?;
        if self.max < self.min {
            self.min = self.max;
        }
        debug_assert!(self.min <= self.max);
        Ok(())
    }

    /// Check if a magnitude lies within the bounds (inclusive).
    #[must_use]
    pub fn contains(&self, magnitude: f64) -> bool {
        self.min <= magnitude && magnitude <= self.max
    }
}

/// Validate a slider value and clamp it to the slider domain.
fn slider_value(value: f64) -> Result<f64, QuakemapError> {
    if !value.is_finite() {
        return Err(QuakemapError::InvalidFilter(format!(
            "magnitude must be a finite number, got {value}"
        )));
    }
    Ok(value.clamp(MAGNITUDE_FLOOR, MAGNITUDE_CEILING))
}

/// Combined filter criteria.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct FilterState {
    pub magnitude: MagnitudeRange,
    pub depth: DepthBucket,
}

impl FilterState {
    /// Check if an event passes all filter criteria.
    #[must_use]
    pub fn matches(&self, event: &Quake) -> bool {
        self.magnitude.contains(event.magnitude) && self.depth.contains(event.depth_km)
    }

    /// Select the events passing the filter, preserving collection order.
    #[must_use]
    pub fn apply<'a>(&self, events: &'a [Quake]) -> Vec<&'a Quake> {
        events.iter().filter(|e| self.matches(e)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::quake;

    #[test]
    fn test_min_drags_max_up() {
        let mut range = MagnitudeRange::new(2.0, 4.0).unwrap();
        range.set_min(6.5).unwrap();
        assert!((range.min() - 6.5).abs() < f64::EPSILON);
        assert!((range.max() - 6.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_max_drags_min_down() {
        let mut range = MagnitudeRange::new(5.0, 8.0).unwrap();
        range.set_max(3.0).unwrap();
        assert!((range.min() - 3.0).abs() < f64::EPSILON);
        assert!((range.max() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_invariant_holds_over_interactions() {
        let mut range = MagnitudeRange::default();
        let moves = [(true, 7.0), (false, 1.0), (true, 9.9), (false, 12.0), (true, -3.0)];
        for (is_min, value) in moves {
            if is_min {
                range.set_min(value).unwrap();
            } else {
                range.set_max(value).unwrap();
            }
            assert!(range.min() <= range.max());
            assert!(range.min() >= MAGNITUDE_FLOOR && range.max() <= MAGNITUDE_CEILING);
        }
    }

    #[test]
    fn test_default_range_keeps_negative_magnitudes() {
        let events = vec![quake("micro", -0.8, 1, 2.0), quake("below", -3.5, 2, 2.0)];
        let kept = FilterState::default().apply(&events);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "micro");

        let mut range = MagnitudeRange::default();
        range.set_min(-1.0).unwrap();
        assert!((range.min() + 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut range = MagnitudeRange::default();
        assert!(range.set_min(f64::NAN).is_err());
        assert!(range.set_max(f64::INFINITY).is_err());
        assert_eq!(range, MagnitudeRange::default());
        assert!(MagnitudeRange::new(5.0, 4.0).is_err());
    }

    #[test]
    fn test_depth_buckets() {
        assert!(DepthBucket::Shallow.contains(70.0));
        assert!(!DepthBucket::Shallow.contains(70.1));
        assert!(DepthBucket::Intermediate.contains(70.1));
        assert!(DepthBucket::Intermediate.contains(300.0));
        assert!(!DepthBucket::Intermediate.contains(70.0));
        assert!(DepthBucket::Deep.contains(300.5));
        assert!(!DepthBucket::Deep.contains(300.0));
        assert!(DepthBucket::Any.contains(-2.0));
        assert_eq!("all".parse::<DepthBucket>().unwrap(), DepthBucket::Any);
    }

    #[test]
    fn test_filter_is_inclusive_and_idempotent() {
        let events = vec![
            quake("a", 2.0, 1, 10.0),
            quake("b", 3.0, 2, 10.0),
            quake("c", 5.0, 3, 10.0),
            quake("d", 5.1, 4, 10.0),
        ];
        let filter = FilterState {
            magnitude: MagnitudeRange::new(3.0, 5.0).unwrap(),
            ..Default::default()
        };

        let once: Vec<Quake> = filter.apply(&events).into_iter().cloned().collect();
        let ids: Vec<&str> = once.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, ["b", "c"]);

        let twice: Vec<Quake> = filter.apply(&once).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_depth_composes_with_magnitude() {
        let events = vec![quake("shallow", 4.0, 1, 15.0), quake("deep", 4.0, 2, 550.0)];
        let filter = FilterState {
            depth: DepthBucket::Deep,
            ..Default::default()
        };

        let kept = filter.apply(&events);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "deep");
    }
}
