//! Map layer construction.
//!
//! Turns the filtered event collection into the two overlays the page draws:
//! circle markers (sized and colored by magnitude, each with a popup) and
//! weighted heat points. Every call builds both layers from scratch.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;

use crate::models::Quake;

/// Smallest marker radius in pixels.
const MIN_MARKER_RADIUS: f64 = 5.0;

/// Pixels of radius per unit of magnitude.
const RADIUS_PER_MAGNITUDE: f64 = 5.0;

/// Heat layer blur radius in pixels.
pub const HEAT_RADIUS: u32 = 25;

// Magnitude-based marker colors, strongest first.
const COLOR_GREAT: &str = "#FF0000"; // mag >= 8
const COLOR_MAJOR: &str = "#FF4500"; // mag >= 7
const COLOR_STRONG: &str = "#FFA500"; // mag >= 6
const COLOR_MODERATE: &str = "#FFD700"; // mag >= 4
const COLOR_MINOR: &str = "#ADFF2F"; // mag >= 2
const COLOR_MICRO: &str = "#00FF00";

/// Marker radius for a magnitude: `max(5m, 5)`.
#[must_use]
pub fn marker_radius(magnitude: f64) -> f64 {
    (magnitude * RADIUS_PER_MAGNITUDE).max(MIN_MARKER_RADIUS)
}

/// Marker fill color for a magnitude. Tier boundaries belong to the upper tier.
#[must_use]
pub fn marker_color(magnitude: f64) -> &'static str {
    match magnitude {
        m if m >= 8.0 => COLOR_GREAT,
        m if m >= 7.0 => COLOR_MAJOR,
        m if m >= 6.0 => COLOR_STRONG,
        m if m >= 4.0 => COLOR_MODERATE,
        m if m >= 2.0 => COLOR_MINOR,
        _ => COLOR_MICRO,
    }
}

/// Stroke and fill styling shared by every marker.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct MarkerStyle {
    pub color: &'static str,
    pub weight: u32,
    pub opacity: f64,
    pub fill_opacity: f64,
}

pub const MARKER_STYLE: MarkerStyle = MarkerStyle {
    color: "#000",
    weight: 1,
    opacity: 1.0,
    fill_opacity: 0.8,
};

/// One circle marker on the map.
#[derive(Debug, Clone, Serialize)]
pub struct Marker {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub radius: f64,
    pub fill_color: &'static str,
    /// Popup body (HTML)
    pub popup: String,
}

impl Marker {
    #[must_use]
    pub fn for_quake(quake: &Quake) -> Self {
        Self {
            id: quake.id.clone(),
            lat: quake.latitude,
            lon: quake.longitude,
            radius: marker_radius(quake.magnitude),
            fill_color: marker_color(quake.magnitude),
            popup: popup_html(None, quake),
        }
    }
}

/// A weighted point on the heat layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatPoint {
    pub lat: f64,
    pub lon: f64,
    pub weight: f64,
}

/// Everything the map needs to redraw its overlays.
#[derive(Debug, Clone, Serialize)]
pub struct RenderFrame {
    pub markers: Vec<Marker>,
    pub heat: Vec<HeatPoint>,
    pub marker_style: MarkerStyle,
    pub heat_radius: u32,
}

/// Build both overlays for an already filtered selection.
#[must_use]
pub fn render(events: &[&Quake]) -> RenderFrame {
    let mut markers = Vec::with_capacity(events.len());
    let mut heat = Vec::with_capacity(events.len());

    for quake in events {
        markers.push(Marker::for_quake(quake));
        heat.push(HeatPoint {
            lat: quake.latitude,
            lon: quake.longitude,
            weight: quake.magnitude,
        });
    }

    RenderFrame {
        markers,
        heat,
        marker_style: MARKER_STYLE,
        heat_radius: HEAT_RADIUS,
    }
}

/// Popup content for an event, optionally headed by a title line.
#[must_use]
pub fn popup_html(title: Option<&str>, quake: &Quake) -> String {
    let time = quake
        .time()
        .map_or_else(|| "unknown".to_string(), |t| format_event_time(&t));
    let place = escape_html(&quake.place);

    match title {
        Some(title) => format!(
            "<b>{title}</b><br>Magnitude: {mag}<br>Location: {place}<br>Time: {time}",
            title = escape_html(title),
            mag = quake.magnitude,
        ),
        None => format!(
            "<b>Magnitude {mag}</b><br>Location: {place}<br>Time: {time}",
            mag = quake.magnitude,
        ),
    }
}

/// Long-form timestamp, e.g. "March 5th 2024, 3:04:05 pm UTC".
#[must_use]
pub fn format_event_time(t: &DateTime<Utc>) -> String {
    let day = t.day();
    format!(
        "{month} {day}{suffix} {rest} UTC",
        month = t.format("%B"),
        suffix = ordinal_suffix(day),
        rest = t.format("%Y, %-I:%M:%S %P"),
    )
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Escape text for inclusion in popup HTML.
fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
