//! Output formatters for the command-line views.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats for
//! event lists, and human/JSON for the statistics panel.

use std::io::{self, Write};

use serde::Serialize;

use crate::models::Quake;
use crate::render::marker_color;
use crate::stats::Statistics;

// ANSI color codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Terminal approximations of the map's marker tiers
const RED: &str = "\x1b[91m"; // mag >= 7.0
const ORANGE: &str = "\x1b[38;5;208m"; // mag >= 6.0
const YELLOW: &str = "\x1b[93m"; // mag >= 4.0
const GREEN: &str = "\x1b[92m"; // mag < 4.0

const ICON_QUAKE: &str = "🌍";

/// Output format selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// Human-readable terminal output (default)
    #[default]
    Human,
    /// JSON array
    Json,
    /// Newline-delimited JSON (one object per line)
    Ndjson,
}

impl std::str::FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Self::Human),
            "json" => Ok(Self::Json),
            "ndjson" => Ok(Self::Ndjson),
            _ => Err(format!("unknown format: {s} (expected: human, json, ndjson)")),
        }
    }
}

/// Simplified event for machine-readable output.
#[derive(Debug, Clone, Serialize)]
pub struct OutputEvent<'a> {
    pub id: &'a str,
    pub time: String,
    pub magnitude: f64,
    pub depth_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub place: &'a str,
    pub marker_color: &'static str,
    pub url: Option<&'a str>,
}

impl<'a> From<&'a Quake> for OutputEvent<'a> {
    fn from(q: &'a Quake) -> Self {
        Self {
            id: &q.id,
            time: q
                .time()
                .map_or_else(|| "unknown".into(), |t| t.to_rfc3339()),
            magnitude: q.magnitude,
            depth_km: q.depth_km,
            latitude: q.latitude,
            longitude: q.longitude,
            place: &q.place,
            marker_color: marker_color(q.magnitude),
            url: q.url.as_deref(),
        }
    }
}

/// Get the terminal color for a magnitude value.
fn magnitude_color(mag: f64) -> &'static str {
    match mag {
        m if m >= 7.0 => RED,
        m if m >= 6.0 => ORANGE,
        m if m >= 4.0 => YELLOW,
        _ => GREEN,
    }
}

/// Write events in human-readable format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, events: &[&Quake]) -> io::Result<()> {
    for event in events {
        let time = event
            .time()
            .map_or_else(|| "unknown".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        let color = magnitude_color(event.magnitude);

        writeln!(
            writer,
            "{ICON_QUAKE} {color}{BOLD}M{mag:.1}{RESET} │ \
             {DIM}{depth:>5.0}km{RESET} │ \
             {time} UTC │ \
             {place}",
            mag = event.magnitude,
            depth = event.depth_km,
            place = event.place,
        )?;
    }
    Ok(())
}

/// Write events as a JSON array.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, events: &[&Quake]) -> io::Result<()> {
    let output: Vec<OutputEvent<'_>> = events.iter().map(|q| OutputEvent::from(*q)).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write events as newline-delimited JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, events: &[&Quake]) -> io::Result<()> {
    for event in events {
        let json = serde_json::to_string(&OutputEvent::from(*event))
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        writeln!(writer, "{json}")?;
    }
    Ok(())
}

/// Write events in the specified format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_events<W: Write>(writer: &mut W, events: &[&Quake], format: Format) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, events),
        Format::Json => write_json(writer, events),
        Format::Ndjson => write_ndjson(writer, events),
    }
}

/// Write the statistics panel. NDJSON is treated like JSON on a single line.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_statistics<W: Write>(
    writer: &mut W,
    stats: &Statistics,
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => {
            let text = stats.display();
            writeln!(writer, "{BOLD}Total earthquakes:{RESET} {}", text.total)?;
            writeln!(writer, "{BOLD}Average magnitude:{RESET} {}", text.average)?;
            writeln!(writer, "{BOLD}Max magnitude:{RESET}     {}", text.max)?;
            writeln!(writer, "{BOLD}Min magnitude:{RESET}     {}", text.min)?;
            writeln!(writer, "{BOLD}Most recent:{RESET}       {}", text.most_recent)?;
            if let Statistics::Summary(s) = stats {
                writeln!(writer, "{DIM}  strongest: {}{RESET}", s.strongest.place)?;
                writeln!(writer, "{DIM}  latest:    {}{RESET}", s.most_recent.place)?;
            }
            Ok(())
        }
        Format::Json => {
            let json = serde_json::to_string_pretty(stats)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(writer, "{json}")
        }
        Format::Ndjson => {
            let json = serde_json::to_string(stats)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            writeln!(writer, "{json}")
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::fixtures::quake;

    #[test]
    fn test_format_parse() {
        assert_eq!("human".parse::<Format>().unwrap(), Format::Human);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("ndjson".parse::<Format>().unwrap(), Format::Ndjson);
        assert!("invalid".parse::<Format>().is_err());
    }

    #[test]
    fn test_ndjson_one_line_per_event() {
        let events = [quake("a", 2.5, 0, 3.0), quake("b", 8.1, 0, 30.0)];
        let refs: Vec<&Quake> = events.iter().collect();
        let mut buf = Vec::new();
        write_events(&mut buf, &refs, Format::Ndjson).unwrap();

        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["marker_color"], "#FF0000");
        assert_eq!(second["time"], "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_no_data_statistics_human() {
        let mut buf = Vec::new();
        write_statistics(&mut buf, &Statistics::compute(&[], Utc::now()), Format::Human).unwrap();

        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("Total earthquakes:"));
        assert!(text.contains('—'));
        assert!(!text.contains("NaN"));
    }
}
