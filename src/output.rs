//! Output formatters for normalized events.
//!
//! Supports human-readable (with colors), JSON, and NDJSON formats.

use std::io::{self, Write};

use chrono::{TimeZone, Utc};

use crate::ingest::NormalizedEvent;
use crate::presentation::{MagnitudeBand, Marker, Statistics, legend};

// ANSI codes
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

// Icons for visual richness
const ICON_QUAKE: &str = "🌍";
const ICON_TSUNAMI: &str = "🌊";

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

/// 24-bit foreground color for a magnitude band.
fn band_color(band: MagnitudeBand) -> String {
    let (r, g, b) = band.rgb();
    format!("\x1b[38;2;{r};{g};{b}m")
}

fn format_time(millis: Option<i64>) -> String {
    millis
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map_or_else(
            || "unknown".into(),
            |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
        )
}

/// Write events in human-readable format, colored by magnitude band.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human<W: Write>(writer: &mut W, events: &[NormalizedEvent]) -> io::Result<()> {
    for event in events {
        let band = MagnitudeBand::of(event.magnitude);
        let color = band_color(band);
        let label = band.label();
        let mag = event.magnitude;
        let time = format_time(event.time);
        let depth = event
            .depth
            .map_or_else(|| "    ?".into(), |d| format!("{d:>5.0}"));
        let place = &event.place;

        let tsunami = if event.tsunami {
            format!(" {ICON_TSUNAMI}")
        } else {
            String::new()
        };

        writeln!(
            writer,
            "{ICON_QUAKE} {color}{BOLD}M{mag:.1}{RESET} │ \
             {color}{label:10}{RESET} │ \
             {DIM}{depth}km{RESET} │ \
             {time} UTC │ \
             {place}{tsunami}"
        )?;
    }
    Ok(())
}

/// Write the statistics line shown under human output.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_summary<W: Write>(writer: &mut W, stats: &Statistics) -> io::Result<()> {
    writeln!(
        writer,
        "{DIM}─────────────────────────────────────────────────────────────────────{RESET}"
    )?;
    writeln!(
        writer,
        "Total: {BOLD}{}{RESET} │ Significant (4.0+): {BOLD}{}{RESET} │ Largest: {BOLD}M{:.1}{RESET}",
        stats.total, stats.significant, stats.max_magnitude
    )
}

/// Write the magnitude scale.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_legend<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{BOLD}Magnitude Scale{RESET}")?;
    for row in legend() {
        let color = band_color(row.band);
        writeln!(
            writer,
            "  {color}●{RESET} {:<8} {} {DIM}{}{RESET}",
            row.range, row.label, row.color
        )?;
    }
    Ok(())
}

/// Write events as a JSON array of markers.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json<W: Write>(writer: &mut W, events: &[NormalizedEvent]) -> io::Result<()> {
    let output: Vec<Marker> = events.iter().map(Marker::from).collect();
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{json}")
}

/// Write events as newline-delimited JSON.
///
/// Each event is written as a single line of JSON.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_ndjson<W: Write>(writer: &mut W, events: &[NormalizedEvent]) -> io::Result<()> {
    for event in events {
        let json = serde_json::to_string(&Marker::from(event))
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
pub fn write_events<W: Write>(
    writer: &mut W,
    events: &[NormalizedEvent],
    format: Format,
) -> io::Result<()> {
    match format {
        Format::Human => write_human(writer, events),
        Format::Json => write_json(writer, events),
        Format::Ndjson => write_ndjson(writer, events),
    }
}
