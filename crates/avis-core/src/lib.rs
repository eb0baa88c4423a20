// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod airports;
pub mod auth;
pub mod flatten;
pub mod join;
pub mod render;
pub mod schedule;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

pub use airports::{load_airports, AirportRef, AirportTable};
pub use flatten::{flatten, flatten_with, ExpansionMode, Segment};
pub use join::{join, JoinOutcome, RenderSegment};
pub use schedule::{FlightRecord, Leg};

#[derive(Error, Debug)]
pub enum AvisError {
    #[error("Flight {airline}{flight_number} has no legs")]
    InvalidRecord { airline: String, flight_number: u32 },
    #[error("Airport reference could not be loaded: {0}")]
    AirportLoad(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Schedule API error: {0}")]
    Api(String),
    #[error("Authentication failed: {0}")]
    Auth(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AvisError>;

/// Per-user configuration directory, e.g. `~/.config/aviation-visualisation`.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("org", "avis", "Aviation-Visualisation")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".avis"))
}

/// Runs the whole pipeline for one API response: flatten, then join.
///
/// Callers are expected to short-circuit on an empty response before
/// getting here; an empty slice simply yields an empty outcome.
pub fn build_routes(
    records: &[FlightRecord],
    airports: &AirportTable,
    mode: ExpansionMode,
) -> Result<JoinOutcome> {
    let segments = flatten_with(records, mode)?;
    log::debug!(
        "Flattened schedule: flights={} segments={} mode={:?}",
        records.len(),
        segments.len(),
        mode
    );
    Ok(join(&segments, airports))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_routes_end_to_end() {
        let csv = "\
iata_code,name,municipality,iso_country,latitude_deg,longitude_deg
VIE,Vienna International Airport,Vienna,AT,48.1103,16.5697
FRA,Frankfurt am Main Airport,Frankfurt,DE,50.0333,8.5706
";
        let airports = AirportTable::from_reader(csv.as_bytes()).unwrap();
        let records = schedule::parse_schedule(
            r#"[{"airline":"OS","flightNumber":121,"legs":[{"origin":"VIE","destination":"FRA"}]},
                {"airline":"OS","flightNumber":7,"legs":[{"origin":"VIE","destination":"XXX"}]}]"#,
        )
        .unwrap();

        let outcome = build_routes(&records, &airports, ExpansionMode::Legacy).unwrap();

        assert_eq!(outcome.segments.len(), 1);
        assert_eq!(outcome.segments[0].city_org, "Vienna");
        assert_eq!(outcome.segments[0].city_dest, "Frankfurt");
        assert_eq!(outcome.dropped, 1);
        assert!(outcome.missing.contains("XXX"));
    }

    #[test]
    fn test_invalid_record_message() {
        let err = AvisError::InvalidRecord {
            airline: "LH".to_string(),
            flight_number: 400,
        };
        assert_eq!(err.to_string(), "Flight LH400 has no legs");
    }
}
