// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::schedule::FlightRecord;
use crate::{AvisError, Result};
use serde::{Deserialize, Serialize};

/// A directed origin -> destination hop, one drawable map edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub airline: String,
    pub flight_number: u32,
    pub origin: String,
    pub destination: String,
}

/// How multi-leg itineraries are broken into segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpansionMode {
    /// Reproduces the historical output: a single stop yields only
    /// `stop -> destination`. With two or more stops, every stop whose code
    /// equals the first stop's yields `origin -> stop` and any other stop
    /// yields a `stop -> stop` self-loop, which the filter then drops.
    #[default]
    Legacy,
    /// One segment per adjacent pair of `[origin, stops.., destination]`.
    HopByHop,
}

/// Flattens flight records with the legacy expansion.
pub fn flatten(records: &[FlightRecord]) -> Result<Vec<Segment>> {
    flatten_with(records, ExpansionMode::Legacy)
}

/// Flattens flight records into segments and drops every segment that is
/// a self-loop or has a missing endpoint.
///
/// Fails with `InvalidRecord` on the first flight without legs.
pub fn flatten_with(records: &[FlightRecord], mode: ExpansionMode) -> Result<Vec<Segment>> {
    let mut segments = Vec::with_capacity(records.len());

    for record in records {
        let pairs = match mode {
            ExpansionMode::Legacy => legacy_pairs(record)?,
            ExpansionMode::HopByHop => hop_pairs(record)?,
        };

        segments.extend(pairs.into_iter().filter_map(|(origin, destination)| {
            let origin = usable_code(origin)?;
            let destination = usable_code(destination)?;
            (origin != destination).then(|| Segment {
                airline: record.airline.clone(),
                flight_number: record.flight_number,
                origin: origin.to_string(),
                destination: destination.to_string(),
            })
        }));
    }

    Ok(segments)
}

type CodePair<'a> = (Option<&'a str>, Option<&'a str>);

fn usable_code(code: Option<&str>) -> Option<&str> {
    code.filter(|c| *c != "nan")
}

fn check_legs(record: &FlightRecord) -> Result<()> {
    if record.legs.is_empty() {
        return Err(AvisError::InvalidRecord {
            airline: record.airline.clone(),
            flight_number: record.flight_number,
        });
    }
    Ok(())
}

fn legacy_pairs(record: &FlightRecord) -> Result<Vec<CodePair<'_>>> {
    check_legs(record)?;
    let legs = &record.legs;
    let origin = legs[0].origin.as_deref();
    let destination = legs[legs.len() - 1].destination.as_deref();

    if legs.len() == 1 {
        return Ok(vec![(origin, destination)]);
    }

    let stops: Vec<Option<&str>> = legs[..legs.len() - 1]
        .iter()
        .map(|leg| leg.destination.as_deref())
        .collect();

    if let [stop] = stops.as_slice() {
        return Ok(vec![(*stop, destination)]);
    }

    // First-stop matching is by code, so a repeated first stop is
    // emitted again from the origin.
    let first = stops[0];
    Ok(stops
        .iter()
        .map(|&stop| if stop == first { (origin, stop) } else { (stop, stop) })
        .collect())
}

fn hop_pairs(record: &FlightRecord) -> Result<Vec<CodePair<'_>>> {
    check_legs(record)?;
    let legs = &record.legs;

    let mut points = Vec::with_capacity(legs.len() + 1);
    points.push(legs[0].origin.as_deref());
    points.extend(legs.iter().map(|leg| leg.destination.as_deref()));

    Ok(points.windows(2).map(|w| (w[0], w[1])).collect())
}
