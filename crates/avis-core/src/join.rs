// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::airports::{AirportRef, AirportTable};
use crate::flatten::Segment;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A segment with both endpoints resolved, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSegment {
    pub airline: String,
    pub flight_number: u32,
    pub origin: String,
    pub destination: String,
    pub lat_org: f64,
    pub lon_org: f64,
    pub city_org: String,
    pub country_org: String,
    pub lat_dest: f64,
    pub lon_dest: f64,
    pub city_dest: String,
    pub country_dest: String,
}

impl RenderSegment {
    fn resolve(segment: &Segment, org: &AirportRef, dest: &AirportRef) -> Self {
        Self {
            airline: segment.airline.clone(),
            flight_number: segment.flight_number,
            origin: segment.origin.clone(),
            destination: segment.destination.clone(),
            lat_org: org.latitude,
            lon_org: org.longitude,
            city_org: org.city.clone(),
            country_org: org.country.clone(),
            lat_dest: dest.latitude,
            lon_dest: dest.longitude,
            city_dest: dest.city.clone(),
            country_dest: dest.country.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JoinOutcome {
    /// Resolved rows in input order.
    pub segments: Vec<RenderSegment>,
    /// Codes that had no reference row.
    pub missing: BTreeSet<String>,
    /// Number of input segments left out.
    pub dropped: usize,
}

/// Enriches segments with coordinates and place names.
///
/// A segment survives only if both codes resolve. Unresolvable codes are
/// collected in `missing`; once a code is known missing every segment that
/// touches it is dropped.
pub fn join(segments: &[Segment], airports: &AirportTable) -> JoinOutcome {
    info!("Filtering missing data; segments={}", segments.len());

    let outcome = segments
        .iter()
        .fold(JoinOutcome::default(), |mut acc, segment| {
            let org = lookup(airports, &segment.origin, &mut acc.missing);
            let dest = lookup(airports, &segment.destination, &mut acc.missing);
            match (org, dest) {
                (Some(org), Some(dest)) => acc
                    .segments
                    .push(RenderSegment::resolve(segment, org, dest)),
                _ => acc.dropped += 1,
            }
            acc
        });

    if outcome.dropped > 0 {
        debug!(
            "Dropped segments with unknown airports; dropped={} missing={:?}",
            outcome.dropped, outcome.missing
        );
    }
    outcome
}

fn lookup<'a>(
    airports: &'a AirportTable,
    code: &str,
    missing: &mut BTreeSet<String>,
) -> Option<&'a AirportRef> {
    if missing.contains(code) {
        return None;
    }
    let found = airports.get(code);
    if found.is_none() {
        missing.insert(code.to_string());
    }
    found
}
