// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::{AvisError, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Placeholder used by the reference data for "no IATA code assigned".
pub const NO_IATA_CODE: &str = "\\N";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirportRef {
    pub iata: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Row shape of the OurAirports `airports.csv` export. Extra columns are ignored.
#[derive(Debug, Deserialize)]
struct OurAirportsRow {
    iata_code: String,
    name: String,
    municipality: String,
    iso_country: String,
    latitude_deg: f64,
    longitude_deg: f64,
}

impl From<OurAirportsRow> for AirportRef {
    fn from(row: OurAirportsRow) -> Self {
        Self {
            iata: row.iata_code,
            name: row.name,
            city: row.municipality,
            country: row.iso_country,
            latitude: row.latitude_deg,
            longitude: row.longitude_deg,
        }
    }
}

/// Read-only airport reference keyed by IATA code.
///
/// Rows keep their file order; when a code appears more than once the
/// first row wins.
#[derive(Debug, Clone, Default)]
pub struct AirportTable {
    rows: Vec<AirportRef>,
    index: HashMap<String, usize>,
}

/// Loads the airport reference from a CSV file.
pub fn load_airports<P: AsRef<Path>>(path: P) -> Result<AirportTable> {
    AirportTable::from_path(path)
}

impl AirportTable {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Parsing airports; path={}", path.display());
        let file = File::open(path).map_err(|e| {
            AvisError::AirportLoad(format!("cannot open {}: {}", path.display(), e))
        })?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::Reader::from_reader(reader);
        let mut rows = Vec::with_capacity(10_000);
        let mut skipped = 0usize;

        for (line, result) in rdr.deserialize::<OurAirportsRow>().enumerate() {
            let mut row = result.map_err(|e| {
                AvisError::AirportLoad(format!("malformed row {}: {}", line + 2, e))
            })?;
            row.iata_code = row.iata_code.trim().to_string();
            if row.iata_code.is_empty() || row.iata_code == NO_IATA_CODE {
                skipped += 1;
                continue;
            }
            rows.push(AirportRef::from(row));
        }

        let table = Self::from_rows(rows);
        debug!(
            "Loaded airport table; airports={} skipped_without_iata={}",
            table.len(),
            skipped
        );
        Ok(table)
    }

    pub fn from_rows(rows: Vec<AirportRef>) -> Self {
        let mut index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            index.entry(row.iata.clone()).or_insert(i);
        }
        Self { rows, index }
    }

    /// Exact-match lookup by IATA code.
    pub fn get(&self, code: &str) -> Option<&AirportRef> {
        self.index.get(code).map(|&i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AirportRef> {
        self.rows.iter()
    }
}
