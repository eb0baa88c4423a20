// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::auth::CredentialProvider;
use crate::{AvisError, Result};
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;

pub const SCHEDULE_URL: &str =
    "https://api.lufthansa.com/v1/flight-schedules/flightschedules/passenger";

/// Carriers offered by the search form.
pub const KNOWN_AIRLINES: &[(&str, &str)] = &[
    ("LH", "Lufthansa"),
    ("OS", "Austrian Airlines"),
    ("LX", "SWISS"),
    ("SN", "Brussels Airlines"),
];

/// One entry of the passenger flight-schedule response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    pub airline: String,
    pub flight_number: u32,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
}

impl Leg {
    pub fn new(origin: &str, destination: &str) -> Self {
        Self {
            origin: Some(origin.to_string()),
            destination: Some(destination.to_string()),
        }
    }
}

/// Parses a raw schedule response body.
pub fn parse_schedule(body: &str) -> Result<Vec<FlightRecord>> {
    Ok(serde_json::from_str(body)?)
}

/// Formats a date the way the schedule API expects it (`05MAR24`).
pub fn to_ssim_date(date: NaiveDate) -> String {
    date.format("%d%b%y").to_string().to_uppercase()
}

#[derive(Debug, Clone)]
pub struct ScheduleQuery {
    pub airline: String,
    pub date: NaiveDate,
}

impl ScheduleQuery {
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let date = to_ssim_date(self.date);
        vec![
            ("airlines", self.airline.clone()),
            ("startDate", date.clone()),
            ("endDate", date),
            ("daysOfOperation", "1234567".to_string()),
            ("timeMode", "UTC".to_string()),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub delay: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(5),
            max_retries: 5,
        }
    }
}

/// Runs `op` until it succeeds, sleeping `policy.delay` between attempts.
/// Gives up with an `Api` error once `policy.max_retries` retries are spent.
pub fn with_retry<T, F>(policy: &RetryPolicy, mut op: F) -> Result<T>
where
    F: FnMut(u32) -> Result<T>,
{
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) => {
                warn!(
                    "Schedule request failed; attempt={} max_retries={} error={}",
                    attempt + 1,
                    policy.max_retries,
                    e
                );
                if attempt >= policy.max_retries {
                    return Err(AvisError::Api(format!(
                        "Unable to get proper response after {} attempts: {}",
                        attempt + 1,
                        e
                    )));
                }
            }
        }
        thread::sleep(policy.delay);
        attempt += 1;
    }
}

pub struct ScheduleClient<P: CredentialProvider> {
    http: reqwest::blocking::Client,
    credentials: P,
    endpoint: String,
    retry: RetryPolicy,
}

impl<P: CredentialProvider> ScheduleClient<P> {
    pub fn new(credentials: P, endpoint: &str, retry: RetryPolicy) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            credentials,
            endpoint: endpoint.to_string(),
            retry,
        })
    }

    /// Fetches every scheduled flight of one airline on one day.
    /// An empty vector is a valid "no results" answer.
    pub fn fetch(&mut self, query: &ScheduleQuery) -> Result<Vec<FlightRecord>> {
        info!(
            "New search request; airline={} date={}",
            query.airline, query.date
        );
        let token = self.credentials.token()?;
        let params = query.params();

        let body = with_retry(&self.retry, |_| {
            let response = self
                .http
                .get(&self.endpoint)
                .query(&params)
                .bearer_auth(&token)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()?;
            let status = response.status();
            info!("Schedule API answered; status={}", status.as_u16());
            if status != reqwest::StatusCode::OK {
                return Err(AvisError::Api(format!("status {}", status)));
            }
            Ok(response.text()?)
        })?;

        let records = parse_schedule(&body)?;
        debug!("Parsed schedule response; flights={}", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_parse_schedule_wire_names() {
        let body = r#"[{
            "airline": "LH",
            "flightNumber": 400,
            "periodOfOperationUTC": {"startDate": "05MAR24"},
            "legs": [
                {"origin": "FRA", "destination": "JFK", "aircraftType": "74H"},
                {"origin": "JFK", "destination": null}
            ]
        }]"#;
        let records = parse_schedule(body).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].airline, "LH");
        assert_eq!(records[0].flight_number, 400);
        assert_eq!(records[0].legs[0], Leg::new("FRA", "JFK"));
        assert_eq!(records[0].legs[1].destination, None);
    }

    #[test]
    fn test_parse_empty_response() {
        assert!(parse_schedule("[]").unwrap().is_empty());
    }

    #[test]
    fn test_ssim_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(to_ssim_date(date), "05MAR24");
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(to_ssim_date(date), "31DEC23");
    }

    #[test]
    fn test_query_params() {
        let query = ScheduleQuery {
            airline: "OS".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        };
        let params = query.params();
        assert!(params.contains(&("airlines", "OS".to_string())));
        assert!(params.contains(&("startDate", "15JAN24".to_string())));
        assert!(params.contains(&("endDate", "15JAN24".to_string())));
        assert!(params.contains(&("daysOfOperation", "1234567".to_string())));
        assert!(params.contains(&("timeMode", "UTC".to_string())));
    }

    #[test]
    fn test_retry_succeeds_after_failures() {
        let policy = RetryPolicy {
            delay: Duration::ZERO,
            max_retries: 5,
        };
        let calls = Cell::new(0);
        let result = with_retry(&policy, |attempt| {
            calls.set(calls.get() + 1);
            if attempt < 2 {
                Err(AvisError::Api("status 503".to_string()))
            } else {
                Ok("ok")
            }
        });
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_retry_gives_up_at_ceiling() {
        let policy = RetryPolicy {
            delay: Duration::ZERO,
            max_retries: 5,
        };
        let calls = Cell::new(0);
        let result: Result<()> = with_retry(&policy, |_| {
            calls.set(calls.get() + 1);
            Err(AvisError::Api("status 500".to_string()))
        });
        assert!(matches!(result, Err(AvisError::Api(_))));
        // One initial attempt plus five retries.
        assert_eq!(calls.get(), 6);
    }
}
