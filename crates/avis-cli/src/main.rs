// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use anyhow::{Context, Result};
use avis_core::auth::{CredentialProvider, OAuthTokenProvider, StaticToken};
use avis_core::schedule::{self, ScheduleClient, ScheduleQuery, KNOWN_AIRLINES};
use avis_core::settings::{Settings, SettingsManager};
use avis_core::{build_routes, AirportRef, AirportTable, ExpansionMode, FlightRecord, RenderSegment};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use log::{debug, info, warn, LevelFilter};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

const NO_RESULTS: &str = "No flights have been found for the given search parameters.";

#[derive(Parser)]
#[command(name = "avis", author, version, about, long_about = None)]
struct Cli {
    /// OurAirports CSV export used to place airports on the map
    #[arg(short, long, env = "AVIS_AIRPORTS")]
    airports: Option<PathBuf>,

    /// Settings file (defaults to settings.json in the user config dir)
    #[arg(long, env = "AVIS_SETTINGS")]
    settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the schedule API and draw the routes
    Search {
        /// Airline code, e.g. LH
        #[arg(long, default_value = "OS")]
        airline: String,
        /// Flight date as YYYY-MM-DD
        #[arg(long, value_parser = parse_date)]
        date: NaiveDate,
        #[arg(long, env = "LH_CLIENT_ID")]
        client_id: Option<String>,
        #[arg(long, env = "LH_CLIENT_SECRET", hide_env_values = true)]
        client_secret: Option<String>,
        /// Bearer token issued elsewhere; skips the client-credentials grant
        #[arg(long, env = "LH_ACCESS_TOKEN", hide_env_values = true)]
        token: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Draw the routes of a saved schedule response, without network access
    Render {
        /// JSON file holding a schedule API response
        #[arg(long)]
        response: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the reference row for an IATA code
    Airport { code: String },
    /// List reference airports, optionally for one ISO country
    Airports {
        #[arg(long)]
        country: Option<String>,
    },
    /// Print the effective settings
    Settings {
        /// Write the effective settings to the settings file
        #[arg(long)]
        init: bool,
    },
    /// List the airlines offered by the search form
    Airlines,
}

#[derive(clap::Args, Debug, Clone)]
struct OutputArgs {
    /// Output file; defaults to flights.<format>
    #[arg(short, long)]
    out: Option<PathBuf>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Html)]
    format: OutputFormat,
    /// Expand multi-stop flights hop by hop instead of the legacy expansion
    #[arg(long)]
    hop_by_hop: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Html,
    Json,
    Csv,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Html => "html",
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
        }
    }
}

impl OutputArgs {
    fn path(&self) -> PathBuf {
        self.out
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("flights.{}", self.format.extension())))
    }

    fn mode(&self, settings: &Settings) -> ExpansionMode {
        if self.hop_by_hop {
            ExpansionMode::HopByHop
        } else {
            settings.expansion
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("{s} is not a YYYY-MM-DD date: {e}"))
}

fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("avis")
        .build();
    if let Err(e) = TermLogger::init(level, config, TerminalMode::Mixed, ColorChoice::Auto) {
        debug!("Logger already installed: {}", e);
    }
}

fn load_airports(cli_path: Option<&Path>, settings: &Settings) -> Result<AirportTable> {
    let path = cli_path.unwrap_or(settings.airports_path.as_path());
    avis_core::load_airports(path)
        .with_context(|| format!("Cannot start without airport reference {}", path.display()))
}

fn fetch_records<P: CredentialProvider>(
    credentials: P,
    settings: &Settings,
    query: &ScheduleQuery,
) -> Result<Vec<FlightRecord>> {
    let mut client =
        ScheduleClient::new(credentials, &settings.schedule_url, settings.retry_policy())?;
    Ok(client.fetch(query)?)
}

fn airports_in<'a>(
    airports: &'a AirportTable,
    country: Option<&'a str>,
) -> impl Iterator<Item = &'a AirportRef> + 'a {
    airports
        .iter()
        .filter(move |a| country.map_or(true, |c| a.country.eq_ignore_ascii_case(c)))
}

/// Runs the pipeline on one response and writes the result.
/// Returns `None` when the response held no flights.
fn process(
    records: &[FlightRecord],
    airports: &AirportTable,
    output: &OutputArgs,
    settings: &Settings,
) -> Result<Option<PathBuf>> {
    if records.is_empty() {
        return Ok(None);
    }

    let outcome = build_routes(records, airports, output.mode(settings))?;
    if !outcome.missing.is_empty() {
        warn!(
            "Some airports are not in the reference; dropped={} missing={:?}",
            outcome.dropped, outcome.missing
        );
    }

    let path = output.path();
    write_output(&outcome.segments, output.format, &path)?;
    info!(
        "Wrote route map; routes={} path={}",
        outcome.segments.len(),
        path.display()
    );
    Ok(Some(path))
}

fn write_output(rows: &[RenderSegment], format: OutputFormat, path: &Path) -> Result<()> {
    match format {
        OutputFormat::Html => {
            let html = avis_core::render::render_html(rows)?;
            fs::write(path, html).context("Failed to write map page")?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(rows)?;
            fs::write(path, json).context("Failed to write route table")?;
        }
        OutputFormat::Csv => {
            let file = File::create(path).context("Failed to create route table")?;
            avis_core::render::write_csv(rows, file)?;
        }
    }
    Ok(())
}

fn report(written: Option<PathBuf>) {
    match written {
        Some(path) => println!("Route map written to {}", path.display()),
        None => println!("{}", NO_RESULTS),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let manager = cli
        .settings
        .as_ref()
        .map(SettingsManager::new)
        .unwrap_or_default();
    let settings = manager
        .load()
        .with_context(|| format!("Failed to read settings {}", manager.path().display()))?;

    match &cli.command {
        Commands::Search {
            airline,
            date,
            client_id,
            client_secret,
            token,
            output,
        } => {
            let airports = load_airports(cli.airports.as_deref(), &settings)?;
            let query = ScheduleQuery {
                airline: airline.to_uppercase(),
                date: *date,
            };

            let records = match token {
                Some(token) => fetch_records(StaticToken(token.clone()), &settings, &query)?,
                None => {
                    let client_id = client_id
                        .clone()
                        .or_else(|| settings.client_id.clone())
                        .ok_or_else(|| {
                            anyhow::anyhow!("No client id. Pass --client-id or set LH_CLIENT_ID.")
                        })?;
                    let client_secret = client_secret.clone().ok_or_else(|| {
                        anyhow::anyhow!(
                            "No client secret. Pass --client-secret or set LH_CLIENT_SECRET."
                        )
                    })?;
                    let credentials =
                        OAuthTokenProvider::new(&client_id, &client_secret, &settings.token_url)?;
                    fetch_records(credentials, &settings, &query)?
                }
            };
            report(process(&records, &airports, output, &settings)?);
        }
        Commands::Render { response, output } => {
            let airports = load_airports(cli.airports.as_deref(), &settings)?;
            let body = fs::read_to_string(response)
                .with_context(|| format!("Failed to read {}", response.display()))?;
            let records = schedule::parse_schedule(&body)?;
            report(process(&records, &airports, output, &settings)?);
        }
        Commands::Airport { code } => {
            let airports = load_airports(cli.airports.as_deref(), &settings)?;
            match airports.get(&code.to_uppercase()) {
                Some(a) => println!(
                    "{} {} ({}, {}) lat={:.4} lon={:.4}",
                    a.iata, a.name, a.city, a.country, a.latitude, a.longitude
                ),
                None => println!("No airport with IATA code '{}'", code),
            }
        }
        Commands::Airports { country } => {
            let airports = load_airports(cli.airports.as_deref(), &settings)?;
            for a in airports_in(&airports, country.as_deref()) {
                println!("{}  {} ({}, {})", a.iata, a.name, a.city, a.country);
            }
        }
        Commands::Settings { init } => {
            if *init {
                manager
                    .save(&settings)
                    .with_context(|| format!("Failed to write {}", manager.path().display()))?;
                info!("Wrote settings; path={}", manager.path().display());
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Commands::Airlines => {
            for (code, name) in KNOWN_AIRLINES {
                println!("{}  {}", code, name);
            }
        }
    }

    Ok(())
}
