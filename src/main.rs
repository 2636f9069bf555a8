mod acquire;
mod catalog;
mod config;
mod propagate;
mod risk;
mod service;
mod store;
mod trend;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{error, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use crate::config::Config;
use crate::service::{RiskService, ServiceError};

#[derive(Parser)]
#[command(name = "bellatrix")]
#[command(about = "Orbital state and collision risk from public element catalogs")]
struct Cli {
    /// Configuration file; defaults are used when it does not exist
    #[arg(long, default_value = "bellatrix.yaml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Position of an object in TEME, ECEF and geodetic coordinates
    State {
        catalog_id: u32,
        /// RFC 3339 instant, now if omitted
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Collision risk assessment over the configured horizon
    Risk { catalog_id: u32 },
    /// Seven-day risk forecast
    Trend { catalog_id: u32 },
    /// Sampled path of an object for plotting
    Trajectory {
        catalog_id: u32,
        /// Span covered by the samples
        #[arg(long, default_value_t = 90)]
        minutes: u64,
        #[arg(long, default_value_t = 100)]
        steps: usize,
        /// RFC 3339 start instant, now if omitted
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Closest approach of two objects over the configured horizon
    Conjunction {
        primary: u32,
        secondary: u32,
        /// RFC 3339 start instant, now if omitted
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Pull the configured catalog group into the element store
    Refresh,
    /// List the objects held in the element store
    Cache,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let service = match RiskService::from_config(&config) {
        Ok(s) => s,
        Err(e) => {
            error!("Startup failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let cancel = service.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, abandoning catalog requests");
            cancel.cancel();
        }
    });

    match cli.command {
        Commands::State { catalog_id, at } => {
            let at = at.unwrap_or_else(Utc::now);
            print_json(service.resolve_state(catalog_id, at).await)
        }
        Commands::Risk { catalog_id } => print_json(service.assess_risk(catalog_id).await),
        Commands::Trend { catalog_id } => print_json(service.forecast_trend(catalog_id).await),
        Commands::Trajectory {
            catalog_id,
            minutes,
            steps,
            at,
        } => {
            let span = Duration::from_secs(minutes * 60);
            let at = at.unwrap_or_else(Utc::now);
            print_json(service.trajectory(catalog_id, at, span, steps).await)
        }
        Commands::Conjunction {
            primary,
            secondary,
            at,
        } => {
            let result = match at {
                Some(at) => service.conjunction_at(primary, secondary, at).await,
                None => service.conjunction(primary, secondary).await,
            };
            print_json(result)
        }
        Commands::Refresh => print_json(service.refresh().await),
        Commands::Cache => print_json(Ok(service.cached())),
    }
}

fn load_config(path: &Path) -> Result<Config, config::ConfigError> {
    if !path.exists() {
        warn!("{} not found, using default configuration", path.display());
        return Ok(Config::default());
    }
    Config::from_file(path)
}

fn print_json<T: Serialize>(result: Result<T, ServiceError>) -> ExitCode {
    let value = match result {
        Ok(v) => v,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to encode result: {}", e);
            ExitCode::FAILURE
        }
    }
}
