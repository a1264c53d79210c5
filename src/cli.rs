//! Command-line interface parsing for schedbot
//!
//! This module handles parsing of CLI arguments using clap. Every option can
//! also be supplied through an environment variable (or a `.env` file loaded
//! before parsing).

use clap::{Parser, Subcommand};
use std::time::Duration;
use thiserror::Error;

use crate::refresh::RefreshConfig;
use crate::source::{DEFAULT_API_URL, DEFAULT_GROUP_ID};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified day name is not recognized
    #[error("Invalid day: '{0}'. Valid days: mon, tue, wed, thu, fri, sat (or 1-6)")]
    InvalidDay(String),
}

/// schedbot - weekly class schedule bot
#[derive(Parser, Debug)]
#[command(name = "schedbot")]
#[command(about = "Serve the weekly class schedule from an in-memory cache")]
#[command(version)]
pub struct Cli {
    /// Timetable API endpoint
    #[arg(long, env = "SCHEDBOT_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,

    /// Group record number sent to the timetable API
    #[arg(long, env = "SCHEDBOT_GROUP_ID", default_value_t = DEFAULT_GROUP_ID)]
    pub group_id: u64,

    /// Seconds a fetched schedule stays fresh (at least 1)
    #[arg(
        long,
        env = "SCHEDBOT_SCHEDULE_TTL_SECS",
        default_value_t = 43200,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub schedule_ttl_secs: u64,

    /// Seconds used for cache entries written without an explicit TTL
    #[arg(long, env = "SCHEDBOT_DEFAULT_TTL_SECS", default_value_t = 43200)]
    pub default_ttl_secs: u64,

    /// Seconds between sweeps of expired cache entries (0 disables sweeping)
    #[arg(long, env = "SCHEDBOT_SWEEP_INTERVAL_SECS", default_value_t = 43200)]
    pub sweep_interval_secs: u64,

    /// Seconds a stale schedule is served again after a failed refresh (at least 1)
    #[arg(
        long,
        env = "SCHEDBOT_STALE_RETRY_SECS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub stale_retry_secs: u64,

    /// Timeout in seconds for requests to the timetable API (at least 1)
    #[arg(
        long,
        env = "SCHEDBOT_TIMEOUT_SECS",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What the binary should do
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read chat messages from stdin, one per line, and print replies (default)
    Chat,
    /// Print the schedule of one day
    Show {
        /// Day of the week: mon..sat, a Russian short name, or 1-6
        day: String,
        /// Show the other week variant instead of the current one
        #[arg(long)]
        next: bool,
    },
    /// Print the week header and menu
    Week {
        /// Show the next week instead of the current one
        #[arg(long)]
        next: bool,
    },
}

/// Runtime settings derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub group_id: u64,
    pub default_ttl: Duration,
    pub sweep_interval: Duration,
    pub request_timeout: Duration,
    pub refresh: RefreshConfig,
}

impl Settings {
    /// Creates settings from parsed CLI arguments
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            api_url: cli.api_url.clone(),
            group_id: cli.group_id,
            default_ttl: Duration::from_secs(cli.default_ttl_secs),
            sweep_interval: Duration::from_secs(cli.sweep_interval_secs),
            request_timeout: Duration::from_secs(cli.timeout_secs),
            refresh: RefreshConfig {
                schedule_ttl: Duration::from_secs(cli.schedule_ttl_secs),
                stale_retry: Duration::from_secs(cli.stale_retry_secs),
            },
        }
    }
}

/// Parses a day argument into a zero-based day index (0 = Monday).
///
/// Matching is case-insensitive and supports aliases:
/// - "mon" | "monday" | "пн" | "1" -> 0
/// - ...
/// - "sat" | "saturday" | "сб" | "6" -> 5
///
/// # Returns
/// * `Ok(usize)` if the string names a study day
/// * `Err(CliError::InvalidDay)` otherwise
pub fn parse_day_arg(s: &str) -> Result<usize, CliError> {
    match s.trim().to_lowercase().as_str() {
        "mon" | "monday" | "пн" | "понедельник" | "1" => Ok(0),
        "tue" | "tuesday" | "вт" | "вторник" | "2" => Ok(1),
        "wed" | "wednesday" | "ср" | "среда" | "3" => Ok(2),
        "thu" | "thursday" | "чт" | "четверг" | "4" => Ok(3),
        "fri" | "friday" | "пт" | "пятница" | "5" => Ok(4),
        "sat" | "saturday" | "сб" | "суббота" | "6" => Ok(5),
        _ => Err(CliError::InvalidDay(s.to_string())),
    }
}
