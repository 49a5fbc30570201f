//! Command-line interface for animeon.

pub mod commands;

use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

/// animeon - anime streaming catalog and community backend
#[derive(Parser)]
#[command(name = "animeon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server and the schedule dispatcher
    #[command(alias = "web")]
    Serve,

    /// Run the task queue consumer
    Consume,

    /// Run a management command
    #[command(alias = "m")]
    Manage {
        /// Command name, e.g. `finalise_deploy`
        command: String,

        /// `--key value` options passed to the command
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Schedule a management command on the task queue
    Schedule {
        /// Command name
        command: String,

        /// Run once at this time (RFC 3339, or `%Y-%m-%dT%H:%M:%S` in UTC)
        #[arg(long, conflicts_with = "expression")]
        at: Option<String>,

        /// `at(...)`, `rate(...)` or `cron(...)` expression
        #[arg(long)]
        expression: Option<String>,

        /// Keyword argument as `key=value`; repeatable
        #[arg(long = "kwarg", value_name = "KEY=VALUE")]
        kwargs: Vec<String>,

        /// Positional arguments
        args: Vec<String>,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

/// Parses `--at`; a naive timestamp is taken as UTC.
///
/// # Errors
///
/// Returns an error when the value matches neither format.
pub fn parse_start_time(value: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(value) {
        return Ok(instant.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| anyhow::anyhow!("Invalid --at value '{value}': {e}"))?;
    Ok(naive.and_utc())
}

/// Splits repeated `--kwarg key=value` pairs.
///
/// # Errors
///
/// Returns an error for an entry without `=`.
pub fn parse_kwargs(pairs: &[String]) -> anyhow::Result<Map<String, Value>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), Value::String(v.to_string())))
                .ok_or_else(|| anyhow::anyhow!("Invalid --kwarg '{pair}', expected key=value"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn start_time_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_start_time("2026-03-01T12:30:00").unwrap(), expected);
        assert_eq!(
            parse_start_time("2026-03-01T14:30:00+02:00").unwrap(),
            expected
        );
        assert!(parse_start_time("tomorrow").is_err());
    }

    #[test]
    fn kwargs_pairs() {
        let kwargs = parse_kwargs(&["keyword=one piece".to_string()]).unwrap();
        assert_eq!(kwargs["keyword"], "one piece");
        assert!(parse_kwargs(&["keyword".to_string()]).is_err());
    }

    #[test]
    fn manage_keeps_trailing_flags() {
        let cli = Cli::parse_from([
            "animeon",
            "manage",
            "myanimelist_update_releases",
            "--keyword",
            "bleach",
        ]);
        let Some(Commands::Manage { command, args }) = cli.command else {
            panic!("expected manage");
        };
        assert_eq!(command, "myanimelist_update_releases");
        assert_eq!(args, vec!["--keyword", "bleach"]);
    }
}
