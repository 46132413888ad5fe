//! CLI definitions using clap.

use crate::config::Workmode;
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub mod commands;

/// Calendar - store and query calendar events
#[derive(Parser, Debug)]
#[command(name = "calendar", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (default: ./calendar.toml, ./configs/calendar.toml, user config dir)
    #[arg(long, global = true, env = "CALENDAR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Storage backend, overriding the settings file (memory, sqlite)
    #[arg(long, global = true, value_parser = parse_workmode)]
    pub workmode: Option<Workmode>,

    /// SQLite connection string, overriding the settings file
    #[arg(long, global = true)]
    pub dsn: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no log output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Event management
    Event {
        #[command(subcommand)]
        command: EventCommands,
    },

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ============================================================================
// Event Commands
// ============================================================================

#[derive(Subcommand, Debug)]
pub enum EventCommands {
    /// Create an event and print its ID
    Create(EventArgs),

    /// Show one event
    Get {
        /// Event ID
        id: i64,
    },

    /// Replace every field of an event
    Update {
        /// Event ID
        id: i64,

        #[command(flatten)]
        event: EventArgs,
    },

    /// Delete an event
    Delete {
        /// Event ID
        id: i64,
    },

    /// List events ordered by start time
    List(ListArgs),
}

/// Fields of an event, shared by create and update.
#[derive(Args, Debug, Clone)]
pub struct EventArgs {
    /// Title
    #[arg(long)]
    pub title: String,

    /// Start time (RFC 3339, e.g. 2025-09-15T10:00:00+02:00)
    #[arg(long, value_parser = parse_timestamp)]
    pub start: DateTime<Utc>,

    /// End time (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub end: DateTime<Utc>,

    /// Owning user ID
    #[arg(long)]
    pub user: i64,

    /// Description
    #[arg(short, long, default_value = "")]
    pub description: String,

    /// Reminder lead time (e.g. 15m, 1h 30m)
    #[arg(long, value_parser = parse_period)]
    pub notify: Option<Duration>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only events owned by this user
    #[arg(long)]
    pub user: Option<i64>,

    /// Only events starting at or after this time (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub from: Option<DateTime<Utc>>,

    /// Only events starting at or before this time (RFC 3339)
    #[arg(long, value_parser = parse_timestamp)]
    pub to: Option<DateTime<Utc>>,
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{s}': {e} (expected RFC 3339)"))
}

fn parse_period(s: &str) -> Result<Duration, String> {
    humantime::parse_duration(s.trim()).map_err(|e| format!("invalid duration '{s}': {e}"))
}

fn parse_workmode(s: &str) -> Result<Workmode, String> {
    s.parse().map_err(|e: crate::Error| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_create() {
        let cli = Cli::try_parse_from([
            "calendar",
            "event",
            "create",
            "--title",
            "standup",
            "--start",
            "2025-09-15T10:00:00+02:00",
            "--end",
            "2025-09-15T10:15:00+02:00",
            "--user",
            "42",
            "--notify",
            "10m",
        ])
        .unwrap();

        let Commands::Event {
            command: EventCommands::Create(args),
        } = cli.command
        else {
            panic!("expected event create");
        };
        assert_eq!(args.title, "standup");
        assert_eq!(args.start, Utc.with_ymd_and_hms(2025, 9, 15, 8, 0, 0).unwrap());
        assert_eq!(args.user, 42);
        assert_eq!(args.notify, Some(Duration::from_secs(600)));
        assert!(args.description.is_empty());
    }

    #[test]
    fn test_global_overrides() {
        let cli = Cli::try_parse_from([
            "calendar",
            "event",
            "list",
            "--workmode",
            "sqlite",
            "--dsn",
            "events.db",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.workmode, Some(Workmode::Sqlite));
        assert_eq!(cli.dsn.as_deref(), Some("events.db"));
        assert!(cli.json);
    }

    #[test]
    fn test_rejects_bad_input() {
        assert!(Cli::try_parse_from(["calendar", "event", "list", "--from", "yesterday"]).is_err());
        assert!(Cli::try_parse_from(["calendar", "--workmode", "postgres", "version"]).is_err());
    }
}
