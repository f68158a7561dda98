//! Command-line interface definitions.
//!
//! All arguments and subcommands are defined with the clap derive API,
//! with global verbosity options and one subcommand per operation.
//!
//! # Example
//!
//! ```bash
//! # Run every rule declared under the current directory
//! hashmake run
//!
//! # Run rules under a project tree against a shared store,
//! # evicting entries unused for 30 days
//! hashmake run ~/src/project --db ~/.cache/hashmake.db --keep 30d
//!
//! # Show discovered rules and their task identifiers
//! hashmake list ~/src/project
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Content-hash based incremental build skipper.
///
/// Hashmake decides whether a build step's outputs are already correct
/// from cryptographic hashes of its declared files and command, never
/// from modification times, and skips the step on a match.
#[derive(Debug, Parser)]
#[command(name = "hashmake")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v echoes subprocess output and cache hits,
    /// -vv adds trace logging)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover rules under a directory tree and run the stale ones
    Run(RunArgs),
    /// List discovered rules without running anything
    List(ListArgs),
}

/// Arguments for the run subcommand.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Root directory to search for .hashmake.json rule files
    #[arg(value_name = "DIR", default_value = ".")]
    pub path: PathBuf,

    /// Path to the persistent hash store
    #[arg(long, value_name = "PATH", default_value = ".hashmake.db", env = "HASHMAKE_DB")]
    pub db: PathBuf,

    /// Evict store entries unused for this long (e.g. 90s, 30m, 12h, 30d)
    ///
    /// Without this flag entries are kept forever.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub keep: Option<Duration>,
}

/// Arguments for the list subcommand.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Root directory to search for .hashmake.json rule files
    #[arg(value_name = "DIR", default_value = ".")]
    pub path: PathBuf,
}

/// Parse a human-readable duration into a [`Duration`].
///
/// Supports suffixes: s, m, h, d, w. Case-insensitive. A bare number is
/// treated as seconds.
///
/// # Examples
///
/// ```
/// use hashmake::cli::parse_duration;
/// use std::time::Duration;
///
/// assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
/// assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
/// assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
/// assert_eq!(parse_duration("30d").unwrap(), Duration::from_secs(2_592_000));
/// ```
///
/// # Errors
///
/// Returns an error for an empty string, an invalid number, or an
/// unknown suffix.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Duration cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit()) {
        Some(idx) => (&s[..idx], s[idx..].trim().to_lowercase()),
        None => (s, String::new()),
    };

    let value: u64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number in duration: '{s}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        "w" => 604_800,
        other => return Err(format!("Unknown duration suffix: '{other}'")),
    };

    value
        .checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("Duration overflows: '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_duration_bare_seconds() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_suffixes() {
        assert_eq!(parse_duration("10s").unwrap(), Duration::from_secs(10));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_duration("1w").unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn parse_duration_case_and_whitespace() {
        assert_eq!(parse_duration(" 3H ").unwrap(), Duration::from_secs(10_800));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10y").is_err());
        assert!(parse_duration("-5s").is_err());
    }

    #[test]
    fn run_args_defaults() {
        let cli = Cli::try_parse_from(["hashmake", "run"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.path, PathBuf::from("."));
                assert_eq!(args.db, PathBuf::from(".hashmake.db"));
                assert!(args.keep.is_none());
            }
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn keep_flag_parses() {
        let cli = Cli::try_parse_from(["hashmake", "run", "--keep", "30d"]).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.keep, Some(Duration::from_secs(2_592_000)));
            }
            _ => panic!("expected run subcommand"),
        }
    }
}
