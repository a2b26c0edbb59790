//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// cloud-checkin - daily cloud storage check-in for many accounts
///
/// Signs every configured account in, performs the family check-in,
/// reports how much storage was gained and pushes the report to the
/// configured notification channels.
///
/// Examples:
///   cloud-checkin
///   cloud-checkin --config accounts.toml --exec-threshold 3
///   cloud-checkin --dry-run
///   cloud-checkin --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .cloud-checkin.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Concurrent family sign-ins per non-primary account
    #[arg(long, value_name = "COUNT", env = "EXEC_THRESHOLD")]
    pub exec_threshold: Option<usize>,

    /// Number of leading accounts treated as primary
    #[arg(long, value_name = "COUNT", env = "ACCOUNT_PERSON")]
    pub account_person: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Show the accounts, roles and enabled channels without any request
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .cloud-checkin.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.exec_threshold == Some(0) {
            return Err("Exec threshold must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.timeout == Some(0) {
            return Err("Timeout must be at least 1 second".to_string());
        }

        if let Some(ref config_path) = self.config {
            if !config_path.is_file() {
                return Err(format!(
                    "Config file does not exist: {}",
                    config_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            config: None,
            exec_threshold: None,
            account_person: None,
            timeout: None,
            verbose: false,
            quiet: false,
            dry_run: false,
            init_config: false,
        }
    }

    #[test]
    fn test_validation_defaults() {
        assert!(make_args().validate().is_ok());
    }

    #[test]
    fn test_validation_zero_threshold() {
        let mut args = make_args();
        args.exec_threshold = Some(0);
        assert!(args.validate().is_err());

        args.exec_threshold = Some(2);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_missing_config_file() {
        let mut args = make_args();
        args.config = Some(PathBuf::from("/definitely/not/here.toml"));
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_parse_flags() {
        let args = Args::try_parse_from([
            "cloud-checkin",
            "--exec-threshold",
            "3",
            "--account-person",
            "2",
            "--dry-run",
        ])
        .unwrap();
        assert_eq!(args.exec_threshold, Some(3));
        assert_eq!(args.account_person, Some(2));
        assert!(args.dry_run);
    }
}
