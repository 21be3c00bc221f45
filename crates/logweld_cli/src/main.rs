//! logweld CLI
//!
//! Command-line tools for commit-log maintenance.
//!
//! # Commands
//!
//! - `combine-commit-logs` - Combine old commit-log segments to reduce startup time
//! - `status` - Show segment counts, sentinel and backup state
//! - `unlock` - Remove a leftover sentinel after manual recovery

mod commands;

use clap::{Args, Parser, Subcommand};
use logweld_core::{
    CombineConfig, DEFAULT_LOG_NAME, DEFAULT_LOG_SUFFIX, DEFAULT_RETENTION_WINDOW,
    DEFAULT_TARGET_SIZE, DEFAULT_TOTAL_CAP,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Commit-log maintenance tools.
#[derive(Parser)]
#[command(name = "logweld")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Location of a commit log.
#[derive(Args, Debug)]
struct LogArgs {
    /// Base storage path holding the commit-log directory
    path: PathBuf,

    /// Name of the log stream
    #[arg(long, default_value = DEFAULT_LOG_NAME)]
    name: String,

    /// Commit-log directory suffix
    #[arg(long, default_value = DEFAULT_LOG_SUFFIX)]
    suffix: String,
}

impl LogArgs {
    fn into_config(self) -> CombineConfig {
        CombineConfig::new(self.path)
            .with_log_name(self.name)
            .with_log_suffix(self.suffix)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Combine commit logs to reduce startup time
    CombineCommitLogs {
        #[command(flatten)]
        log: LogArgs,

        /// Number of newest segments never touched
        #[arg(long, default_value_t = DEFAULT_RETENTION_WINDOW)]
        retain: usize,

        /// Maximum number of segments combined in one run
        #[arg(long, default_value_t = DEFAULT_TOTAL_CAP)]
        max_files: usize,

        /// Target size of combined segments in bytes
        #[arg(long, default_value_t = DEFAULT_TARGET_SIZE)]
        target_size: u64,

        /// Seconds to wait after creating the sentinel
        #[arg(long, default_value_t = 120)]
        grace_period: u64,

        /// Dry run - show what would be combined
        #[arg(short, long)]
        dry_run: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show commit-log maintenance state
    Status {
        #[command(flatten)]
        log: LogArgs,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Remove the sentinel after manual recovery
    Unlock {
        #[command(flatten)]
        log: LogArgs,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::CombineCommitLogs {
            log,
            retain,
            max_files,
            target_size,
            grace_period,
            dry_run,
            format,
        } => {
            let config = log
                .into_config()
                .with_retention_window(retain)
                .with_total_cap(max_files)
                .with_target_size(target_size)
                .with_grace_period(Duration::from_secs(grace_period))
                .with_dry_run(dry_run);
            commands::combine::run(&config, &format)?;
        }
        Commands::Status { log, format } => {
            commands::status::run(&log.into_config(), &format)?;
        }
        Commands::Unlock { log } => {
            commands::unlock::run(&log.into_config())?;
        }
        Commands::Version => {
            println!("logweld CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("logweld core v{}", logweld_core::VERSION);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn combine_defaults() {
        let cli = Cli::try_parse_from(["logweld", "combine-commit-logs", "/data/shard0"]).unwrap();
        let Commands::CombineCommitLogs {
            log,
            retain,
            max_files,
            grace_period,
            dry_run,
            ..
        } = cli.command
        else {
            panic!("expected combine-commit-logs");
        };
        assert_eq!(retain, 10);
        assert_eq!(max_files, 400);
        assert_eq!(grace_period, 120);
        assert!(!dry_run);
        assert_eq!(
            log.into_config().layout().live_dir(),
            PathBuf::from("/data/shard0/main.hnsw.commitlog.d")
        );
    }

    #[test]
    fn combine_requires_exactly_one_path() {
        assert!(Cli::try_parse_from(["logweld", "combine-commit-logs"]).is_err());
        assert!(Cli::try_parse_from(["logweld", "combine-commit-logs", "/a", "/b"]).is_err());
    }

    #[test]
    fn unlock_accepts_custom_layout() {
        let cli = Cli::try_parse_from([
            "logweld", "unlock", "/data", "--name", "vectors", "--suffix", "wal.d",
        ])
        .unwrap();
        let Commands::Unlock { log } = cli.command else {
            panic!("expected unlock");
        };
        assert_eq!(
            log.into_config().layout().live_dir(),
            PathBuf::from("/data/vectors.wal.d")
        );
    }
}
