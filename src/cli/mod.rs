//! Command-line interface for cql-pager
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and validation
//! - Dispatching subcommands (replay, config, version)

pub mod replay;

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use tokio::runtime::Handle;
use tracing::Level;

use crate::config::Config;
use crate::error::Result;

pub use replay::{ReplayOp, ReplaySummary, replay};

/// Paged result cursor replay tool
#[derive(Parser, Debug)]
#[command(
    name = "cql-pager",
    version,
    about = "Page through recorded query results with a demand-driven cursor",
    long_about = "Replays a result set stored as JSON Lines through a fetch coordinator,
fetching one page per round-trip exactly when an operation needs more rows."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for cql-pager
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run cursor operations against a JSON Lines result
    Replay {
        /// Result rows, one JSON document per line
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Rows per page (overrides the config file)
        #[arg(short = 'p', long, value_name = "ROWS")]
        page_size: Option<u32>,

        /// Operation to run: one, several:N, all, fetch, status, stream
        #[arg(short = 'o', long = "op", value_name = "OP", default_value = "all")]
        ops: Vec<ReplayOp>,
    },

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Show version information
    Version,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from the process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Config::load_from_file(args.config_file.as_deref())?;
        Self::with_config(args, config)
    }

    /// Create a CLI interface over an already loaded configuration
    pub fn with_config(args: CliArgs, mut config: Config) -> Result<Self> {
        Self::apply_args_to_config(&mut config, &args);
        config.validate()?;

        Ok(Self { args, config })
    }

    /// Apply CLI arguments on top of the loaded configuration
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        if let Commands::Replay {
            page_size: Some(page_size),
            ..
        } = args.command
        {
            config.cursor.page_size = page_size;
        }
    }

    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Log level from verbosity flags, falling back to the config
    pub fn log_level(&self) -> Level {
        if self.args.very_verbose {
            Level::TRACE
        } else if self.args.verbose {
            Level::DEBUG
        } else {
            self.config.logging.level.to_tracing_level()
        }
    }

    /// Run the selected subcommand, writing its output to `out`
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<()> {
        match &self.args.command {
            Commands::Replay { file, ops, .. } => {
                replay(file, ops, &self.config, &Handle::current(), out).await?;
            }
            Commands::Config { show, validate } => {
                if *validate {
                    writeln!(out, "Configuration is valid")?;
                }
                if *show || !*validate {
                    write!(out, "{}", self.config.to_toml()?)?;
                }
            }
            Commands::Version => {
                writeln!(out, "cql-pager {}", crate::version())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interface(argv: &[&str]) -> CliInterface {
        let args = CliArgs::try_parse_from(argv).unwrap();
        CliInterface::with_config(args, Config::default()).unwrap()
    }

    #[test]
    fn test_replay_args() {
        let args = CliArgs::try_parse_from([
            "cql-pager", "replay", "rows.jsonl", "-p", "3", "--op", "several:4", "--op", "one",
        ])
        .unwrap();

        match args.command {
            Commands::Replay {
                file,
                page_size,
                ops,
            } => {
                assert_eq!(file, PathBuf::from("rows.jsonl"));
                assert_eq!(page_size, Some(3));
                assert_eq!(ops, vec![ReplayOp::Several(4), ReplayOp::One]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_replay_defaults_to_all() {
        let args = CliArgs::try_parse_from(["cql-pager", "replay", "rows.jsonl"]).unwrap();
        match args.command {
            Commands::Replay { ops, .. } => assert_eq!(ops, vec![ReplayOp::All]),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_invalid_op_rejected() {
        let result = CliArgs::try_parse_from(["cql-pager", "replay", "rows.jsonl", "--op", "drop"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_page_size_flag_overrides_config() {
        let cli = interface(&["cql-pager", "replay", "rows.jsonl", "--page-size", "9"]);
        assert_eq!(cli.config().cursor.page_size, 9);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let args = CliArgs::try_parse_from(["cql-pager", "replay", "rows.jsonl", "-p", "0"]).unwrap();
        assert!(CliInterface::with_config(args, Config::default()).is_err());
    }

    #[test]
    fn test_explicit_config_file_is_loaded() {
        let path = std::env::temp_dir().join(format!("cql-pager-cli-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[cursor]\nstream_batch = 7\n").unwrap();

        let args =
            CliArgs::try_parse_from(["cql-pager", "-c", path.to_str().unwrap(), "version"]).unwrap();
        let config = Config::from_file(&path).unwrap();
        let cli = CliInterface::with_config(args, config).unwrap();
        assert_eq!(cli.config().cursor.stream_batch, 7);
        assert_eq!(cli.args().config_file.as_deref(), Some(path.as_path()));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(interface(&["cql-pager", "-v", "version"]).log_level(), Level::DEBUG);
        assert_eq!(interface(&["cql-pager", "--vv", "version"]).log_level(), Level::TRACE);
    }

    #[tokio::test]
    async fn test_config_show_prints_toml() {
        let cli = interface(&["cql-pager", "config", "--show"]);
        let mut out = Vec::new();
        cli.run(&mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("[cursor]"));
        assert!(text.contains("page_size"));
    }
}
