//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser, the [`Commands`] enum for
//! subcommands (run, validate, parse), and their associated argument
//! structs. Server flags have environment variable equivalents for
//! container deployments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "request-debug",
    version,
    about = "HTTP request/response introspection middleware",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        request-debug run                        Start with ./request-debug.yaml\n  \
        request-debug run -c routes.yaml         Start with a specific config\n  \
        request-debug parse tag=api log_level=debug   Check a directive"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the configured routes behind their debug handlers
    Run(Box<RunArgs>),

    /// Validate a config file without starting
    Validate(ValidateArgs),

    /// Parse a debug directive and print the resulting settings
    Parse(ParseArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        request-debug run                                  Auto-detect config\n  \
        request-debug run -c routes.yaml                   Specific config file\n  \
        request-debug run -c routes.yaml -p 8080 --pretty  Local dev mode")]
pub struct RunArgs {
    /// Config file path (.yaml, .json, .toml)
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Listen port
    #[arg(short, long, env = "PORT", default_value_t = 9080)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    // -- Logging --
    /// Log level
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, conflicts_with = "pretty")]
    pub json: bool,

    // -- Tuning --
    /// Max request body size in bytes
    #[arg(
        long,
        env = "MAX_BODY_SIZE",
        default_value_t = 1_048_576,
        help_heading = "Tuning"
    )]
    pub max_body: usize,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Config file to validate
    #[arg(default_value = "request-debug.yaml")]
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        request-debug parse                                  Bare directive\n  \
        request-debug parse tag=api disabled=no              Tagged handler\n  \
        request-debug parse 'uri_filter=\"^/admin\"' response_debug=yes")]
pub struct ParseArgs {
    /// Directive arguments, each `key=value`
    pub args: Vec<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_collects_directive_arguments() {
        let cli = Cli::try_parse_from(["request-debug", "parse", "tag=api", "disabled=no"]).unwrap();
        match cli.command {
            Some(Commands::Parse(args)) => assert_eq!(args.args, ["tag=api", "disabled=no"]),
            _ => panic!("expected parse subcommand"),
        }
    }

    #[test]
    fn run_defaults() {
        let cli = Cli::try_parse_from(["request-debug", "run"]).unwrap();
        match cli.command {
            Some(Commands::Run(args)) => {
                assert_eq!(args.port, 9080);
                assert_eq!(args.max_body, 1_048_576);
            }
            _ => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn json_and_pretty_conflict() {
        assert!(Cli::try_parse_from(["request-debug", "run", "--json", "--pretty"]).is_err());
    }
}
