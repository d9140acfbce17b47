//! CLI definitions for the msd command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use msd::VERSION;

/// Multicast service discovery node
#[derive(Parser)]
#[command(name = "msd")]
#[command(author, version = VERSION, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, short = 'L', default_value = "info", global = true)]
    pub log_level: LogLevel,

    /// Log file path (logs to both console and file)
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

/// Options shared by the commands that join a group.
#[derive(Args, Clone, Default)]
pub struct NodeArgs {
    /// Path to configuration file (HJSON, or JSON with a .json extension)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Multicast group id as 28 hex digits (overrides config)
    #[arg(short = 'g', long)]
    pub group: Option<String>,

    /// Network interface name or index (overrides config)
    #[arg(short = 'i', long)]
    pub interface: Option<String>,

    /// UDP port (overrides config)
    #[arg(short = 'p', long)]
    pub port: Option<u16>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll the group and print peers as they come and go
    Discover {
        #[command(flatten)]
        node: NodeArgs,
    },

    /// Announce this host to the group until stopped
    Announce {
        #[command(flatten)]
        node: NodeArgs,

        /// Host id, exactly 8 characters (overrides config)
        #[arg(long)]
        id: Option<String>,

        /// Host URL (overrides config)
        #[arg(long)]
        url: Option<String>,
    },

    /// Print the multicast address derived from a group id
    Address {
        /// Multicast group id as 28 hex digits
        #[arg(short = 'g', long)]
        group: Option<String>,

        /// Print all eight groups without zero compression
        #[arg(short = 'e', long)]
        expanded: bool,
    },

    /// Generate a new configuration
    #[command(alias = "genconf")]
    GenerateConfig {
        /// Output as JSON instead of HJSON
        #[arg(short = 'j', long)]
        json: bool,
    },
}
