//! CLI commands and argument parsing

use crate::types::{InputFormat, LogLevel};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Flatten nested JSON order logs into one CSV object
#[derive(Parser, Debug)]
#[command(name = "orderlog-flatten")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format for reports
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Log level
    #[arg(long, global = true, default_value = "info")]
    pub log_level: LogLevel,

    /// Verbose output (same as --log-level debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective log level after `--verbose`
    pub fn effective_log_level(&self) -> LogLevel {
        if self.verbose {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Flatten every matching input object into one CSV object
    Run {
        /// Pipeline configuration file (YAML)
        #[arg(short = 'C', long)]
        config: Option<PathBuf>,

        /// Input locator, e.g. s3://logs/orders/**/*.json
        #[arg(short, long)]
        input: Option<String>,

        /// Output location (local path or cloud URL)
        /// Supports: /path, s3://bucket/path, r2://bucket/path, gs://bucket/path, az://container/path
        #[arg(short, long)]
        output: Option<String>,

        /// Input decoding
        #[arg(long = "input-format")]
        input_format: Option<InputFormat>,

        /// Input records per shard
        #[arg(long)]
        records_per_shard: Option<usize>,

        /// Maximum concurrent shard workers
        #[arg(long)]
        workers: Option<usize>,

        /// Fail when transient objects are left behind
        #[arg(long)]
        strict_cleanup: bool,
    },

    /// Print the flat output columns
    Schema,

    /// Read and validate input without writing anything
    Validate {
        /// Input locator
        #[arg(short, long)]
        input: String,

        /// Input decoding
        #[arg(long = "input-format", default_value = "auto")]
        input_format: InputFormat,
    },

    /// Consolidate shards left under a transient prefix
    Consolidate {
        /// Output location holding the prefix
        #[arg(short, long)]
        output: String,

        /// Transient prefix, relative to the output location
        #[arg(long)]
        prefix: String,

        /// Final key, relative to the output location
        #[arg(long)]
        final_key: String,
    },

    /// Delete everything under a transient prefix
    Cleanup {
        /// Output location holding the prefix
        #[arg(short, long)]
        output: String,

        /// Transient prefix, relative to the output location
        #[arg(long)]
        prefix: String,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
