// Allow common clippy pedantic lints
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! orderlog-flatten CLI
//!
//! Command-line interface for flattening order logs

use clap::Parser;
use orderlog_flatten::cli::{Cli, Runner};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let level: tracing::Level = cli.effective_log_level().into();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run().await {
        match e.stage() {
            Some(stage) => eprintln!("Error in stage {stage}: {e}"),
            None => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}
