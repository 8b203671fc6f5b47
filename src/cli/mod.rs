//! CLI module
//!
//! Command-line interface for running the pipeline.
//!
//! # Commands
//!
//! - `run` - Flatten input logs into one CSV object
//! - `schema` - Print the flat output columns
//! - `validate` - Check input against the order schema
//! - `consolidate` - Finish an interrupted run's transient prefix
//! - `cleanup` - Delete an orphaned transient prefix

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
