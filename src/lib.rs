// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # orderlog-flatten
//!
//! Flattens nested JSON order logs held in object storage into a single
//! consolidated CSV object.
//!
//! ## Features
//!
//! - **Object Storage**: S3, R2, GCS, Azure, local directories and in-memory stores
//! - **Strict Schema**: Records are validated against the order event schema before any output
//! - **Flattening**: One wide row per product, order and customer fields repeated
//! - **Sharded Output**: Shards are written concurrently, then merged into one object
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use orderlog_flatten::{PipelineConfig, RunCoordinator, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PipelineConfig::new("s3://logs/orders/**/*.json", "s3://warehouse/flat");
//!     let report = RunCoordinator::from_config(config)?.run().await?;
//!     println!("{:?}", report.final_location);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Run Coordinator                          │
//! │ Initializing → Reading → Transforming → WritingShards →          │
//! │ Consolidating → Done | Failed                                    │
//! └──────────────────────────────────────────────────────────────────┘
//!                                 │
//! ┌───────────┬───────────┬───────┴─────┬──────────────┬─────────────┐
//! │  Storage  │   Input   │   Schema    │   Flatten    │   Output    │
//! ├───────────┼───────────┼─────────────┼──────────────┼─────────────┤
//! │ S3 / R2   │ Glob      │ Order event │ Plan         │ CSV shards  │
//! │ GCS/Azure │ JSON      │ Validation  │ Explode list │ Consolidate │
//! │ Local/Mem │ JSONL     │             │              │ Cleanup     │
//! └───────────┴───────────┴─────────────┴──────────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Object store locations and input globs
pub mod storage;

/// Input decoders (JSON, JSON Lines)
pub mod decode;

/// Order event schema and validation
pub mod schema;

/// Input reading
pub mod input;

/// Flattening transform
pub mod flatten;

/// CSV shards and consolidation
pub mod output;

/// Run coordination
pub mod engine;

/// Pipeline configuration
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use engine::{RunCoordinator, RunReport};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
