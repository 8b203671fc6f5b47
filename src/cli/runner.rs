//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::PipelineConfig;
use crate::engine::RunCoordinator;
use crate::error::Result;
use crate::flatten::FlattenPlan;
use crate::input::reader_for;
use crate::output::Consolidator;
use crate::schema::{type_name, RecordValidator};
use crate::storage::StorageLocation;
use crate::types::InputFormat;
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Run {
                config,
                input,
                output,
                input_format,
                records_per_shard,
                workers,
                strict_cleanup,
            } => {
                let mut pipeline = match config {
                    Some(path) => load_config(path)?,
                    None => PipelineConfig::default(),
                };
                if let Some(input) = input {
                    pipeline.input.clone_from(input);
                }
                if let Some(output) = output {
                    pipeline.output.clone_from(output);
                }
                if let Some(format) = input_format {
                    pipeline.input_format = *format;
                }
                if let Some(records) = records_per_shard {
                    pipeline.records_per_shard = *records;
                }
                if let Some(workers) = workers {
                    pipeline.max_workers = Some(*workers);
                }
                pipeline.strict_cleanup |= *strict_cleanup;

                self.run_pipeline(pipeline).await
            }
            Commands::Schema => self.schema(),
            Commands::Validate {
                input,
                input_format,
            } => self.validate(input, *input_format).await,
            Commands::Consolidate {
                output,
                prefix,
                final_key,
            } => self.consolidate(output, prefix, final_key).await,
            Commands::Cleanup { output, prefix } => self.cleanup(output, prefix).await,
        }
    }

    /// Run the full pipeline
    async fn run_pipeline(&self, config: PipelineConfig) -> Result<()> {
        let coordinator = RunCoordinator::from_config(config)?;
        let report = coordinator.run().await?;

        self.output_message(&json!({
            "type": "RUN_REPORT",
            "report": report,
        }));

        Ok(())
    }

    /// Print the flat output columns
    fn schema(&self) -> Result<()> {
        let plan = FlattenPlan::for_orders()?;
        let columns: Vec<Value> = plan
            .output_schema()
            .fields()
            .iter()
            .map(|field| {
                json!({
                    "name": field.name(),
                    "type": type_name(field.data_type()),
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "SCHEMA",
            "columns": columns,
        }));

        Ok(())
    }

    /// Read and validate input only
    async fn validate(&self, input: &str, format: InputFormat) -> Result<()> {
        let plan = FlattenPlan::for_orders()?;
        let validator = RecordValidator::new(plan.input_schema().clone())?;
        let batch = reader_for(input, format, validator)?.read_all().await?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "{} record(s) in {} object(s) are valid",
                    batch.records.len(),
                    batch.objects
                )
            }
        }));

        Ok(())
    }

    /// Consolidate an orphaned transient prefix
    async fn consolidate(&self, output: &str, prefix: &str, final_key: &str) -> Result<()> {
        let location = StorageLocation::parse(output)?;
        let final_path = location.child(final_key);
        info!("Consolidating {prefix} into {}", location.url_for(&final_path));

        let report = Consolidator::new(location.store().clone())
            .consolidate(&location.child(prefix), &final_path)
            .await?;

        self.output_message(&json!({
            "type": "CONSOLIDATION_REPORT",
            "report": report,
        }));

        report.ensure_clean()
    }

    /// Delete everything under an orphaned transient prefix
    async fn cleanup(&self, output: &str, prefix: &str) -> Result<()> {
        let location = StorageLocation::parse(output)?;
        let report = Consolidator::new(location.store().clone())
            .cleanup(&location.child(prefix))
            .await?;

        self.output_message(&json!({
            "type": "CLEANUP_REPORT",
            "report": report,
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

fn load_config(path: &Path) -> Result<PipelineConfig> {
    let config = PipelineConfig::from_file(path)?;
    info!("Loaded pipeline config from {}", path.display());
    Ok(config)
}
