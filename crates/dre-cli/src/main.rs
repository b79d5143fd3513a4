//! DRE CLI - Command-line interface
//!
//! Usage:
//!   dre evaluate --dataset <path> --output <path>
//!   dre prompt --dataset <path> --index <n>

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dre_core::{AppConfig, LoggingConfig, RelationVocabulary};
use dre_extractor::{build_relation_prompt, load_dataset, Pipeline};
use dre_llm::create_llm_client;

#[derive(Parser)]
#[command(name = "dre")]
#[command(about = "Evaluate LLM relation extraction on dialogue datasets")]
#[command(version)]
struct Cli {
    /// TOML configuration file (environment variables take precedence)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run extraction over a dataset and write a scored report
    Evaluate {
        /// Dataset file: JSON array of [dialogue, relations] pairs
        #[arg(long)]
        dataset: PathBuf,
        /// Where to write the JSON report
        #[arg(long)]
        output: PathBuf,
        /// Relation vocabulary file (JSON array or id2rel map)
        #[arg(long)]
        relations: Option<PathBuf>,
        /// Model identifier (overrides configuration)
        #[arg(long)]
        model: Option<String>,
        /// Samples processed at once
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Print the prompt for one sample without calling a model
    Prompt {
        /// Dataset file
        #[arg(long)]
        dataset: PathBuf,
        /// Sample index
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Relation vocabulary file
        #[arg(long)]
        relations: Option<PathBuf>,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.as_str().into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_vocabulary(path: Option<&Path>) -> anyhow::Result<RelationVocabulary> {
    match path {
        Some(path) => RelationVocabulary::from_file(path)
            .with_context(|| format!("Failed to load relation types from {}", path.display())),
        None => Ok(RelationVocabulary::dialogre()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    init_tracing(&config.logging);

    match &cli.config {
        Some(path) => tracing::debug!(path = %path.display(), "Configuration loaded from file"),
        None => tracing::debug!("Configuration loaded from environment"),
    }

    match cli.command {
        Commands::Evaluate {
            dataset,
            output,
            relations,
            model,
            concurrency,
        } => {
            let mut config = config;
            if let Some(model) = model {
                config.llm.model = model;
            }
            if let Some(concurrency) = concurrency {
                config.eval.concurrency = concurrency;
            }
            config.validate()?;

            let relations_path = relations.or_else(|| config.eval.relations_path.clone());
            let vocabulary = load_vocabulary(relations_path.as_deref())?;
            let client = create_llm_client(&config.llm).context("Failed to create LLM client")?;

            tracing::info!(
                provider = ?config.llm.provider,
                model = %config.llm.model,
                dataset = %dataset.display(),
                relation_types = vocabulary.len(),
                "Starting DRE evaluation"
            );

            let pipeline = Pipeline::new(Arc::from(client), vocabulary)
                .with_concurrency(config.eval.concurrency);

            let report = pipeline.run_report(&dataset, &output).await.with_context(|| {
                format!(
                    "Evaluation of {} into {} failed",
                    dataset.display(),
                    output.display()
                )
            })?;

            println!("Final Metrics: {}", report.overall_metrics);
            println!("\n{}", report.summary());
        }
        Commands::Prompt {
            dataset,
            index,
            relations,
        } => {
            let relations_path = relations.or_else(|| config.eval.relations_path.clone());
            let vocabulary = load_vocabulary(relations_path.as_deref())?;
            let samples = load_dataset(&dataset)?;

            let sample = samples.get(index).with_context(|| {
                format!(
                    "Sample {index} out of range ({} samples in {})",
                    samples.len(),
                    dataset.display()
                )
            })?;

            println!(
                "{}",
                build_relation_prompt(&sample.dialogue, vocabulary.labels())
            );
        }
    }

    Ok(())
}
