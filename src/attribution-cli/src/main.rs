//! Attribution CLI. Runs the attribution engine over journey files and
//! produces performance summaries.
//!
//! Results are written to stdout as JSON; logs go to stderr.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use attribution_core::{
    AppConfig, AttributionModel, AttributionResult, CampaignMetadata, JourneyRecord,
    ModelSelection, StaticCampaignMetadata,
};
use attribution_engine::{
    build_journey, AttributionCalculator, DiscoveryInsight, Enrichment, HistoricalRateTable,
    ModelRegistry,
};
use attribution_reporting::{aggregate_performance_parallel, CampaignMetrics, DateRange};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "attribution-cli")]
#[command(about = "Multi-touch cross-platform attribution engine")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON); environment overrides use
    /// the ATTRIBUTION__ prefix
    #[arg(long, global = true, env = "ATTRIBUTION_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Attribute every journey in a file with one model
    Attribute {
        #[command(flatten)]
        inputs: EngineInputs,

        /// Journeys file: JSON array of {customer_key, touchpoints}
        #[arg(long)]
        journeys: PathBuf,

        /// Model identifier, or "ensemble"
        #[arg(long, default_value = "linear")]
        model: String,

        /// Worker threads
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
    /// Run all models against one journey and report the Pinterest
    /// discovery strategy
    Compare {
        #[command(flatten)]
        inputs: EngineInputs,

        /// Journey file: one JSON {customer_key, touchpoints} object
        #[arg(long)]
        journey: PathBuf,
    },
    /// Summarize attribution results and delivery metrics over a date range
    Aggregate {
        /// Attribution results file (output of `attribute`)
        #[arg(long)]
        results: PathBuf,

        /// Campaign metrics file: JSON array of daily rows
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// First day of the window (YYYY-MM-DD); defaults to the configured
        /// attribution window ending on --end
        #[arg(long)]
        start: Option<NaiveDate>,

        /// Last day of the window, inclusive (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,

        /// Worker threads
        #[arg(long, default_value_t = 4)]
        workers: usize,
    },
    /// Validate configuration and print the effective settings
    CheckConfig,
}

/// Optional engine inputs shared by `attribute` and `compare`.
#[derive(Args, Debug)]
struct EngineInputs {
    /// Discovery signals applied to every journey
    #[arg(long)]
    enrichment: Option<PathBuf>,

    /// Historical conversion rates for the data_driven model
    #[arg(long)]
    rate_table: Option<PathBuf>,

    /// Campaign metadata file: JSON array of campaigns
    #[arg(long)]
    campaigns: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attribution_cli=info,attribution_engine=info,attribution_reporting=info".into()),
        )
        .with_writer(io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    info!(
        half_life_days = config.engine.time_decay_half_life_days,
        baseline_confidence = config.engine.baseline_confidence,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Attribute {
            inputs,
            journeys,
            model,
            workers,
        } => cmd_attribute(config, &inputs, &journeys, &model, workers),
        Commands::Compare { inputs, journey } => cmd_compare(config, &inputs, &journey),
        Commands::Aggregate {
            results,
            metrics,
            start,
            end,
            workers,
        } => cmd_aggregate(&config, &results, metrics.as_deref(), start, end, workers),
        Commands::CheckConfig => {
            info!("Configuration is valid");
            write_json(&config)
        }
    }
}

fn cmd_attribute(
    config: AppConfig,
    inputs: &EngineInputs,
    journeys_path: &Path,
    model: &str,
    workers: usize,
) -> anyhow::Result<()> {
    let calculator = build_calculator(config, inputs)?;
    let enrichment = load_optional::<Enrichment>(inputs.enrichment.as_deref())?;
    let selection: ModelSelection = model.parse()?;

    let records: Vec<JourneyRecord> = read_json(journeys_path)?;
    let total = records.len();
    let journeys: Vec<_> = records
        .into_iter()
        .filter_map(|record| {
            let key = record.customer_key.clone();
            match build_journey(record.customer_key, record.touchpoints) {
                Ok(journey) => Some(journey),
                Err(e) => {
                    warn!(customer = %key, error = %e, "Skipping invalid journey");
                    None
                }
            }
        })
        .collect();

    let outcomes = match selection {
        ModelSelection::Single(model) => {
            calculator.calculate_batch(&journeys, model, enrichment.as_ref(), workers)
        }
        ModelSelection::Ensemble => journeys
            .iter()
            .map(|journey| calculator.calculate_ensemble(journey, enrichment.as_ref()))
            .collect(),
    };

    let mut results: Vec<AttributionResult> = Vec::with_capacity(outcomes.len());
    for (journey, outcome) in journeys.iter().zip(outcomes) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => warn!(customer = journey.customer_key(), error = %e, "Journey not attributed"),
        }
    }

    info!(
        model = %selection,
        journeys = total,
        attributed = results.len(),
        "Attribution run complete"
    );
    write_json(&results)
}

fn cmd_compare(config: AppConfig, inputs: &EngineInputs, journey_path: &Path) -> anyhow::Result<()> {
    let calculator = build_calculator(config, inputs)?;
    let enrichment = load_optional::<Enrichment>(inputs.enrichment.as_deref())?;

    let record: JourneyRecord = read_json(journey_path)?;
    let journey = build_journey(record.customer_key, record.touchpoints)?;
    let models = calculator.compare_models(&journey, enrichment.as_ref())?;
    let discovery = DiscoveryInsight::from_comparison(&models);
    write_json(&ComparisonReport { models, discovery })
}

#[derive(Serialize)]
struct ComparisonReport {
    models: BTreeMap<AttributionModel, AttributionResult>,
    discovery: DiscoveryInsight,
}

fn cmd_aggregate(
    config: &AppConfig,
    results_path: &Path,
    metrics_path: Option<&Path>,
    start: Option<NaiveDate>,
    end: NaiveDate,
    workers: usize,
) -> anyhow::Result<()> {
    let range = match start {
        Some(start) => DateRange::new(start, end)?,
        None => DateRange::trailing(end, config.engine.attribution_window_days)?,
    };
    let results: Vec<AttributionResult> = read_json(results_path)?;
    let metrics: Vec<CampaignMetrics> = load_optional(metrics_path)?.unwrap_or_default();

    let summary = aggregate_performance_parallel(&results, &metrics, range, workers);
    write_json(&summary)
}

fn build_calculator(config: AppConfig, inputs: &EngineInputs) -> anyhow::Result<AttributionCalculator> {
    let mut registry = ModelRegistry::new(Arc::new(config))?;
    if let Some(table) = load_optional::<HistoricalRateTable>(inputs.rate_table.as_deref())? {
        registry = registry.with_rate_table(table);
    }

    let mut calculator = AttributionCalculator::new(registry);
    if let Some(campaigns) = load_optional::<Vec<CampaignMetadata>>(inputs.campaigns.as_deref())? {
        let provider = StaticCampaignMetadata::new(campaigns);
        info!(campaigns = provider.len(), "Campaign metadata loaded");
        calculator = calculator.with_metadata_provider(Arc::new(provider));
    }
    Ok(calculator)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("cannot parse {}", path.display()))
}

fn load_optional<T: DeserializeOwned>(path: Option<&Path>) -> anyhow::Result<Option<T>> {
    path.map(read_json::<T>).transpose()
}

fn write_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
