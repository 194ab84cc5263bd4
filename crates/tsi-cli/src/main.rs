mod stages;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "tsi-cli")]
#[command(about = "Tariff sentiment index pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Pipeline stages. Every tunable comes from `TSI_*` environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Commands {
    /// Collect tweets per industry per day from the search API
    Collect,
    /// Merge collection fragments into one deduplicated file per industry
    Merge,
    /// Clean tweet text and drop same-day duplicates
    Preprocess,
    /// Score cleaned tweets with the sentiment classifier
    Score,
    /// Average scores per day and industry into the daily index
    Aggregate,
    /// Plot the daily index per industry with policy-event markers
    Plot,
    /// Merge, preprocess, score, aggregate and plot existing collector output
    Run,
}

fn init_tracing(fallback_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = tsi_core::load_app_config()?;
    init_tracing(&config.log_level)?;
    tracing::debug!(?config, "loaded configuration");

    let keywords = tsi_core::load_keywords(&config.keywords_path)?;
    let industries = keywords.select_industries(config.industry_filter.as_deref())?;
    tracing::info!(
        command = ?cli.command,
        industries = industries.len(),
        data_dir = %config.data_dir.display(),
        "starting"
    );

    let ctx = stages::StageContext {
        config: &config,
        keywords: &keywords,
        industries: &industries,
    };

    match cli.command {
        Commands::Collect => stages::collect(&ctx).await?,
        Commands::Merge => stages::merge(&ctx)?,
        Commands::Preprocess => stages::preprocess(&ctx)?,
        Commands::Score => stages::score(&ctx).await?,
        Commands::Aggregate => stages::aggregate(&ctx)?,
        Commands::Plot => stages::plot(&ctx)?,
        Commands::Run => {
            stages::merge(&ctx)?;
            stages::preprocess(&ctx)?;
            stages::score(&ctx).await?;
            stages::aggregate(&ctx)?;
            stages::plot(&ctx)?;
        }
    }

    Ok(())
}
