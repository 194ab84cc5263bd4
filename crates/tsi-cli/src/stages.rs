//! Stage handlers for the CLI.
//!
//! Each handler calls one library stage and prints a one-line summary per
//! industry. Recoverable problems are logged by the libraries; only fatal
//! stage errors are returned.

use anyhow::Context;
use tsi_core::{AppConfig, IndustryConfig, KeywordsFile, StageReport};

/// Startup state shared by every stage.
pub(crate) struct StageContext<'a> {
    pub config: &'a AppConfig,
    pub keywords: &'a KeywordsFile,
    pub industries: &'a [IndustryConfig],
}

fn print_reports(stage: &str, reports: &[StageReport]) {
    if reports.is_empty() {
        println!("{stage}: nothing to do");
        return;
    }
    for r in reports {
        println!(
            "{stage}: {} {} -> {} rows ({})",
            r.industry,
            r.rows_in,
            r.rows_out,
            r.path.display()
        );
    }
}

pub(crate) async fn collect(ctx: &StageContext<'_>) -> anyhow::Result<()> {
    let results = tsi_collector::run_collection(ctx.config, ctx.keywords, ctx.industries)
        .await
        .context("collect stage failed")?;

    for c in &results {
        match &c.path {
            Some(path) => println!("collect: {} {} tweets ({})", c.industry, c.tweets, path.display()),
            None => println!("collect: {} no tweets collected", c.industry),
        }
    }
    Ok(())
}

pub(crate) fn merge(ctx: &StageContext<'_>) -> anyhow::Result<()> {
    let reports =
        tsi_index::run_merge(ctx.config, ctx.industries).context("merge stage failed")?;
    print_reports("merge", &reports);
    Ok(())
}

pub(crate) fn preprocess(ctx: &StageContext<'_>) -> anyhow::Result<()> {
    let reports = tsi_sentiment::run_preprocess(ctx.config, ctx.industries)
        .context("preprocess stage failed")?;
    print_reports("preprocess", &reports);
    Ok(())
}

pub(crate) async fn score(ctx: &StageContext<'_>) -> anyhow::Result<()> {
    let classifier = tsi_sentiment::TeiClassifier::connect(
        &ctx.config.classifier_url,
        ctx.config.request_timeout_secs,
    )
    .await
    .with_context(|| format!("cannot use classifier at {}", ctx.config.classifier_url))?;

    let reports = tsi_sentiment::run_scoring(ctx.config, ctx.industries, &classifier)
        .await
        .context("score stage failed")?;
    print_reports("score", &reports);
    Ok(())
}

pub(crate) fn aggregate(ctx: &StageContext<'_>) -> anyhow::Result<()> {
    let report =
        tsi_index::run_aggregate(ctx.config, ctx.industries).context("aggregate stage failed")?;
    println!(
        "aggregate: {} files, {} rows -> {} daily rows ({})",
        report.files_loaded,
        report.rows_in,
        report.days,
        report.path.display()
    );
    Ok(())
}

pub(crate) fn plot(ctx: &StageContext<'_>) -> anyhow::Result<()> {
    let reports = tsi_index::run_plot(ctx.config, ctx.industries, &ctx.keywords.policy_events)
        .context("plot stage failed")?;
    for r in &reports {
        println!("plot: {} {} days ({})", r.industry, r.rows_out, r.path.display());
    }
    if reports.is_empty() {
        println!("plot: nothing to do");
    }
    Ok(())
}
