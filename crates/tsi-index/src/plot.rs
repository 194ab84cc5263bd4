//! Plot stage: one SVG line chart per industry with policy-event markers.
//!
//! Dates are plotted as day offsets from the first plotted date so the chart
//! uses plain `f64` axes; tick labels map offsets back to calendar dates.

use std::path::Path;

use chrono::{Datelike, NaiveDate, TimeDelta};
use plotters::prelude::*;
use serde::Deserialize;
use tsi_core::artifacts::{plot_file_name, DAILY_INDEX_FILE_NAME};
use tsi_core::{read_records, AppConfig, IndustryConfig, PolicyEvent, StageReport};

use crate::error::IndexError;

const PLOT_SIZE: (u32, u32) = (1200, 700);
const NAVY: RGBColor = RGBColor(0, 0, 128);
const INDEX_COLUMNS: &[&str] = &["date", "industry", "daily_sentiment_score"];

#[derive(Debug, Deserialize)]
struct IndexRow {
    date: NaiveDate,
    industry: String,
    #[serde(default)]
    daily_sentiment_score: Option<f64>,
}

/// One industry's daily series, ascending by date.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub industry: String,
    pub display_name: String,
    pub points: Vec<(NaiveDate, f64)>,
}

fn plot_err<E: std::fmt::Display>(e: E) -> IndexError {
    IndexError::Plot(e.to_string())
}

#[allow(clippy::cast_precision_loss)]
fn day_offset(origin: NaiveDate, date: NaiveDate) -> f64 {
    (date - origin).num_days() as f64
}

#[allow(clippy::cast_possible_truncation)]
fn offset_label(origin: NaiveDate, x: f64) -> String {
    origin
        .checked_add_signed(TimeDelta::days(x.round() as i64))
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn year_span(first: NaiveDate, last: NaiveDate) -> String {
    if first.year() == last.year() {
        first.year().to_string()
    } else {
        format!("{}-{}", first.year(), last.year())
    }
}

/// Value range covering the data and zero, padded by 10%.
fn y_bounds(points: &[(NaiveDate, f64)]) -> (f64, f64) {
    let (lo, hi) = points
        .iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), (_, y)| (lo.min(*y), hi.max(*y)));
    let pad = if hi - lo > f64::EPSILON { (hi - lo) * 0.1 } else { 0.1 };
    (lo - pad, hi + pad)
}

/// Render `series` to an SVG at `path`.
///
/// Draws the daily score in navy, a zero reference line, and a red vertical
/// marker with label `"{label} ({Mon DD})"` for each event inside the
/// plotted date span.
///
/// # Errors
///
/// Returns [`IndexError::Plot`] if the series is empty or drawing fails.
pub fn render_industry_plot(
    path: &Path,
    series: &PlotSeries,
    events: &[PolicyEvent],
) -> Result<(), IndexError> {
    let (Some(&(first, _)), Some(&(last, _))) = (series.points.first(), series.points.last())
    else {
        return Err(IndexError::Plot(format!(
            "no scored days to plot for {}",
            series.industry
        )));
    };

    let span = day_offset(first, last);
    let (x_lo, x_hi) = if span > 0.0 { (0.0, span) } else { (-1.0, 1.0) };
    let (y_lo, y_hi) = y_bounds(&series.points);

    let root = SVGBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;

    let title = format!(
        "Daily Investor Sentiment Index - {} ({})",
        series.display_name,
        year_span(first, last)
    );
    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 26))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(plot_err)?;

    let x_ticks = usize::try_from((last - first).num_days() + 1)
        .unwrap_or(1)
        .clamp(2, 12);
    chart
        .configure_mesh()
        .x_labels(x_ticks)
        .x_label_formatter(&|x| offset_label(first, *x))
        .x_desc("Date")
        .y_desc("Daily Sentiment Score (Mean)")
        .draw()
        .map_err(plot_err)?;

    chart
        .draw_series(LineSeries::new(
            series.points.iter().map(|(d, y)| (day_offset(first, *d), *y)),
            NAVY.stroke_width(2),
        ))
        .map_err(plot_err)?
        .label(series.display_name.as_str())
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], NAVY.stroke_width(2)));

    chart
        .draw_series(LineSeries::new(
            vec![(x_lo, 0.0), (x_hi, 0.0)],
            BLACK.mix(0.7).stroke_width(1),
        ))
        .map_err(plot_err)?
        .label("Neutral Sentiment")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.mix(0.7)));

    let visible: Vec<(f64, String)> = events
        .iter()
        .filter(|e| e.date >= first && e.date <= last)
        .map(|e| {
            (
                day_offset(first, e.date),
                format!("{} ({})", e.label, e.date.format("%b %d")),
            )
        })
        .collect();

    chart
        .draw_series(visible.iter().map(|(x, _)| {
            PathElement::new(vec![(*x, y_lo), (*x, y_hi)], RED.mix(0.8).stroke_width(2))
        }))
        .map_err(plot_err)?;

    let label_dx = (x_hi - x_lo) * 0.01;
    let label_style = ("sans-serif", 14).into_font().color(&RED);
    chart
        .draw_series(visible.iter().enumerate().map(|(i, (x, label))| {
            #[allow(clippy::cast_precision_loss)]
            let y = y_hi - (i as f64) * 0.05 * (y_hi - y_lo);
            Text::new(label.clone(), (*x + label_dx, y), label_style.clone())
        }))
        .map_err(plot_err)?;

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::LowerRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(plot_err)?;

    root.present().map_err(plot_err)?;
    Ok(())
}

/// Display name for `slug`: the configured name, else the slug capitalised.
fn display_name(slug: &str, industries: &[IndustryConfig]) -> String {
    industries
        .iter()
        .find(|i| i.slug() == slug)
        .map(|i| i.name.clone())
        .unwrap_or_else(|| {
            let mut chars = slug.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect())
                .unwrap_or_default()
        })
}

/// Split index rows into per-industry series in first-appearance order.
/// Days without a score are left out of the line.
fn build_series(rows: Vec<IndexRow>, industries: &[IndustryConfig]) -> Vec<PlotSeries> {
    let mut series: Vec<PlotSeries> = Vec::new();
    for row in rows {
        let idx = match series.iter().position(|s| s.industry == row.industry) {
            Some(idx) => idx,
            None => {
                series.push(PlotSeries {
                    display_name: display_name(&row.industry, industries),
                    industry: row.industry.clone(),
                    points: Vec::new(),
                });
                series.len() - 1
            }
        };
        if let Some(score) = row.daily_sentiment_score.filter(|s| s.is_finite()) {
            series[idx].points.push((row.date, score));
        }
    }
    for s in &mut series {
        s.points.sort_by_key(|(d, _)| *d);
    }
    series
}

/// Run the plot stage: one SVG per industry present in the daily index.
///
/// When an industry selector is configured only those industries are drawn.
///
/// # Errors
///
/// Returns [`IndexError::Dataset`] if the index is missing or lacks
/// `date`, `industry` or `daily_sentiment_score`, and [`IndexError::Plot`]
/// if rendering fails.
pub fn run_plot(
    config: &AppConfig,
    industries: &[IndustryConfig],
    events: &[PolicyEvent],
) -> Result<Vec<StageReport>, IndexError> {
    let index_path = config.data_dir.join(DAILY_INDEX_FILE_NAME);
    let rows = read_records::<IndexRow>(&index_path, INDEX_COLUMNS)?.records;

    let selected = |slug: &str| {
        config
            .industry_filter
            .as_ref()
            .is_none_or(|filter| filter.iter().any(|f| f == slug))
    };

    let mut reports = Vec::new();
    for series in build_series(rows, industries) {
        if !selected(&series.industry) {
            continue;
        }
        if series.points.is_empty() {
            tracing::warn!(industry = %series.industry, "no scored days; skipping plot");
            continue;
        }

        let output = config.data_dir.join(plot_file_name(&series.industry));
        render_industry_plot(&output, &series, events)?;
        tracing::info!(
            industry = %series.industry,
            days = series.points.len(),
            path = %output.display(),
            "saved plot"
        );

        reports.push(StageReport {
            rows_in: series.points.len(),
            rows_out: series.points.len(),
            industry: series.industry,
            path: output,
        });
    }

    if reports.is_empty() {
        tracing::warn!(path = %index_path.display(), "daily index produced no plots");
    }
    Ok(reports)
}
