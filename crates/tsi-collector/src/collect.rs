//! Per-industry, per-day collection loop.
//!
//! Each day is fetched independently: a failed request ends that day with
//! whatever pages were already gathered and the loop moves on. Nothing is
//! retried; pacing is a fixed sleep between pages and between days.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use tsi_core::artifacts::fragment_file_name;
use tsi_core::{write_records, AppConfig, IndustryConfig, KeywordsFile, TweetRecord};

use crate::client::SearchClient;
use crate::error::CollectorError;
use crate::types::ApiTweet;

/// Paging and pacing knobs for one collection run.
#[derive(Debug, Clone)]
pub struct CollectionSettings {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub max_pages_per_day: usize,
    pub page_delay: Duration,
    pub day_delay: Duration,
}

impl CollectionSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            start_date: config.start_date,
            end_date: config.end_date,
            max_pages_per_day: config.max_pages_per_day,
            page_delay: Duration::from_millis(config.page_delay_ms),
            day_delay: Duration::from_millis(config.day_delay_ms),
        }
    }
}

/// Why a day's pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    PageCap,
    NoNextPage,
    EmptyBatch,
    MissingCursor,
    RequestFailed,
}

/// Raw tweets gathered for one day.
#[derive(Debug)]
pub struct DayFetch {
    pub tweets: Vec<ApiTweet>,
    pub pages_fetched: usize,
    pub stop: StopReason,
}

/// Outcome of collecting one industry.
#[derive(Debug)]
pub struct IndustryCollection {
    pub industry: String,
    pub tweets: usize,
    /// `None` when nothing was collected and no file was written.
    pub path: Option<PathBuf>,
}

/// `{tariff} {industry} {filters} since:{day} until:{day+1}`
#[must_use]
pub fn build_day_query(keywords: &KeywordsFile, industry: &IndustryConfig, day: NaiveDate) -> String {
    let until = day.succ_opt().unwrap_or(day);
    [
        keywords.tariff_keywords.trim(),
        industry.keywords.trim(),
        keywords.query_filters.trim(),
        &format!("since:{day} until:{until}"),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join(" ")
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// Page through one day's results.
///
/// Stops once `max_pages` pages have been fetched successfully, when the API
/// reports no further page, when a page carries no tweets, or when a request
/// fails. Tweets from pages fetched before a failure are kept.
pub async fn fetch_day(
    client: &SearchClient,
    query: &str,
    max_pages: usize,
    page_delay: Duration,
) -> DayFetch {
    let mut tweets = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages_fetched = 0usize;

    let stop = loop {
        if pages_fetched >= max_pages {
            tracing::debug!(max_pages, "reached per-day page cap");
            break StopReason::PageCap;
        }

        let page = match client.search_page(query, cursor.as_deref()).await {
            Ok(page) => page,
            Err(CollectorError::Status { status, body }) => {
                tracing::error!(status, body = %body, "search request rejected");
                break StopReason::RequestFailed;
            }
            Err(e) => {
                tracing::error!(error = %e, "search request failed");
                break StopReason::RequestFailed;
            }
        };
        pages_fetched += 1;

        let has_next = page.has_next_page;
        let next_cursor = page.cursor().map(str::to_owned);
        let batch = page.tweets.unwrap_or_default();
        if batch.is_empty() {
            tracing::debug!(page = pages_fetched, "empty batch; no more tweets for this day");
            break StopReason::EmptyBatch;
        }
        tracing::info!(
            page = pages_fetched,
            max_pages,
            fetched = batch.len(),
            "fetched search page"
        );
        tweets.extend(batch);

        if !has_next {
            break StopReason::NoNextPage;
        }
        let Some(next) = next_cursor else {
            tracing::warn!(page = pages_fetched, "next page reported without a cursor");
            break StopReason::MissingCursor;
        };
        cursor = Some(next);

        pause(page_delay).await;
    };

    DayFetch {
        tweets,
        pages_fetched,
        stop,
    }
}

/// Drop repeated (text, timestamp) pairs, keeping the first, then sort by
/// timestamp. The sort is stable so ties keep arrival order.
#[must_use]
pub fn finalize_records(records: Vec<TweetRecord>) -> Vec<TweetRecord> {
    let mut seen = HashSet::new();
    let mut unique: Vec<TweetRecord> = records
        .into_iter()
        .filter(|r| seen.insert((r.text.clone(), r.timestamp)))
        .collect();
    unique.sort_by_key(|r| r.timestamp);
    unique
}

/// Collect every day of the configured range for one industry.
pub async fn collect_industry(
    client: &SearchClient,
    keywords: &KeywordsFile,
    industry: &IndustryConfig,
    settings: &CollectionSettings,
) -> Vec<TweetRecord> {
    let slug = industry.slug();
    let mut records = Vec::new();
    let mut dropped = 0usize;

    let days = settings
        .start_date
        .iter_days()
        .take_while(|day| *day <= settings.end_date);

    for (i, day) in days.enumerate() {
        if i > 0 {
            pause(settings.day_delay).await;
        }

        let query = build_day_query(keywords, industry, day);
        tracing::info!(industry = %slug, %day, "searching day");
        tracing::debug!(industry = %slug, %day, query = %query, "day query");

        let fetched = fetch_day(client, &query, settings.max_pages_per_day, settings.page_delay).await;
        let before = records.len();
        for tweet in fetched.tweets {
            match tweet.into_record(&slug) {
                Some(record) => records.push(record),
                None => dropped += 1,
            }
        }

        tracing::info!(
            industry = %slug,
            %day,
            pages = fetched.pages_fetched,
            stop = ?fetched.stop,
            collected = records.len() - before,
            total = records.len(),
            "day complete"
        );
    }

    if dropped > 0 {
        tracing::warn!(
            industry = %slug,
            dropped,
            "dropped tweets with missing or unparsable createdAt/text"
        );
    }

    finalize_records(records)
}

/// Collect every selected industry and write one fragment CSV per industry
/// into the data directory.
///
/// # Errors
///
/// - [`CollectorError::MissingApiKey`] if no search API key is configured.
/// - [`CollectorError::Http`] / [`CollectorError::InvalidBaseUrl`] if the
///   client cannot be built.
/// - [`CollectorError::Dataset`] if an output file cannot be written.
pub async fn run_collection(
    config: &AppConfig,
    keywords: &KeywordsFile,
    industries: &[IndustryConfig],
) -> Result<Vec<IndustryCollection>, CollectorError> {
    let api_key = config
        .search_api_key
        .as_deref()
        .ok_or(CollectorError::MissingApiKey)?;
    let client = SearchClient::new(api_key, config.request_timeout_secs, &config.search_base_url)?
        .with_query_type(&config.search_query_type);
    let settings = CollectionSettings::from_config(config);

    let mut results = Vec::with_capacity(industries.len());
    for industry in industries {
        let slug = industry.slug();
        tracing::info!(
            industry = %slug,
            start = %settings.start_date,
            end = %settings.end_date,
            "starting collection"
        );

        let records = collect_industry(&client, keywords, industry, &settings).await;
        if records.is_empty() {
            tracing::warn!(industry = %slug, "no tweets collected for the entire period");
            results.push(IndustryCollection {
                industry: slug,
                tweets: 0,
                path: None,
            });
            continue;
        }

        let path = config.data_dir.join(fragment_file_name(
            &slug,
            settings.start_date,
            settings.end_date,
        ));
        write_records(&path, &records)?;
        tracing::info!(
            industry = %slug,
            tweets = records.len(),
            path = %path.display(),
            "saved collection"
        );

        results.push(IndustryCollection {
            industry: slug,
            tweets: records.len(),
            path: Some(path),
        });
    }

    Ok(results)
}
