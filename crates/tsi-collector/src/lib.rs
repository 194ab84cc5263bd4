//! Tweet collection from the advanced-search API.
//!
//! [`SearchClient`] performs single page requests; [`collect`] drives the
//! per-industry, per-day cursor loop and writes one CSV per industry.

pub mod client;
pub mod collect;
pub mod error;
pub mod types;

pub use client::SearchClient;
pub use collect::{
    build_day_query, collect_industry, fetch_day, finalize_records, run_collection,
    CollectionSettings, DayFetch, IndustryCollection, StopReason,
};
pub use error::CollectorError;
pub use types::{ApiTweet, SearchPage};
