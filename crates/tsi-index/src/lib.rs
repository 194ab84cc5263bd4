//! Fragment merging, daily aggregation and plotting of the sentiment index.

pub mod aggregate;
pub mod error;
pub mod merge;
pub mod plot;

pub use aggregate::{aggregate_daily, run_aggregate, AggregateReport};
pub use error::IndexError;
pub use merge::{find_fragments, merge_records, run_merge};
pub use plot::{render_industry_plot, run_plot, PlotSeries};
