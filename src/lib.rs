//! # ACV mix report
//!
//! Derives the "won ACV mix by customer type" views from a flat list of
//! opportunity records: a stacked bar per fiscal quarter, a doughnut of
//! customer-type shares and a quarter x type summary table.
//!
//! ```rust,ignore
//! use acv_mix_report::*;
//!
//! let (records, _report) = load_records("data/customer-type.json")?;
//! let agg = Aggregation::from_records(&records);
//! let table = summary_table(&agg, &CategoryScheme::default(), TableOptions::default());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use config::Config;
pub use engine::{
    aggregate_by_quarter_and_type, aggregate_by_type, compute_totals, Aggregation, Dataset,
    MatrixTotals, MemoizedAggregation, QuarterTypeMatrix,
};
pub use error::{DashboardError, ErrorBody, Result};
pub use loader::{load_records, parse_json_records, read_csv_records, LoadReport};
pub use reports::{
    doughnut, generate_summary, stacked_bar, summary_table, DoughnutChart, PercentBasis,
    StackedBarChart, SummaryTable, TableOptions,
};
pub use types::{CategoryDef, CategoryScheme, Record, Totals};
pub use util::{format_money, percent_of_total};
