//! Analysis pipeline.
//!
//! - [`aggregator`] - Builds the [`AnalysisReport`] from messages or sessions
//! - [`stats`] - Classifier-independent tallies
//! - [`report`] - Report types
//! - [`filter`] - Message filtering by date and sender
//! - [`output`] - Export writers (CSV, JSON, JSONL)

pub mod aggregator;
pub mod filter;
pub mod output;
pub mod report;
pub mod stats;

pub use aggregator::Aggregator;
pub use filter::{FilterConfig, apply_filters};
pub use report::{AnalysisReport, ClassificationStats, RedFlag, SessionSummary};

#[cfg(feature = "csv-output")]
pub use output::{to_csv, write_csv};
pub use output::{to_json, to_jsonl, write_json, write_jsonl};
