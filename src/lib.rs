//! # Chatlens
//!
//! A Rust library for analyzing exported chat transcripts.
//!
//! ## Overview
//!
//! Chatlens turns a plain-text chat export into an [`AnalysisReport`](core::AnalysisReport):
//! - **Message counts**, **top words** and **monthly activity** per sender
//! - **Response times** between consecutive senders
//! - **Interest level**, **compliments**, **red flags** and **attachment
//!   styles** from a pluggable [`Classifier`](classifier::Classifier)
//!
//! Two transcript grammars are understood:
//! - **Bracketed** — `[MM/DD/YYYY, H:MM AM] Sender: text`
//! - **Dashed** — `DD/MM/YY, HH:MM - Sender: text`
//!
//! Classification runs per message or, with session grouping, per
//! conversation session. Calls fan out concurrently, each bounded by a
//! timeout; a failed call never fails the report.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use chatlens::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let messages = parse_transcript(
//!     "[01/15/2024, 9:05 AM] Alice: hi\n\
//!      [01/15/2024, 9:20 AM] Bob: you look amazing today",
//! );
//!
//! let lexicon = Arc::new(Lexicon::hinglish());
//! let classifier = Arc::new(KeywordClassifier::new(lexicon.clone()));
//! let report = Aggregator::new(lexicon).aggregate(&messages, classifier).await;
//!
//! assert_eq!(report.total_messages(), 2);
//! assert_eq!(report.response_times, vec![15]);
//! assert_eq!(report.compliments["Bob"], 1);
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - [`parser`] — [`TranscriptParser`](parser::TranscriptParser), [`parse_transcript`](parser::parse_transcript)
//! - [`parsing`] — line grammars and system-line detection
//! - [`session`] — [`Session`](session::Session), [`group_sessions`](session::group_sessions)
//! - [`classifier`] — [`Classifier`](classifier::Classifier) trait, keyword, LLM and Hugging Face backends
//! - [`core`] — aggregation, report types, statistics, filters and export writers
//! - [`lexicon`] — stopwords, compliment and red-flag terms
//! - [`store`] — best-effort message persistence
//! - [`config`] — configuration types and environment loading
//! - [`format`] — export format selection
//! - [`error`] — [`AnalyzerError`], [`Result`]
//! - `server` — axum router (feature `server`)
//! - `cli` — clap definitions (feature `cli`)
//! - [`prelude`] — Convenient re-exports

pub mod classifier;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod format;
pub mod lexicon;
pub mod message;
pub mod parser;
pub mod parsing;
#[cfg(feature = "server")]
pub mod server;
pub mod session;
pub mod store;

// Re-export the main types at the crate root for convenience
pub use error::{AnalyzerError, Result};
pub use message::Message;

/// Convenient re-exports for common usage.
///
/// ```rust
/// use chatlens::prelude::*;
/// ```
pub mod prelude {
    pub use crate::Message;

    pub use crate::error::{AnalyzerError, Result};

    // Parsing and grouping
    pub use crate::parser::{TranscriptParser, parse_transcript};
    pub use crate::session::{Session, group_sessions};

    // Classification
    pub use crate::classifier::{
        Classification, Classifier, HuggingFaceClassifier, KeywordClassifier, LlmClassifier,
        Sentiment, build_classifier,
    };
    pub use crate::lexicon::Lexicon;

    // Configuration
    pub use crate::config::{
        AnalysisConfig, ClassifierKind, ClassifierSettings, ComplimentSource, ParserConfig,
        Settings,
    };

    // Aggregation and report
    pub use crate::core::{AnalysisReport, Aggregator, FilterConfig, RedFlag, apply_filters};

    // Output
    #[cfg(feature = "csv-output")]
    pub use crate::core::output::{to_csv, write_csv};
    pub use crate::core::output::{to_json, to_jsonl, write_json, write_jsonl};
    pub use crate::format::{OutputFormat, write_to_format};

    // Persistence
    pub use crate::store::{MemoryStore, MessageStore};
    #[cfg(feature = "sqlite")]
    pub use crate::store::SqliteStore;
}
