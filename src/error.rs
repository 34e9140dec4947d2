//! Unified error types for chatlens.
//!
//! This module provides a single [`AnalyzerError`] enum that covers every
//! failure the library can surface, following the pattern used by crates
//! like `reqwest`, `serde_json`, and `csv`.
//!
//! # Recovery model
//!
//! Not every error reaches the caller:
//!
//! - [`AnalyzerError::Classifier`] is recovered per analyzed unit by the
//!   aggregator; the unit simply contributes nothing to the report.
//! - [`AnalyzerError::Persistence`] is logged and swallowed by
//!   [`persist_best_effort`](crate::store::persist_best_effort).
//! - Everything else aborts the current request.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// A specialized [`Result`] type for chatlens operations.
///
/// # Example
///
/// ```rust
/// use chatlens::error::Result;
/// use chatlens::Message;
///
/// fn load() -> Result<Vec<Message>> {
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, AnalyzerError>;

/// The error type for all chatlens operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalyzerError {
    /// An I/O error occurred while reading a transcript or writing output.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A required input was not supplied (empty body, missing file field).
    #[error("{what} is required")]
    MissingInput {
        /// Human readable name of the missing input, e.g. "Chat text"
        what: &'static str,
    },

    /// Input was supplied but could not be used.
    #[error("Invalid {context}: {message}")]
    InvalidInput {
        /// What was being read (e.g. "request body", "lexicon file")
        context: &'static str,
        /// Description of what's wrong
        message: String,
    },

    /// Invalid date format in filter configuration.
    #[error("Invalid date '{input}'. Expected format: {expected}")]
    InvalidDate {
        /// The invalid date string that was provided
        input: String,
        /// Expected format description
        expected: &'static str,
    },

    /// CSV writing error.
    #[cfg(feature = "csv-output")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing/serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A classifier call failed or timed out.
    #[error("{classifier} classifier failed: {source}")]
    Classifier {
        /// Name of the classifier that failed
        classifier: &'static str,
        /// The underlying failure
        #[source]
        source: ClassifierErrorKind,
    },

    /// Storing parsed messages failed.
    #[error("Persistence error while {context}: {source}")]
    Persistence {
        /// What the store was doing
        context: String,
        /// The underlying storage error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A configuration value could not be interpreted.
    #[error("Invalid configuration for {key}: {message}")]
    Config {
        /// Environment variable or setting name
        key: String,
        /// Description of what's wrong
        message: String,
    },

    /// Any other failure during parsing or aggregation.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Kinds of classifier failures.
#[derive(Debug, Error)]
pub enum ClassifierErrorKind {
    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The service answered with a non-success status
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    /// The call did not finish within the configured timeout
    #[error("timed out after {}ms", after.as_millis())]
    Timeout { after: Duration },
    /// The response parsed but carried nothing usable
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl AnalyzerError {
    /// Creates a missing-input error.
    pub fn missing_input(what: &'static str) -> Self {
        AnalyzerError::MissingInput { what }
    }

    /// Creates an invalid-input error.
    pub fn invalid_input(context: &'static str, message: impl Into<String>) -> Self {
        AnalyzerError::InvalidInput {
            context,
            message: message.into(),
        }
    }

    /// Creates an invalid date error.
    pub fn invalid_date(input: impl Into<String>) -> Self {
        AnalyzerError::InvalidDate {
            input: input.into(),
            expected: "YYYY-MM-DD",
        }
    }

    /// Creates a classifier error.
    pub fn classifier(classifier: &'static str, source: impl Into<ClassifierErrorKind>) -> Self {
        AnalyzerError::Classifier {
            classifier,
            source: source.into(),
        }
    }

    /// Creates a persistence error from any storage error.
    pub fn persistence(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AnalyzerError::Persistence {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Creates a configuration error.
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        AnalyzerError::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, AnalyzerError::Io(_))
    }

    /// Returns `true` if this is a classifier error.
    pub fn is_classifier(&self) -> bool {
        matches!(self, AnalyzerError::Classifier { .. })
    }

    /// Returns `true` if this is a persistence error.
    pub fn is_persistence(&self) -> bool {
        matches!(self, AnalyzerError::Persistence { .. })
    }

    /// Returns `true` if the caller supplied bad or missing input.
    ///
    /// The HTTP layer answers these with `400 Bad Request`.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AnalyzerError::MissingInput { .. }
                | AnalyzerError::InvalidInput { .. }
                | AnalyzerError::InvalidDate { .. }
        )
    }
}
