//! Export format selection.
//!
//! # Example
//!
//! ```rust
//! use chatlens::format::{OutputFormat, to_format_string};
//! use chatlens::Message;
//! use chrono::{TimeZone, Utc};
//!
//! # fn main() -> chatlens::Result<()> {
//! let ts = Utc.with_ymd_and_hms(2024, 1, 15, 9, 5, 0).unwrap();
//! let messages = vec![Message::new("Alice", "Hello!", ts)];
//!
//! let format = OutputFormat::from_path("out.jsonl")?;
//! let text = to_format_string(&messages, format)?;
//! assert!(text.starts_with(r#"{"sender":"Alice""#));
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Message;
use crate::error::{AnalyzerError, Result};

/// Export format for parsed messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Semicolon-delimited `Timestamp;Sender;Message`
    #[default]
    Csv,
    /// Pretty-printed JSON array
    Json,
    /// One JSON object per line
    #[cfg_attr(feature = "cli", value(alias = "ndjson"))]
    Jsonl,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Json => "json",
            OutputFormat::Jsonl => "jsonl",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "text/csv",
            OutputFormat::Json => "application/json",
            OutputFormat::Jsonl => "application/x-ndjson",
        }
    }

    /// Picks a format from a file extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(AnalyzerError::invalid_input(
                "output format",
                format!("unknown file extension '.{ext}', expected csv, json or jsonl"),
            )),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "CSV"),
            OutputFormat::Json => write!(f, "JSON"),
            OutputFormat::Jsonl => write!(f, "JSONL"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "jsonl" | "ndjson" => Ok(OutputFormat::Jsonl),
            _ => Err(format!(
                "Unknown format: '{s}'. Expected one of: csv, json, jsonl"
            )),
        }
    }
}

#[cfg(not(feature = "csv-output"))]
fn csv_disabled() -> AnalyzerError {
    AnalyzerError::invalid_input(
        "output format",
        "CSV output requires the 'csv-output' feature",
    )
}

/// Writes messages to `path` in `format`.
pub fn write_to_format(
    messages: &[Message],
    path: impl AsRef<Path>,
    format: OutputFormat,
) -> Result<()> {
    match format {
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => crate::core::output::write_csv(messages, path),
        #[cfg(not(feature = "csv-output"))]
        OutputFormat::Csv => Err(csv_disabled()),
        OutputFormat::Json => crate::core::output::write_json(messages, path),
        OutputFormat::Jsonl => crate::core::output::write_jsonl(messages, path),
    }
}

/// Renders messages in `format`.
pub fn to_format_string(messages: &[Message], format: OutputFormat) -> Result<String> {
    match format {
        #[cfg(feature = "csv-output")]
        OutputFormat::Csv => crate::core::output::to_csv(messages),
        #[cfg(not(feature = "csv-output"))]
        OutputFormat::Csv => Err(csv_disabled()),
        OutputFormat::Json => crate::core::output::to_json(messages),
        OutputFormat::Jsonl => crate::core::output::to_jsonl(messages),
    }
}
