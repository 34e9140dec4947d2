//! Transcript parser.
//!
//! Turns raw exported chat text into an ordered list of [`Message`]s.
//! Lines that match neither grammar are skipped; parsing never fails on
//! line content.
//!
//! # Example
//!
//! ```rust
//! use chatlens::parser::TranscriptParser;
//!
//! let text = "\
//! [01/15/2024, 9:05 AM] Alice: Good morning
//! 15/01/24, 09:07 - Bob: Morning: coffee?
//! not a message line";
//!
//! let messages = TranscriptParser::new().parse(text);
//! assert_eq!(messages.len(), 2);
//! assert_eq!(messages[1].content, "Morning: coffee?");
//! ```

use std::path::Path;

use tracing::{debug, trace};

use crate::Message;
use crate::config::ParserConfig;
use crate::error::Result;
use crate::parsing::{LineFormat, detect_format, is_system_message};

/// Number of leading lines sampled for format diagnostics.
const DETECT_SAMPLE_LINES: usize = 20;

/// Parser for bracketed and dashed transcript exports.
#[derive(Debug, Clone, Default)]
pub struct TranscriptParser {
    config: ParserConfig,
}

impl TranscriptParser {
    /// Creates a parser with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with custom options.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Returns the parser options.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses `text` into messages in line order.
    ///
    /// Each line is tried against [`LineFormat::Bracketed`] and then
    /// [`LineFormat::Dashed`]. A line whose date or time is impossible is
    /// treated like a non-matching line.
    pub fn parse(&self, text: &str) -> Vec<Message> {
        if tracing::enabled!(tracing::Level::DEBUG) {
            let sample: Vec<&str> = text.lines().take(DETECT_SAMPLE_LINES).collect();
            match detect_format(&sample) {
                Some(format) => debug!(%format, "detected transcript format"),
                None => debug!("no known transcript format in sample"),
            }
        }

        let mut messages: Vec<Message> = Vec::new();
        // Set when the last matched line was dropped, so its continuation
        // lines are dropped with it.
        let mut last_dropped = false;
        let mut skipped = 0usize;

        for line in text.lines() {
            match self.parse_line(line) {
                LineOutcome::Message(msg) => {
                    messages.push(msg);
                    last_dropped = false;
                }
                LineOutcome::Dropped => {
                    last_dropped = true;
                }
                LineOutcome::NoMatch => {
                    if self.config.join_continuations && !last_dropped {
                        if let Some(last) = messages.last_mut() {
                            last.content.push('\n');
                            last.content.push_str(line);
                            continue;
                        }
                    }
                    if !line.trim().is_empty() {
                        skipped += 1;
                    }
                }
            }
        }

        debug!(
            messages = messages.len(),
            skipped, "parsed transcript"
        );
        messages
    }

    /// Reads and parses a transcript file.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<Vec<Message>> {
        let text = std::fs::read_to_string(path)?;
        Ok(self.parse(&text))
    }

    /// Reads and parses a transcript file without blocking the runtime.
    pub async fn parse_file_async(&self, path: impl AsRef<Path>) -> Result<Vec<Message>> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(self.parse(&text))
    }

    fn parse_line(&self, line: &str) -> LineOutcome {
        for format in LineFormat::all() {
            let Some(m) = format.captures(line) else {
                continue;
            };
            let Some(timestamp) = format.parse_timestamp(m.date, m.time) else {
                trace!(line, "skipping line with invalid date");
                return LineOutcome::Dropped;
            };
            if self.config.skip_system_messages && is_system_message(m.sender, m.content) {
                return LineOutcome::Dropped;
            }
            return LineOutcome::Message(Message::new(m.sender, m.content, timestamp));
        }
        LineOutcome::NoMatch
    }
}

enum LineOutcome {
    Message(Message),
    Dropped,
    NoMatch,
}

/// Parses `text` with default options.
pub fn parse_transcript(text: &str) -> Vec<Message> {
    TranscriptParser::new().parse(text)
}
