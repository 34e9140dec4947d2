//! Filter messages by date range and sender.
//!
//! | Filter | Method | Description |
//! |--------|--------|-------------|
//! | Date from | [`with_date_from`](FilterConfig::with_date_from) | Messages on or after date |
//! | Date to | [`with_date_to`](FilterConfig::with_date_to) | Messages on or before date |
//! | Sender | [`with_sender`](FilterConfig::with_sender) | Messages from one participant |
//!
//! Filters combine with AND logic and keep the input order.
//!
//! # Example
//!
//! ```
//! use chatlens::core::filter::{FilterConfig, apply_filters};
//! use chatlens::Message;
//! use chrono::{TimeZone, Utc};
//!
//! # fn main() -> chatlens::Result<()> {
//! let messages = vec![
//!     Message::new("Alice", "Old", Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()),
//!     Message::new("alice", "New", Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()),
//!     Message::new("Bob", "Hi", Utc.with_ymd_and_hms(2024, 6, 16, 12, 0, 0).unwrap()),
//! ];
//!
//! let config = FilterConfig::new()
//!     .with_date_from("2024-06-01")?
//!     .with_sender("ALICE");
//!
//! let filtered = apply_filters(messages, &config);
//! assert_eq!(filtered.len(), 1);
//! assert_eq!(filtered[0].content, "New");
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, NaiveDate, Utc};

use crate::Message;
use crate::error::{AnalyzerError, Result};

/// Date range and sender criteria.
#[derive(Debug, Clone, Default)]
pub struct FilterConfig {
    /// Include only messages on or after this timestamp.
    pub after: Option<DateTime<Utc>>,

    /// Include only messages on or before this timestamp.
    pub before: Option<DateTime<Utc>>,

    /// Include only messages from this sender (case-insensitive).
    pub from: Option<String>,
}

impl FilterConfig {
    /// Creates a filter that lets everything through.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps messages on or after the start of `date` (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::InvalidDate`] if the format is invalid.
    pub fn with_date_from(mut self, date: &str) -> Result<Self> {
        self.after = Some(day_bound(date, 0, 0, 0)?);
        Ok(self)
    }

    /// Keeps messages on or before the end of `date` (`YYYY-MM-DD`).
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::InvalidDate`] if the format is invalid.
    pub fn with_date_to(mut self, date: &str) -> Result<Self> {
        self.before = Some(day_bound(date, 23, 59, 59)?);
        Ok(self)
    }

    /// Keeps messages from `sender`, ignoring ASCII case.
    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.from = Some(sender.into());
        self
    }

    /// Returns `true` if any filter is active.
    pub fn is_active(&self) -> bool {
        self.after.is_some() || self.before.is_some() || self.from.is_some()
    }

    /// Returns `true` if `msg` passes every active filter.
    pub fn matches(&self, msg: &Message) -> bool {
        if let Some(ref from) = self.from {
            if !msg.sender.eq_ignore_ascii_case(from) {
                return false;
            }
        }
        if self.after.is_some_and(|after| msg.timestamp < after) {
            return false;
        }
        if self.before.is_some_and(|before| msg.timestamp > before) {
            return false;
        }
        true
    }
}

fn day_bound(date: &str, hour: u32, min: u32, sec: u32) -> Result<DateTime<Utc>> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(hour, min, sec))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| AnalyzerError::invalid_date(date))
}

/// Returns the messages passing `config`, in input order.
pub fn apply_filters(messages: Vec<Message>, config: &FilterConfig) -> Vec<Message> {
    if !config.is_active() {
        return messages;
    }
    messages.into_iter().filter(|m| config.matches(m)).collect()
}
