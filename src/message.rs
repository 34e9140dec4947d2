//! Timestamped chat message.
//!
//! [`Message`] is the only record the transcript parser produces. Every
//! downstream stage (session grouping, aggregation, persistence, export)
//! consumes it read-only.
//!
//! # Examples
//!
//! ```
//! use chatlens::Message;
//! use chrono::{TimeZone, Utc};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
//! let msg = Message::new("Alice", "Hello, world!", ts);
//!
//! assert_eq!(msg.sender(), "Alice");
//! assert_eq!(msg.content(), "Hello, world!");
//! assert_eq!(msg.month_label(), "Jan 2024");
//! ```
//!
//! ## Serialization
//!
//! The text field is serialized as `message`, which is the shape the HTTP
//! API accepts and returns:
//!
//! ```
//! use chatlens::Message;
//! use chrono::{TimeZone, Utc};
//!
//! let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
//! let msg = Message::new("Alice", "Hi", ts);
//! let json = serde_json::to_string(&msg)?;
//!
//! assert!(json.contains(r#""message":"Hi""#));
//! let parsed: Message = serde_json::from_str(&json)?;
//! assert_eq!(msg, parsed);
//! # Ok::<(), serde_json::Error>(())
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single parsed chat message.
///
/// | Field | Type | Description |
/// |-------|------|-------------|
/// | `sender` | `String` | Display name exactly as it appears in the export |
/// | `content` | `String` | Message text after the sender separator |
/// | `timestamp` | `DateTime<Utc>` | Send time; exports carry no zone, so it is read as UTC |
///
/// Messages are kept in transcript order. Timestamps are **not** guaranteed
/// to be monotonic; consumers must not assume sortedness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Display name of the message author.
    pub sender: String,

    /// Text content of the message.
    #[serde(rename = "message", alias = "content")]
    pub content: String,

    /// When the message was sent.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message.
    pub fn new(
        sender: impl Into<String>,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            timestamp,
        }
    }

    /// Returns the sender name.
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Returns the message content.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the timestamp.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the `"Mon YYYY"` bucket this message falls into.
    pub fn month_label(&self) -> String {
        self.timestamp.format("%b %Y").to_string()
    }

    /// Returns `true` if this message's content is empty or whitespace-only.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_message_new() {
        let msg = Message::new("Alice", "Hello", ts());
        assert_eq!(msg.sender(), "Alice");
        assert_eq!(msg.content(), "Hello");
        assert_eq!(msg.timestamp(), ts());
    }

    #[test]
    fn test_month_label() {
        let msg = Message::new("Alice", "Hello", ts());
        assert_eq!(msg.month_label(), "Jun 2024");

        let dec = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 0).unwrap();
        assert_eq!(Message::new("Bob", "Bye", dec).month_label(), "Dec 2023");
    }

    #[test]
    fn test_message_is_empty() {
        assert!(Message::new("Alice", "", ts()).is_empty());
        assert!(Message::new("Alice", "   ", ts()).is_empty());
        assert!(!Message::new("Alice", "Hello", ts()).is_empty());
    }

    #[test]
    fn test_message_serialization_uses_message_key() {
        let msg = Message::new("Alice", "Hello", ts());
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""sender":"Alice""#));
        assert!(json.contains(r#""message":"Hello""#));
        assert!(json.contains("2024-06-15T12:00:00Z"));
        assert!(!json.contains("content"));
    }

    #[test]
    fn test_message_deserialization_accepts_content_alias() {
        let json = r#"{"sender":"Bob","content":"Hi","timestamp":"2024-06-15T12:00:00Z"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.content(), "Hi");
        assert_eq!(msg.timestamp(), ts());
    }

    #[test]
    fn test_message_deserialization_requires_timestamp() {
        let json = r#"{"sender":"Bob","message":"Hi"}"#;
        assert!(serde_json::from_str::<Message>(json).is_err());
    }
}
