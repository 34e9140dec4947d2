//! Session grouping.
//!
//! A session is a run of consecutive messages where no two neighbours are
//! more than the gap threshold apart. Sessions partition the input: joining
//! every session's messages in order gives back the input exactly.

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::Message;

/// Default gap that closes a session.
pub const DEFAULT_SESSION_GAP_HOURS: i64 = 24;

/// A contiguous, non-empty run of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    messages: Vec<Message>,
}

impl Session {
    fn open(first: Message) -> Self {
        Self {
            messages: vec![first],
        }
    }

    /// Messages in transcript order.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Timestamp of the first message.
    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.messages.first().map(|m| m.timestamp)
    }

    /// Timestamp of the last message.
    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.messages.last().map(|m| m.timestamp)
    }

    /// Distinct senders in order of first appearance.
    pub fn participants(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for msg in &self.messages {
            if !seen.contains(&msg.sender.as_str()) {
                seen.push(&msg.sender);
            }
        }
        seen
    }

    /// Renders the session as `- [sender] message` lines.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("- [{}] {}", m.sender, m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Splits `messages` into sessions.
///
/// A new session starts when a message is at least `gap` later than the one
/// before it. Out-of-order timestamps (a negative delta) never start a new
/// session.
///
/// # Example
///
/// ```rust
/// use chatlens::Message;
/// use chatlens::session::group_sessions;
/// use chrono::{TimeDelta, TimeZone, Utc};
///
/// let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
/// let messages = vec![
///     Message::new("A", "hi", t0),
///     Message::new("B", "late reply", t0 + TimeDelta::hours(30)),
/// ];
///
/// let sessions = group_sessions(&messages, TimeDelta::hours(24));
/// assert_eq!(sessions.len(), 2);
/// ```
pub fn group_sessions(messages: &[Message], gap: TimeDelta) -> Vec<Session> {
    let mut sessions: Vec<Session> = Vec::new();
    let mut prev: Option<DateTime<Utc>> = None;

    for msg in messages {
        match (prev, sessions.last_mut()) {
            (Some(prev_ts), Some(current)) if msg.timestamp - prev_ts < gap => {
                current.messages.push(msg.clone());
            }
            _ => sessions.push(Session::open(msg.clone())),
        }
        prev = Some(msg.timestamp);
    }

    sessions
}
