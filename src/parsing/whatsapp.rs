//! Line grammars for exported WhatsApp-style transcripts.
//!
//! Two layouts are seen in the wild:
//!
//! - Bracketed (iOS, US locale): `[01/15/2024, 9:05 AM] Sender: Message`
//! - Dashed (Android, EU/IN locale): `15/01/24, 09:05 - Sender: Message`
//!
//! Each [`LineFormat`] owns its whole-line regex and the chrono format used
//! to read the captured date and time. The sender is the shortest prefix
//! followed by `": "`, so colons inside the message body are preserved.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

/// `[MM/DD/YYYY, H:MM AM|PM] Sender: Message`
static BRACKETED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(\d{2}/\d{2}/\d{4}), (\d{1,2}:\d{2}[ \x{202F}](?:AM|PM))\] (.+?): (.+)$")
        .expect("bracketed pattern is valid")
});

/// `DD/MM/YY, HH:MM - Sender: Message`
static DASHED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}/\d{2}/\d{2}), (\d{2}:\d{2}) - (.+?): (.+)$")
        .expect("dashed pattern is valid")
});

/// Supported transcript line layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineFormat {
    /// `[MM/DD/YYYY, H:MM AM|PM] Sender: Message`, 12-hour clock
    Bracketed,
    /// `DD/MM/YY, HH:MM - Sender: Message`, 24-hour clock
    Dashed,
}

/// Fields captured from one matching line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch<'a> {
    pub format: LineFormat,
    pub date: &'a str,
    pub time: &'a str,
    pub sender: &'a str,
    pub content: &'a str,
}

impl LineFormat {
    /// Returns all formats in the order lines are tried.
    pub fn all() -> &'static [LineFormat] {
        &[LineFormat::Bracketed, LineFormat::Dashed]
    }

    /// Returns the compiled whole-line regex for this format.
    pub fn regex(self) -> &'static Regex {
        match self {
            LineFormat::Bracketed => &BRACKETED,
            LineFormat::Dashed => &DASHED,
        }
    }

    /// Returns the chrono format for `"{date} {time}"`.
    pub fn timestamp_format(self) -> &'static str {
        match self {
            LineFormat::Bracketed => "%m/%d/%Y %I:%M %p",
            LineFormat::Dashed => "%d/%m/%y %H:%M",
        }
    }

    /// Matches `line` against this format.
    pub fn captures(self, line: &str) -> Option<LineMatch<'_>> {
        let caps = self.regex().captures(line)?;
        Some(LineMatch {
            format: self,
            date: caps.get(1)?.as_str(),
            time: caps.get(2)?.as_str(),
            sender: caps.get(3)?.as_str(),
            content: caps.get(4)?.as_str(),
        })
    }

    /// Parses the captured date and time. Returns `None` for impossible
    /// values such as month 13.
    pub fn parse_timestamp(self, date: &str, time: &str) -> Option<DateTime<Utc>> {
        // iOS exports put a narrow no-break space before AM/PM.
        let time = time.replace('\u{202F}', " ");
        let raw = format!("{date} {time}");
        NaiveDateTime::parse_from_str(&raw, self.timestamp_format())
            .ok()
            .map(|naive| naive.and_utc())
    }
}

impl std::fmt::Display for LineFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineFormat::Bracketed => write!(f, "bracketed"),
            LineFormat::Dashed => write!(f, "dashed"),
        }
    }
}

/// Tries every format in turn and returns the first match.
pub fn match_line(line: &str) -> Option<LineMatch<'_>> {
    LineFormat::all().iter().find_map(|f| f.captures(line))
}

/// Check if a line is an export notice rather than a real message.
///
/// Notices include the encryption banner, group changes and deletions.
/// Media placeholders like `<Media omitted>` are real messages.
pub fn is_system_message(sender: &str, content: &str) -> bool {
    let system_indicators = [
        "messages and calls are end-to-end encrypted",
        "created group",
        "changed the subject",
        "changed this group's icon",
        "changed the group description",
        "deleted this group's icon",
        "changed their phone number",
        "joined using this group's invite link",
        "security code changed",
        "you're now an admin",
        "is now an admin",
        "turned on disappearing messages",
        "turned off disappearing messages",
        "this message was deleted",
        "you deleted this message",
    ];

    let content_lower = content.to_lowercase();
    if system_indicators
        .iter()
        .any(|indicator| content_lower.contains(indicator))
    {
        return true;
    }

    let sender_lower = sender.to_lowercase();
    sender.trim().is_empty() || sender_lower == "whatsapp" || sender_lower == "system"
}

/// Scores each format over `lines` and returns the one matching most.
///
/// Returns `None` if no format matches any line. Ties go to the format
/// listed first in [`LineFormat::all`].
pub fn detect_format(lines: &[&str]) -> Option<LineFormat> {
    let formats = LineFormat::all();
    let mut scores = vec![0usize; formats.len()];

    for line in lines {
        for (i, format) in formats.iter().enumerate() {
            if format.regex().is_match(line) {
                scores[i] += 1;
            }
        }
    }

    let max_score = *scores.iter().max()?;
    if max_score == 0 {
        return None;
    }

    let winner_idx = scores.iter().position(|&s| s == max_score)?;
    Some(formats[winner_idx])
}
