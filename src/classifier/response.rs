//! Field extraction from free-text classifier replies.
//!
//! Replies are expected to contain lines such as:
//!
//! ```text
//! Sentiment: Positive
//! Red flags: None
//! Compliments: cute, funny
//! Attachment style: Secure
//! Summary: Planning a weekend trip.
//! ```
//!
//! Labels may be numbered (`1. Sentiment: ...`) and are matched without
//! regard to case. The first occurrence of each label wins; a label that
//! never appears leaves its field empty.

use std::sync::LazyLock;

use regex::Regex;

use super::{Classification, Sentiment};

fn field(label: &str) -> Regex {
    // `[ \t]*` so an empty value never swallows the next line.
    Regex::new(&format!(r"(?i){label}[ \t]*:[ \t]*(.+)")).expect("field pattern is valid")
}

static SENTIMENT: LazyLock<Regex> = LazyLock::new(|| field("sentiment"));
static RED_FLAGS: LazyLock<Regex> = LazyLock::new(|| field(r"red[ \t]+flags?"));
static COMPLIMENTS: LazyLock<Regex> = LazyLock::new(|| field("compliments?"));
static ATTACHMENT: LazyLock<Regex> = LazyLock::new(|| field(r"attachment[ \t]+style"));
static SUMMARY: LazyLock<Regex> = LazyLock::new(|| field("summary"));

fn capture(re: &Regex, text: &str) -> Option<String> {
    let value = re.captures(text)?.get(1)?.as_str().trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn is_none_sentinel(value: &str) -> bool {
    value
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .eq_ignore_ascii_case("none")
}

/// Extracts a [`Classification`] from a free-text reply.
///
/// `Red flags: None` yields no red flags, and `Compliments: None` yields an
/// empty compliment list.
///
/// # Example
///
/// ```rust
/// use chatlens::classifier::{Sentiment, parse_free_text};
///
/// let reply = "1. Sentiment: Positive\n2. Red flags: None\n3. Compliments: cute, smart";
/// let c = parse_free_text(reply);
/// assert_eq!(c.sentiment, Some(Sentiment::Positive));
/// assert_eq!(c.red_flags, None);
/// assert_eq!(c.compliments, Some(vec!["cute".to_string(), "smart".to_string()]));
/// ```
pub fn parse_free_text(reply: &str) -> Classification {
    let sentiment = capture(&SENTIMENT, reply).map(|s| Sentiment::from_label(&s));

    let red_flags = capture(&RED_FLAGS, reply).filter(|v| !is_none_sentinel(v));

    let compliments = capture(&COMPLIMENTS, reply).map(|v| {
        if is_none_sentinel(&v) {
            Vec::new()
        } else {
            v.split(',')
                .map(|c| c.trim().trim_end_matches('.').trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect()
        }
    });

    Classification {
        sentiment,
        red_flags,
        compliments,
        attachment_style: capture(&ATTACHMENT, reply),
        summary: capture(&SUMMARY, reply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE_REPLY: &str = "\
1. Sentiment: Lovable
2. Red flags: None
3. Compliments: pyaara, cute
4. Attachment style: Anxious";

    const SESSION_REPLY: &str = "\
Sentiment: Negative.
Red flags: ignoring messages, jealousy
Compliments: None
Summary: An argument about weekend plans that ends unresolved.";

    #[test]
    fn test_message_reply() {
        let c = parse_free_text(MESSAGE_REPLY);
        assert_eq!(c.sentiment, Some(Sentiment::Lovable));
        assert_eq!(c.red_flags, None);
        assert_eq!(c.compliments, Some(vec!["pyaara".into(), "cute".into()]));
        assert_eq!(c.attachment_style.as_deref(), Some("Anxious"));
        assert_eq!(c.summary, None);
    }

    #[test]
    fn test_session_reply() {
        let c = parse_free_text(SESSION_REPLY);
        assert_eq!(c.sentiment, Some(Sentiment::Negative));
        assert_eq!(c.red_flags.as_deref(), Some("ignoring messages, jealousy"));
        assert_eq!(c.compliments, Some(vec![]));
        assert_eq!(
            c.summary.as_deref(),
            Some("An argument about weekend plans that ends unresolved.")
        );
    }

    #[test]
    fn test_case_insensitive_labels() {
        let c = parse_free_text("SENTIMENT: neutral\nred flag: shouting");
        assert_eq!(c.sentiment, Some(Sentiment::Neutral));
        assert_eq!(c.red_flags.as_deref(), Some("shouting"));
    }

    #[test]
    fn test_first_match_wins() {
        let c = parse_free_text("Sentiment: Positive\nSentiment: Negative");
        assert_eq!(c.sentiment, Some(Sentiment::Positive));
    }

    #[test]
    fn test_missing_fields_are_absent() {
        let c = parse_free_text("I could not analyze this message.");
        assert_eq!(c, Classification::default());
    }

    #[test]
    fn test_empty_value_does_not_read_next_line() {
        let c = parse_free_text("Sentiment:\nRed flags: None");
        assert_eq!(c.sentiment, None);
        assert_eq!(c.red_flags, None);
    }

    #[test]
    fn test_none_sentinel_with_punctuation() {
        let c = parse_free_text("Red flags: None.\nCompliments: none");
        assert_eq!(c.red_flags, None);
        assert_eq!(c.compliments, Some(vec![]));
    }
}
