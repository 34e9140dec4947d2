//! Analysis report returned by the aggregator.
//!
//! Serialized with camelCase keys. Maps are ordered by key so the JSON is
//! stable between runs.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A red flag raised by the classifier for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedFlag {
    /// Sender of the message, or the session's participants joined by `", "`.
    pub sender: String,
    /// Message text, or the rendered session transcript.
    pub message: String,
    /// Flags as the classifier reported them.
    pub detected_flags: String,
    /// Index of the session, when sessions were analyzed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<usize>,
}

/// Overview of one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub index: usize,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub message_count: usize,
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// How the classification pass went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationStats {
    /// Units that were classified successfully.
    pub units_analyzed: usize,
    /// Units whose classification failed or timed out.
    pub units_failed: usize,
    /// Name of the classifier used.
    pub classifier: String,
}

/// Aggregate statistics for one transcript.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub message_counts: BTreeMap<String, u64>,
    /// Up to N `[word, frequency]` pairs per sender, most frequent first.
    pub top_words: BTreeMap<String, Vec<(String, u64)>>,
    /// Reply delays in whole minutes.
    pub response_times: Vec<i64>,
    /// Mean of `response_times`, `null` when there are none.
    pub average_response_time: Option<f64>,
    /// Sender changes left out of `response_times` because time went
    /// backwards.
    pub skipped_response_pairs: usize,
    pub interest_level: BTreeMap<String, u64>,
    pub compliments: BTreeMap<String, u64>,
    pub red_flags: Vec<RedFlag>,
    pub monthly_messages: BTreeMap<String, BTreeMap<String, u64>>,
    pub attachment_styles: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_summaries: Vec<SessionSummary>,
    pub classification: ClassificationStats,
}

impl AnalysisReport {
    /// Total number of messages counted.
    pub fn total_messages(&self) -> u64 {
        self.message_counts.values().sum()
    }

    /// Returns `true` if no messages were analyzed.
    pub fn is_empty(&self) -> bool {
        self.message_counts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_serializes() {
        let json = serde_json::to_value(AnalysisReport::default()).unwrap();
        assert_eq!(json["messageCounts"], serde_json::json!({}));
        assert_eq!(json["averageResponseTime"], serde_json::Value::Null);
        assert_eq!(json["redFlags"], serde_json::json!([]));
        assert!(json.get("sessionSummaries").is_none());
        assert_eq!(json["classification"]["unitsFailed"], 0);
    }

    #[test]
    fn test_top_words_serialize_as_pairs() {
        let mut report = AnalysisReport::default();
        report
            .top_words
            .insert("A".into(), vec![("pizza".into(), 3), ("pasta".into(), 1)]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(
            json["topWords"]["A"],
            serde_json::json!([["pizza", 3], ["pasta", 1]])
        );
    }

    #[test]
    fn test_red_flag_keys() {
        let flag = RedFlag {
            sender: "A".into(),
            message: "go away".into(),
            detected_flags: "hostility".into(),
            session: None,
        };
        let json = serde_json::to_value(&flag).unwrap();
        assert_eq!(json["detectedFlags"], "hostility");
        assert!(json.get("session").is_none());
    }

    #[test]
    fn test_total_messages() {
        let mut report = AnalysisReport::default();
        assert!(report.is_empty());
        report.message_counts.insert("A".into(), 2);
        report.message_counts.insert("B".into(), 3);
        assert_eq!(report.total_messages(), 5);
    }
}
