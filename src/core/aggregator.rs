//! Report aggregation.
//!
//! [`Aggregator`] runs in two phases:
//!
//! 1. Classifier-independent tallies over every message (counts, top words,
//!    response times, monthly buckets and, by default, keyword compliments).
//! 2. One classifier call per unit, where a unit is a message or, with
//!    session grouping enabled, a whole session. Calls run concurrently up
//!    to [`AnalysisConfig::concurrency`], each bounded by a timeout and a
//!    small retry budget. Their results are folded into the report by a
//!    single reducer once every call has resolved.
//!
//! A unit whose classification fails contributes nothing; it never fails
//! the report.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use chatlens::classifier::KeywordClassifier;
//! use chatlens::core::Aggregator;
//! use chatlens::lexicon::Lexicon;
//! use chatlens::parser::parse_transcript;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let messages = parse_transcript(
//!     "[01/15/2024, 9:05 AM] Alice: you are amazing\n\
//!      [01/15/2024, 9:10 AM] Bob: haha thanks",
//! );
//!
//! let lexicon = Arc::new(Lexicon::hinglish());
//! let classifier = Arc::new(KeywordClassifier::new(lexicon.clone()));
//! let report = Aggregator::new(lexicon).aggregate(&messages, classifier).await;
//!
//! assert_eq!(report.message_counts["Alice"], 1);
//! assert_eq!(report.compliments["Alice"], 1);
//! assert_eq!(report.average_response_time, Some(5.0));
//! # }
//! ```

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use super::report::{AnalysisReport, ClassificationStats, RedFlag, SessionSummary};
use super::stats::{ResponseTimes, message_counts, monthly_messages, top_words};
use crate::Message;
use crate::classifier::{Classification, Classifier};
use crate::config::{AnalysisConfig, ComplimentSource};
use crate::error::{AnalyzerError, ClassifierErrorKind, Result};
use crate::lexicon::Lexicon;
use crate::session::{Session, group_sessions};

/// One classifier call's worth of input.
#[derive(Debug, Clone, Copy)]
enum Unit<'a> {
    Message(&'a Message),
    Session(usize, &'a Session),
}

/// Builds [`AnalysisReport`]s.
#[derive(Debug, Clone)]
pub struct Aggregator {
    lexicon: Arc<Lexicon>,
    config: AnalysisConfig,
}

impl Aggregator {
    /// Creates an aggregator with default settings.
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self::with_config(lexicon, AnalysisConfig::default())
    }

    pub fn with_config(lexicon: Arc<Lexicon>, config: AnalysisConfig) -> Self {
        Self { lexicon, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Analyzes `messages`, grouping them into sessions first when
    /// [`AnalysisConfig::group_sessions`] is set.
    pub async fn aggregate(
        &self,
        messages: &[Message],
        classifier: Arc<dyn Classifier>,
    ) -> AnalysisReport {
        if self.config.group_sessions {
            let sessions = group_sessions(messages, self.config.session_gap());
            return self.aggregate_sessions(&sessions, classifier).await;
        }
        self.aggregate_messages(messages, classifier).await
    }

    /// Analyzes `messages` one classifier call per message, ignoring
    /// [`AnalysisConfig::group_sessions`].
    pub async fn aggregate_messages(
        &self,
        messages: &[Message],
        classifier: Arc<dyn Classifier>,
    ) -> AnalysisReport {
        let mut report = self.tally(messages);
        let units: Vec<Unit<'_>> = messages.iter().map(Unit::Message).collect();
        self.classify_all(&mut report, units, classifier.as_ref()).await;
        report
    }

    /// Analyzes pre-grouped sessions, classifying each session as a whole.
    pub async fn aggregate_sessions(
        &self,
        sessions: &[Session],
        classifier: Arc<dyn Classifier>,
    ) -> AnalysisReport {
        let messages: Vec<Message> = sessions
            .iter()
            .flat_map(|s| s.messages().iter().cloned())
            .collect();

        let mut report = self.tally(&messages);
        report.session_summaries = sessions
            .iter()
            .enumerate()
            .map(|(index, session)| SessionSummary {
                index,
                start: session.start(),
                end: session.end(),
                message_count: session.len(),
                participants: session.participants().into_iter().map(String::from).collect(),
                summary: None,
            })
            .collect();

        let units: Vec<Unit<'_>> = sessions
            .iter()
            .enumerate()
            .map(|(i, s)| Unit::Session(i, s))
            .collect();
        self.classify_all(&mut report, units, classifier.as_ref()).await;
        report
    }

    /// Classifier-independent part of the report.
    fn tally(&self, messages: &[Message]) -> AnalysisReport {
        let response_times = ResponseTimes::collect(messages);
        let mut report = AnalysisReport {
            message_counts: message_counts(messages),
            top_words: top_words(messages, &self.lexicon, self.config.top_words_limit),
            average_response_time: response_times.average(),
            skipped_response_pairs: response_times.skipped,
            response_times: response_times.samples,
            monthly_messages: monthly_messages(messages),
            ..AnalysisReport::default()
        };

        if report.skipped_response_pairs > 0 {
            debug!(
                skipped = report.skipped_response_pairs,
                "ignored out-of-order reply pairs"
            );
        }

        if self.config.compliment_source == ComplimentSource::Keywords {
            for msg in messages {
                let found = self.lexicon.compliments_in(&msg.content).len() as u64;
                *report.compliments.entry(msg.sender.clone()).or_default() += found;
            }
        }

        report
    }

    async fn classify_all(
        &self,
        report: &mut AnalysisReport,
        units: Vec<Unit<'_>>,
        classifier: &dyn Classifier,
    ) {
        let total = units.len();
        let concurrency = self.config.concurrency.max(1);

        // Collected before streaming; a lazy `map` over `Unit<'_>` is too
        // general for axum's handler bounds.
        let calls: Vec<_> = units
            .into_iter()
            .enumerate()
            .map(|(idx, unit)| async move { (idx, unit, self.classify_unit(classifier, unit).await) })
            .collect();

        let mut outcomes: Vec<(usize, Unit<'_>, Result<Classification>)> = stream::iter(calls)
            .buffer_unordered(concurrency)
            .collect()
            .await;

        // Completion order is arbitrary; fold in unit order so list fields
        // come out the same on every run.
        outcomes.sort_by_key(|(idx, _, _)| *idx);

        let mut stats = ClassificationStats {
            classifier: classifier.name().to_string(),
            ..ClassificationStats::default()
        };

        for (_, unit, outcome) in outcomes {
            match outcome {
                Ok(classification) => {
                    stats.units_analyzed += 1;
                    self.apply(report, unit, classification);
                }
                Err(err) => {
                    stats.units_failed += 1;
                    warn!(error = %err, "classification failed, unit skipped");
                }
            }
        }

        info!(
            classifier = %stats.classifier,
            units = total,
            failed = stats.units_failed,
            "classification finished"
        );
        report.classification = stats;
    }

    async fn classify_unit(&self, classifier: &dyn Classifier, unit: Unit<'_>) -> Result<Classification> {
        let timeout = self.config.classifier_timeout;
        let mut attempt: u32 = 0;

        loop {
            let call = async {
                match unit {
                    Unit::Message(msg) => classifier.classify_message(&msg.content).await,
                    Unit::Session(_, session) => classifier.classify_session(session).await,
                }
            };

            let result = match tokio::time::timeout(timeout, call).await {
                Ok(result) => result,
                Err(_) => Err(AnalyzerError::classifier(
                    classifier.name(),
                    ClassifierErrorKind::Timeout { after: timeout },
                )),
            };

            match result {
                Ok(classification) => return Ok(classification),
                Err(err) if attempt < self.config.classifier_retries => {
                    let delay = self.config.retry_backoff * 2u32.saturating_pow(attempt);
                    attempt += 1;
                    debug!(error = %err, attempt, ?delay, "retrying classifier call");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Folds one successful classification into the report.
    fn apply(&self, report: &mut AnalysisReport, unit: Unit<'_>, c: Classification) {
        // Senders credited with this unit's scores, plus how a red flag
        // from it is attributed.
        let (credited, flag_sender, flag_message, session_idx) = match unit {
            Unit::Message(msg) => (
                vec![msg.sender.as_str()],
                msg.sender.clone(),
                msg.content.clone(),
                None,
            ),
            Unit::Session(idx, session) => {
                let participants = session.participants();
                let joined = participants.join(", ");
                (participants, joined, session.transcript(), Some(idx))
            }
        };

        if let Some(sentiment) = &c.sentiment {
            let score = sentiment.interest_score();
            for sender in &credited {
                *report.interest_level.entry((*sender).to_string()).or_default() += score;
            }
        }

        if self.config.compliment_source == ComplimentSource::Classifier && c.compliments.is_some() {
            let count = c.compliment_count();
            for sender in &credited {
                *report.compliments.entry((*sender).to_string()).or_default() += count;
            }
        }

        if let Some(style) = &c.attachment_style {
            for sender in &credited {
                report
                    .attachment_styles
                    .entry((*sender).to_string())
                    .or_default()
                    .push(style.clone());
            }
        }

        if let Some(flags) = c.red_flags {
            report.red_flags.push(RedFlag {
                sender: flag_sender,
                message: flag_message,
                detected_flags: flags,
                session: session_idx,
            });
        }

        if let (Some(idx), Some(summary)) = (session_idx, c.summary) {
            if let Some(entry) = report.session_summaries.get_mut(idx) {
                entry.summary = Some(summary);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{KeywordClassifier, Sentiment};
    use async_trait::async_trait;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap() + TimeDelta::minutes(minutes)
    }

    fn lexicon() -> Arc<Lexicon> {
        Arc::new(Lexicon::hinglish())
    }

    /// Returns a fixed classification for every unit.
    struct Fixed(Classification);

    #[async_trait]
    impl Classifier for Fixed {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn classify_message(&self, _text: &str) -> Result<Classification> {
            Ok(self.0.clone())
        }
    }

    /// Fails on messages containing "boom", counting every call.
    struct Flaky {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Classifier for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn classify_message(&self, text: &str) -> Result<Classification> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if text.contains("boom") {
                Err(AnalyzerError::classifier(
                    "flaky",
                    ClassifierErrorKind::UnexpectedResponse("boom".into()),
                ))
            } else {
                Ok(Classification::default().with_sentiment(Sentiment::Positive))
            }
        }
    }

    struct Slow;

    #[async_trait]
    impl Classifier for Slow {
        fn name(&self) -> &'static str {
            "slow"
        }

        async fn classify_message(&self, _text: &str) -> Result<Classification> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Classification::default().with_sentiment(Sentiment::Positive))
        }
    }

    #[tokio::test]
    async fn test_empty_input() {
        let report = Aggregator::new(lexicon())
            .aggregate(&[], Arc::new(KeywordClassifier::default()))
            .await;
        assert!(report.message_counts.is_empty());
        assert!(report.top_words.is_empty());
        assert!(report.response_times.is_empty());
        assert_eq!(report.average_response_time, None);
        assert!(report.interest_level.is_empty());
        assert!(report.red_flags.is_empty());
        assert_eq!(report.classification.units_analyzed, 0);
    }

    #[tokio::test]
    async fn test_interest_scores_accumulate() {
        let messages = vec![
            Message::new("A", "one", at(0)),
            Message::new("A", "two", at(1)),
            Message::new("B", "three", at(2)),
        ];
        let classifier = Arc::new(Fixed(
            Classification::default().with_sentiment(Sentiment::Positive),
        ));
        let report = Aggregator::new(lexicon()).aggregate(&messages, classifier).await;
        assert_eq!(report.interest_level["A"], 4);
        assert_eq!(report.interest_level["B"], 2);
        assert_eq!(report.classification.units_analyzed, 3);
        assert_eq!(report.classification.classifier, "fixed");
    }

    #[tokio::test]
    async fn test_keyword_compliments_distinct_per_message() {
        let messages = vec![Message::new("A", "amazing amazing", at(0))];
        let report = Aggregator::new(lexicon())
            .aggregate(&messages, Arc::new(Fixed(Classification::default())))
            .await;
        assert_eq!(report.compliments["A"], 1);
    }

    #[tokio::test]
    async fn test_classifier_compliment_source() {
        let messages = vec![Message::new("A", "amazing amazing", at(0))];
        let config = AnalysisConfig::new().with_compliment_source(ComplimentSource::Classifier);
        let classifier = Arc::new(Fixed(
            Classification::default().with_compliments(["smile", "eyes", "voice"]),
        ));
        let report = Aggregator::with_config(lexicon(), config)
            .aggregate(&messages, classifier)
            .await;
        assert_eq!(report.compliments["A"], 3);
    }

    #[tokio::test]
    async fn test_failures_are_skipped_and_counted() {
        let messages = vec![
            Message::new("A", "fine", at(0)),
            Message::new("B", "boom", at(1)),
            Message::new("A", "fine again", at(2)),
        ];
        let flaky = Arc::new(Flaky {
            calls: AtomicUsize::new(0),
        });
        let config = AnalysisConfig::new().with_retries(2, Duration::from_millis(1));
        let report = Aggregator::with_config(lexicon(), config)
            .aggregate(&messages, flaky.clone())
            .await;

        assert_eq!(report.interest_level["A"], 4);
        assert!(!report.interest_level.contains_key("B"));
        assert_eq!(report.message_counts["B"], 1);
        assert_eq!(report.classification.units_analyzed, 2);
        assert_eq!(report.classification.units_failed, 1);
        // Two successes plus one failing unit tried three times.
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let messages = vec![Message::new("A", "hello", at(0))];
        let config = AnalysisConfig::new()
            .with_classifier_timeout(Duration::from_secs(1))
            .with_retries(0, Duration::ZERO);
        let report = Aggregator::with_config(lexicon(), config)
            .aggregate(&messages, Arc::new(Slow))
            .await;
        assert_eq!(report.classification.units_failed, 1);
        assert!(report.interest_level.is_empty());
        assert_eq!(report.message_counts["A"], 1);
    }

    #[tokio::test]
    async fn test_red_flags_keep_message_order() {
        let messages = vec![
            Message::new("A", "i hate this", at(0)),
            Message::new("B", "so toxic", at(1)),
            Message::new("A", "all good", at(2)),
        ];
        let config = AnalysisConfig::new().with_concurrency(8);
        let report = Aggregator::with_config(lexicon(), config)
            .aggregate(&messages, Arc::new(KeywordClassifier::new(lexicon())))
            .await;
        assert_eq!(report.red_flags.len(), 2);
        assert_eq!(report.red_flags[0].sender, "A");
        assert_eq!(report.red_flags[0].detected_flags, "hate");
        assert_eq!(report.red_flags[1].sender, "B");
        assert_eq!(report.red_flags[1].session, None);
    }

    #[tokio::test]
    async fn test_session_mode_credits_participants() {
        let messages = vec![
            Message::new("A", "hi", at(0)),
            Message::new("B", "hello", at(5)),
            Message::new("A", "later", at(60 * 30)),
        ];
        let classifier = Arc::new(Fixed(
            Classification::default()
                .with_sentiment(Sentiment::Neutral)
                .with_red_flags("distance")
                .with_attachment_style("Secure")
                .with_summary("small talk"),
        ));
        let config = AnalysisConfig::new().with_group_sessions(true);
        let report = Aggregator::with_config(lexicon(), config)
            .aggregate(&messages, classifier)
            .await;

        assert_eq!(report.session_summaries.len(), 2);
        assert_eq!(report.session_summaries[0].participants, vec!["A", "B"]);
        assert_eq!(report.session_summaries[0].summary.as_deref(), Some("small talk"));
        assert_eq!(report.interest_level["A"], 2);
        assert_eq!(report.interest_level["B"], 1);
        assert_eq!(report.red_flags[0].sender, "A, B");
        assert_eq!(report.red_flags[0].session, Some(0));
        assert_eq!(report.red_flags[1].sender, "A");
        assert_eq!(report.attachment_styles["A"], vec!["Secure", "Secure"]);
        assert_eq!(report.message_counts["A"], 2);
        assert_eq!(report.classification.units_analyzed, 2);
    }

    #[tokio::test]
    async fn test_static_tallies() {
        let messages = vec![
            Message::new("A", "pizza pizza", at(0)),
            Message::new("A", "pasta", at(5)),
            Message::new("B", "pizza", at(10)),
        ];
        let report = Aggregator::new(lexicon())
            .aggregate(&messages, Arc::new(Fixed(Classification::default())))
            .await;
        assert_eq!(report.top_words["A"][0], ("pizza".to_string(), 2));
        assert_eq!(report.response_times, vec![5]);
        assert_eq!(report.average_response_time, Some(5.0));
        assert_eq!(report.monthly_messages["Jan 2024"]["A"], 2);
    }

    #[tokio::test]
    async fn test_top_words_limit() {
        let config = AnalysisConfig::new().with_top_words_limit(2);
        let aggregator = Aggregator::with_config(lexicon(), config);
        assert!(aggregator.lexicon().is_stopword("hai"));

        let messages = vec![
            Message::new("A", "chai chai coffee lassi hai", at(0)),
            Message::new("A", "coffee juice", at(1)),
        ];
        let report = aggregator
            .aggregate(&messages, Arc::new(KeywordClassifier::new(lexicon())))
            .await;
        assert_eq!(
            report.top_words["A"],
            vec![("chai".to_string(), 2), ("coffee".to_string(), 2)]
        );
    }
}
