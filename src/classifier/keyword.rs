//! Offline lexicon classifier.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Classification, Classifier, Sentiment};
use crate::error::Result;
use crate::lexicon::Lexicon;

/// Classifies with lexicon lookups only; never fails and never touches
/// the network.
///
/// Sentiment is negative when any red-flag term is present, otherwise
/// positive when any compliment term is present, otherwise neutral.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    lexicon: Arc<Lexicon>,
}

impl KeywordClassifier {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    fn classify(&self, text: &str) -> Classification {
        let red_flags = self.lexicon.red_flags_in(text);
        let compliments = self.lexicon.compliments_in(text);

        let sentiment = if !red_flags.is_empty() {
            Sentiment::Negative
        } else if !compliments.is_empty() {
            Sentiment::Positive
        } else {
            Sentiment::Neutral
        };

        let mut classification = Classification::default()
            .with_sentiment(sentiment)
            .with_compliments(compliments);
        if !red_flags.is_empty() {
            classification = classification.with_red_flags(red_flags.join(", "));
        }
        classification
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new(Arc::new(Lexicon::default()))
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    fn name(&self) -> &'static str {
        "keywords"
    }

    async fn classify_message(&self, text: &str) -> Result<Classification> {
        Ok(self.classify(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_red_flag_is_negative() {
        let c = KeywordClassifier::default()
            .classify_message("tum mujhe ignore karte ho, you're so cute though")
            .await
            .unwrap();
        assert_eq!(c.sentiment, Some(Sentiment::Negative));
        assert_eq!(c.red_flags.as_deref(), Some("ignore"));
        assert_eq!(c.compliments, Some(vec!["cute".to_string()]));
    }

    #[tokio::test]
    async fn test_compliment_is_positive() {
        let c = KeywordClassifier::default()
            .classify_message("kitna mast din tha")
            .await
            .unwrap();
        assert_eq!(c.sentiment, Some(Sentiment::Positive));
        assert_eq!(c.red_flags, None);
    }

    #[tokio::test]
    async fn test_plain_is_neutral() {
        let c = KeywordClassifier::default()
            .classify_message("kal milte hai")
            .await
            .unwrap();
        assert_eq!(c.sentiment, Some(Sentiment::Neutral));
        assert_eq!(c.compliment_count(), 0);
    }

    #[tokio::test]
    async fn test_session_uses_transcript() {
        use crate::Message;
        use chrono::{TimeDelta, TimeZone, Utc};

        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let sessions = crate::session::group_sessions(
            &[
                Message::new("A", "so toxic", ts),
                Message::new("B", "okay", ts),
            ],
            TimeDelta::hours(24),
        );
        let c = KeywordClassifier::default()
            .classify_session(&sessions[0])
            .await
            .unwrap();
        assert_eq!(c.red_flags.as_deref(), Some("toxic"));
    }
}
