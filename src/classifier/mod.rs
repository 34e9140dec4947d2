//! Classifier collaborators.
//!
//! The aggregator hands each analyzed unit (a message, or a whole session)
//! to a [`Classifier`] and folds the returned [`Classification`] into the
//! report. Three implementations are provided:
//!
//! | Classifier | Backend | Response shape |
//! |------------|---------|----------------|
//! | [`LlmClassifier`] | OpenAI-compatible chat completions | Free text, see [`parse_free_text`] |
//! | [`HuggingFaceClassifier`] | Hosted inference API | Scored labels |
//! | [`KeywordClassifier`] | Local [`Lexicon`] | Computed directly |
//!
//! Use [`build_classifier`] to pick one from [`ClassifierSettings`].

mod huggingface;
mod keyword;
mod llm;
mod response;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{ClassifierKind, ClassifierSettings};
use crate::error::{AnalyzerError, Result};
use crate::lexicon::Lexicon;
use crate::session::Session;

pub use huggingface::{HuggingFaceClassifier, map_label};
pub use keyword::KeywordClassifier;
pub use llm::LlmClassifier;
pub use response::parse_free_text;

/// Sentiment label for one analyzed unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
    Lovable,
    Annoying,
    Avoiding,
    /// Any label outside the known set, normalized.
    Other(String),
}

impl Sentiment {
    /// Reads a label, ignoring case, surrounding whitespace and trailing
    /// punctuation such as `"Positive."`.
    pub fn from_label(label: &str) -> Self {
        let normalized = label
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation())
            .trim()
            .to_lowercase();

        match normalized.as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "neutral" => Sentiment::Neutral,
            "lovable" => Sentiment::Lovable,
            "annoying" => Sentiment::Annoying,
            "avoiding" => Sentiment::Avoiding,
            _ => Sentiment::Other(normalized),
        }
    }

    /// Interest points this sentiment is worth.
    pub fn interest_score(&self) -> u64 {
        match self {
            Sentiment::Positive => 2,
            Sentiment::Neutral => 1,
            _ => 0,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Negative => write!(f, "negative"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Lovable => write!(f, "lovable"),
            Sentiment::Annoying => write!(f, "annoying"),
            Sentiment::Avoiding => write!(f, "avoiding"),
            Sentiment::Other(label) => write!(f, "{label}"),
        }
    }
}

/// What a classifier found in one unit. Every field is optional; a missing
/// field contributes nothing to the report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub sentiment: Option<Sentiment>,
    /// Red flags as reported. `None` when the classifier reported none.
    pub red_flags: Option<String>,
    /// Compliments found. `Some(vec![])` when the classifier said "None".
    pub compliments: Option<Vec<String>>,
    pub attachment_style: Option<String>,
    /// Session summary, only produced for sessions.
    pub summary: Option<String>,
}

impl Classification {
    #[must_use]
    pub fn with_sentiment(mut self, sentiment: Sentiment) -> Self {
        self.sentiment = Some(sentiment);
        self
    }

    #[must_use]
    pub fn with_red_flags(mut self, red_flags: impl Into<String>) -> Self {
        self.red_flags = Some(red_flags.into());
        self
    }

    #[must_use]
    pub fn with_compliments<S: Into<String>>(mut self, compliments: impl IntoIterator<Item = S>) -> Self {
        self.compliments = Some(compliments.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_attachment_style(mut self, style: impl Into<String>) -> Self {
        self.attachment_style = Some(style.into());
        self
    }

    #[must_use]
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Number of compliments, with a missing list counting as zero.
    pub fn compliment_count(&self) -> u64 {
        self.compliments.as_ref().map_or(0, |c| c.len() as u64)
    }
}

/// Classifies one message or one session.
///
/// Implementations must be cheap to share: the aggregator calls them
/// concurrently through an `Arc<dyn Classifier>`.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Short name used in logs and the report.
    fn name(&self) -> &'static str;

    /// Classifies a single message body.
    async fn classify_message(&self, text: &str) -> Result<Classification>;

    /// Classifies a whole session.
    ///
    /// The default classifies the rendered [`Session::transcript`] as if it
    /// were one message.
    async fn classify_session(&self, session: &Session) -> Result<Classification> {
        self.classify_message(&session.transcript()).await
    }
}

/// Builds the classifier selected by `settings`.
///
/// Fails with a configuration error when a hosted classifier is selected
/// without its API key.
pub fn build_classifier(
    settings: &ClassifierSettings,
    lexicon: Arc<Lexicon>,
) -> Result<Arc<dyn Classifier>> {
    let classifier: Arc<dyn Classifier> = match settings.kind {
        ClassifierKind::Keywords => Arc::new(KeywordClassifier::new(lexicon)),
        ClassifierKind::Llm => {
            let key = settings
                .openai_api_key
                .clone()
                .ok_or_else(|| AnalyzerError::config("OPENAI_API_KEY", "required for the llm classifier"))?;
            Arc::new(
                LlmClassifier::new(key)
                    .with_base_url(&settings.openai_base_url)
                    .with_model(&settings.openai_model),
            )
        }
        ClassifierKind::HuggingFace => {
            let key = settings.hf_api_key.clone().ok_or_else(|| {
                AnalyzerError::config("HF_API_KEY", "required for the huggingface classifier")
            })?;
            Arc::new(
                HuggingFaceClassifier::new(key)
                    .with_base_url(&settings.hf_base_url)
                    .with_model(&settings.hf_model),
            )
        }
    };
    tracing::info!(classifier = classifier.name(), "classifier ready");
    Ok(classifier)
}
