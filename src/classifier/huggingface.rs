//! Hosted text-classification classifier.
//!
//! Only yields a sentiment. Red flags, compliments and attachment style
//! stay empty, so with this classifier compliments should come from the
//! keyword heuristic.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{Classification, Classifier, Sentiment};
use crate::error::{AnalyzerError, ClassifierErrorKind, Result};

const NAME: &str = "huggingface";

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
struct LabelScore {
    label: String,
    score: f64,
}

/// The API nests results one level deeper when given a single input on
/// some deployments.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum InferenceResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

impl InferenceResponse {
    fn best(self) -> Option<LabelScore> {
        let scores = match self {
            InferenceResponse::Nested(outer) => outer.into_iter().flatten().collect::<Vec<_>>(),
            InferenceResponse::Flat(scores) => scores,
        };
        scores
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

/// Maps a model label to a [`Sentiment`].
///
/// Star ratings map 1-2 to negative, 3 to neutral and 4-5 to positive.
/// `LABEL_0/1/2` style labels map to negative, neutral and positive.
///
/// ```rust
/// use chatlens::classifier::{Sentiment, map_label};
///
/// assert_eq!(map_label("5 stars"), Sentiment::Positive);
/// assert_eq!(map_label("1 star"), Sentiment::Negative);
/// assert_eq!(map_label("NEUTRAL"), Sentiment::Neutral);
/// ```
pub fn map_label(label: &str) -> Sentiment {
    let lower = label.trim().to_lowercase();

    if let Some(stars) = lower
        .strip_suffix("stars")
        .or_else(|| lower.strip_suffix("star"))
        .and_then(|n| n.trim().parse::<u8>().ok())
    {
        return match stars {
            0..=2 => Sentiment::Negative,
            3 => Sentiment::Neutral,
            _ => Sentiment::Positive,
        };
    }

    match lower.as_str() {
        "label_0" => Sentiment::Negative,
        "label_1" => Sentiment::Neutral,
        "label_2" => Sentiment::Positive,
        other => Sentiment::from_label(other),
    }
}

/// Classifier backed by a hosted inference API text-classification model.
#[derive(Debug, Clone)]
pub struct HuggingFaceClassifier {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl HuggingFaceClassifier {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "nlptown/bert-base-multilingual-uncased-sentiment".to_string(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}", self.base_url, self.model)
    }
}

#[async_trait]
impl Classifier for HuggingFaceClassifier {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn classify_message(&self, text: &str) -> Result<Classification> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&InferenceRequest { inputs: text })
            .send()
            .await
            .map_err(|e| AnalyzerError::classifier(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalyzerError::classifier(
                NAME,
                ClassifierErrorKind::Status {
                    status: status.as_u16(),
                    body,
                },
            ));
        }

        let parsed: InferenceResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::classifier(NAME, e))?;

        let best = parsed.best().ok_or_else(|| {
            AnalyzerError::classifier(
                NAME,
                ClassifierErrorKind::UnexpectedResponse("no labels returned".into()),
            )
        })?;

        tracing::trace!(label = %best.label, score = best.score, "label selected");
        Ok(Classification::default().with_sentiment(map_label(&best.label)))
    }
}
