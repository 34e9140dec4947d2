//! Chat-completions classifier.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Classification, Classifier, parse_free_text};
use crate::error::{AnalyzerError, ClassifierErrorKind, Result};
use crate::session::Session;

const NAME: &str = "llm";

const MESSAGE_MAX_TOKENS: u32 = 150;
const SESSION_MAX_TOKENS: u32 = 500;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Serialize, Deserialize, Debug)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChatMessage,
}

fn message_prompt(text: &str) -> String {
    format!(
        "Analyze the following Hinglish message:\n\
         \"{text}\" and provide:\n\
         1. Sentiment (Positive, Negative, Neutral, Lovable, Annoying, Avoiding).\n\
         2. Whether it contains any red flags (if yes, list them).\n\
         3. Whether it contains compliments (if yes, list them).\n\
         4. Attachment style (Anxious, Avoidant, Secure, or Unknown).\n\
         Answer with one line per item in the form \"Sentiment: ...\", \"Red flags: ...\", \
         \"Compliments: ...\", \"Attachment style: ...\", writing None where nothing applies."
    )
}

fn session_prompt(session: &Session) -> String {
    format!(
        "Analyze the following chat session:\n\
         {}\n\n\
         Provide the following insights:\n\
         1. Overall sentiment of the conversation (Positive, Negative, Neutral, Lovable, Annoying, Avoiding).\n\
         2. List any red flags in the conversation.\n\
         3. Identify compliments in the conversation, if any.\n\
         4. Provide a summary of the conversation.\n\
         Answer with one line per item in the form \"Sentiment: ...\", \"Red flags: ...\", \
         \"Compliments: ...\", \"Summary: ...\", writing None where nothing applies.",
        session.transcript()
    )
}

/// Classifier backed by an OpenAI-compatible `chat/completions` endpoint.
///
/// The reply is free text and goes through [`parse_free_text`].
#[derive(Debug, Clone)]
pub struct LlmClassifier {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl LlmClassifier {
    /// Creates a classifier using the public OpenAI API and `gpt-3.5-turbo`.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
        }
    }

    /// Points the classifier at another compatible server.
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

    async fn complete(&self, prompt: String, max_tokens: u32) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "system".to_string(),
                content: Some(prompt),
            }],
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
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

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AnalyzerError::classifier(NAME, e))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                AnalyzerError::classifier(
                    NAME,
                    ClassifierErrorKind::UnexpectedResponse("no completion choices".into()),
                )
            })?;

        debug!(model = %self.model, chars = content.len(), "completion received");
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl Classifier for LlmClassifier {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn classify_message(&self, text: &str) -> Result<Classification> {
        let reply = self.complete(message_prompt(text), MESSAGE_MAX_TOKENS).await?;
        Ok(parse_free_text(&reply))
    }

    async fn classify_session(&self, session: &Session) -> Result<Classification> {
        let reply = self.complete(session_prompt(session), SESSION_MAX_TOKENS).await?;
        Ok(parse_free_text(&reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Message;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_message_prompt_embeds_text() {
        let prompt = message_prompt("tum bahut cute ho");
        assert!(prompt.contains("\"tum bahut cute ho\""));
        assert!(prompt.contains("Attachment style"));
    }

    #[test]
    fn test_session_prompt_embeds_transcript() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let sessions = crate::session::group_sessions(
            &[Message::new("A", "hi", ts), Message::new("B", "hello", ts)],
            chrono::TimeDelta::hours(24),
        );
        let prompt = session_prompt(&sessions[0]);
        assert!(prompt.contains("- [A] hi\n- [B] hello"));
        assert!(prompt.contains("Summary"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let c = LlmClassifier::new("k").with_base_url("http://localhost:8080/v1/");
        assert_eq!(c.base_url, "http://localhost:8080/v1");
    }

    #[test]
    fn test_response_shape() {
        let json = r#"{"choices":[{"message":{"role":"assistant","content":"Sentiment: Positive"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("Sentiment: Positive")
        );
    }
}
