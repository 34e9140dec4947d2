//! Configuration types for parsing, analysis, classifiers and the server.
//!
//! Every struct is plain data with `with_*` builders, so library users can
//! configure chatlens without touching environment variables. The binary
//! builds a [`Settings`] from the environment via [`Settings::from_env`].
//!
//! # Example
//!
//! ```rust
//! use chatlens::config::{AnalysisConfig, ComplimentSource};
//! use std::time::Duration;
//!
//! let config = AnalysisConfig::new()
//!     .with_group_sessions(true)
//!     .with_concurrency(8)
//!     .with_classifier_timeout(Duration::from_secs(10))
//!     .with_compliment_source(ComplimentSource::Classifier);
//!
//! assert_eq!(config.session_gap().num_hours(), 24);
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};
use crate::lexicon::Lexicon;

/// Configuration for transcript parsing.
///
/// The defaults reproduce the plain behavior: every line that matches a
/// grammar becomes a message and every other line is dropped.
///
/// # Example
///
/// ```rust
/// use chatlens::config::ParserConfig;
///
/// let config = ParserConfig::new()
///     .with_skip_system_messages(true)
///     .with_join_continuations(true);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Drop export notices such as "Messages and calls are end-to-end
    /// encrypted" (default: false)
    pub skip_system_messages: bool,

    /// Append non-matching lines to the previous message instead of
    /// discarding them (default: false)
    pub join_continuations: bool,
}

impl ParserConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables system message filtering.
    #[must_use]
    pub fn with_skip_system_messages(mut self, skip: bool) -> Self {
        self.skip_system_messages = skip;
        self
    }

    /// Enables or disables joining of multi-line messages.
    #[must_use]
    pub fn with_join_continuations(mut self, join: bool) -> Self {
        self.join_continuations = join;
        self
    }
}

/// Where the `compliments` tally of a report comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplimentSource {
    /// Count distinct compliment lexicon terms found in each message.
    #[default]
    Keywords,
    /// Count the compliments listed by the classifier for each unit.
    Classifier,
}

/// Configuration for the aggregation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Classify whole sessions instead of single messages (default: false)
    pub group_sessions: bool,

    /// Gap that closes a session, in hours (default: 24)
    pub session_gap_hours: u32,

    /// Maximum number of classifier calls in flight (default: 4)
    pub concurrency: usize,

    /// Per-call classifier timeout (default: 30s)
    pub classifier_timeout: Duration,

    /// Extra attempts after a failed classifier call (default: 1)
    pub classifier_retries: u32,

    /// Delay before the first retry; doubles on each further attempt (default: 250ms)
    pub retry_backoff: Duration,

    /// Words kept per sender in `topWords` (default: 5)
    pub top_words_limit: usize,

    /// Source of the `compliments` tally (default: keywords)
    pub compliment_source: ComplimentSource,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            group_sessions: false,
            session_gap_hours: 24,
            concurrency: 4,
            classifier_timeout: Duration::from_secs(30),
            classifier_retries: 1,
            retry_backoff: Duration::from_millis(250),
            top_words_limit: 5,
            compliment_source: ComplimentSource::Keywords,
        }
    }
}

impl AnalysisConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session gap as a signed duration.
    pub fn session_gap(&self) -> TimeDelta {
        TimeDelta::hours(i64::from(self.session_gap_hours))
    }

    /// Enables or disables session grouping.
    #[must_use]
    pub fn with_group_sessions(mut self, enabled: bool) -> Self {
        self.group_sessions = enabled;
        self
    }

    /// Sets the session gap in hours.
    #[must_use]
    pub fn with_session_gap_hours(mut self, hours: u32) -> Self {
        self.session_gap_hours = hours;
        self
    }

    /// Sets the classifier concurrency. Values below 1 are raised to 1.
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the per-call classifier timeout.
    #[must_use]
    pub fn with_classifier_timeout(mut self, timeout: Duration) -> Self {
        self.classifier_timeout = timeout;
        self
    }

    /// Sets the retry budget and initial backoff.
    #[must_use]
    pub fn with_retries(mut self, retries: u32, backoff: Duration) -> Self {
        self.classifier_retries = retries;
        self.retry_backoff = backoff;
        self
    }

    /// Sets how many top words are kept per sender.
    #[must_use]
    pub fn with_top_words_limit(mut self, limit: usize) -> Self {
        self.top_words_limit = limit;
        self
    }

    /// Sets the compliment source.
    #[must_use]
    pub fn with_compliment_source(mut self, source: ComplimentSource) -> Self {
        self.compliment_source = source;
        self
    }
}

/// Which classifier collaborator backs the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Offline lexicon heuristic
    #[default]
    Keywords,
    /// OpenAI-compatible chat completion, free-text response
    Llm,
    /// Hosted text classification, structured label
    #[cfg_attr(feature = "cli", value(name = "huggingface", alias = "hf"))]
    #[serde(alias = "hf")]
    HuggingFace,
}

impl std::fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifierKind::Keywords => write!(f, "keywords"),
            ClassifierKind::Llm => write!(f, "llm"),
            ClassifierKind::HuggingFace => write!(f, "huggingface"),
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keywords" | "keyword" => Ok(ClassifierKind::Keywords),
            "llm" | "openai" => Ok(ClassifierKind::Llm),
            "huggingface" | "hf" => Ok(ClassifierKind::HuggingFace),
            _ => Err(format!(
                "Unknown classifier: '{}'. Expected one of: keywords, llm, huggingface",
                s
            )),
        }
    }
}

/// Connection settings for the hosted classifiers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierSettings {
    /// Selected classifier (default: keywords)
    pub kind: ClassifierKind,

    /// API key for the chat-completions endpoint
    #[serde(skip_serializing)]
    pub openai_api_key: Option<String>,

    /// Base URL of the chat-completions API (default: `https://api.openai.com/v1`)
    pub openai_base_url: String,

    /// Chat model name (default: `gpt-3.5-turbo`)
    pub openai_model: String,

    /// API key for the hosted inference API
    #[serde(skip_serializing)]
    pub hf_api_key: Option<String>,

    /// Base URL of the inference API (default: `https://api-inference.huggingface.co/models`)
    pub hf_base_url: String,

    /// Sentiment model name
    pub hf_model: String,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::Keywords,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            openai_model: "gpt-3.5-turbo".to_string(),
            hf_api_key: None,
            hf_base_url: "https://api-inference.huggingface.co/models".to_string(),
            hf_model: "nlptown/bert-base-multilingual-uncased-sentiment".to_string(),
        }
    }
}

impl ClassifierSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects the classifier.
    #[must_use]
    pub fn with_kind(mut self, kind: ClassifierKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the chat-completions key.
    #[must_use]
    pub fn with_openai_api_key(mut self, key: impl Into<String>) -> Self {
        self.openai_api_key = Some(key.into());
        self
    }

    /// Sets the chat-completions base URL.
    #[must_use]
    pub fn with_openai_base_url(mut self, url: impl Into<String>) -> Self {
        self.openai_base_url = url.into();
        self
    }

    /// Sets the inference API key.
    #[must_use]
    pub fn with_hf_api_key(mut self, key: impl Into<String>) -> Self {
        self.hf_api_key = Some(key.into());
        self
    }

    /// Sets the inference API base URL.
    #[must_use]
    pub fn with_hf_base_url(mut self, url: impl Into<String>) -> Self {
        self.hf_base_url = url.into();
        self
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`)
    pub host: String,

    /// Bind port (default: 5000)
    pub port: u16,

    /// SQLite URL for best-effort message persistence (default: none)
    pub database_url: Option<String>,

    /// Largest accepted request body (default: 20MB)
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            database_url: None,
            max_body_bytes: 20 * 1024 * 1024, // 20MB
        }
    }
}

impl ServerConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Sets the bind port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the bind host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the persistence database URL.
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }
}

/// Everything the binary needs, gathered from the environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub parser: ParserConfig,
    pub analysis: AnalysisConfig,
    pub classifier: ClassifierSettings,
    /// Custom lexicon JSON file; the built-in Hinglish lexicon is used when unset
    pub lexicon_path: Option<PathBuf>,
}

impl Settings {
    /// Reads settings from process environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `HOST` / `PORT` | `0.0.0.0` / `5000` |
    /// | `DATABASE_URL` | unset (no persistence) |
    /// | `CLASSIFIER` | `llm` when `OPENAI_API_KEY` is set, else `keywords` |
    /// | `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL` | see [`ClassifierSettings`] |
    /// | `HF_API_KEY`, `HF_BASE_URL`, `HF_MODEL` | see [`ClassifierSettings`] |
    /// | `CLASSIFIER_CONCURRENCY` | `4` |
    /// | `CLASSIFIER_TIMEOUT_SECS` | `30` |
    /// | `CLASSIFIER_RETRIES` | `1` |
    /// | `SESSION_GAP_HOURS` | `24` |
    /// | `GROUP_SESSIONS` | `false` |
    /// | `LEXICON_PATH` | unset |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut settings = Settings::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            settings.server.host = host;
        }
        if let Some(port) = get("PORT") {
            settings.server.port = parse_value("PORT", &port)?;
        }
        settings.server.database_url = get("DATABASE_URL");

        let classifier = &mut settings.classifier;
        classifier.openai_api_key = get("OPENAI_API_KEY");
        if let Some(url) = get("OPENAI_BASE_URL") {
            classifier.openai_base_url = url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            classifier.openai_model = model;
        }
        classifier.hf_api_key = get("HF_API_KEY");
        if let Some(url) = get("HF_BASE_URL") {
            classifier.hf_base_url = url;
        }
        if let Some(model) = get("HF_MODEL") {
            classifier.hf_model = model;
        }
        classifier.kind = match get("CLASSIFIER") {
            Some(kind) => {
                ClassifierKind::from_str(&kind).map_err(|e| AnalyzerError::config("CLASSIFIER", e))?
            }
            None if classifier.openai_api_key.is_some() => ClassifierKind::Llm,
            None => ClassifierKind::Keywords,
        };

        let analysis = &mut settings.analysis;
        if let Some(value) = get("CLASSIFIER_CONCURRENCY") {
            let concurrency: usize = parse_value("CLASSIFIER_CONCURRENCY", &value)?;
            analysis.concurrency = concurrency.max(1);
        }
        if let Some(value) = get("CLASSIFIER_TIMEOUT_SECS") {
            analysis.classifier_timeout =
                Duration::from_secs(parse_value("CLASSIFIER_TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = get("CLASSIFIER_RETRIES") {
            analysis.classifier_retries = parse_value("CLASSIFIER_RETRIES", &value)?;
        }
        if let Some(value) = get("SESSION_GAP_HOURS") {
            analysis.session_gap_hours = parse_value("SESSION_GAP_HOURS", &value)?;
        }
        if let Some(value) = get("GROUP_SESSIONS") {
            analysis.group_sessions = parse_value("GROUP_SESSIONS", &value)?;
        }

        settings.lexicon_path = get("LEXICON_PATH").map(PathBuf::from);

        Ok(settings)
    }

    /// Loads the lexicon at [`lexicon_path`](Self::lexicon_path), or the
    /// built-in one when unset.
    pub fn load_lexicon(&self) -> Result<Lexicon> {
        match &self.lexicon_path {
            Some(path) => Lexicon::from_json_file(path),
            None => Ok(Lexicon::hinglish()),
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e: T::Err| AnalyzerError::config(key, format!("'{}': {}", raw, e)))
}
