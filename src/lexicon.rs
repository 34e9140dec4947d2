//! Keyword lexicons used for word filtering and keyword scoring.
//!
//! A [`Lexicon`] is immutable once built and is shared (behind an `Arc`)
//! between the aggregator and the keyword classifier, so tests and
//! deployments for other dialects can swap it out wholesale.
//!
//! # Example
//!
//! ```rust
//! use chatlens::lexicon::Lexicon;
//!
//! let lexicon = Lexicon::hinglish();
//! assert!(lexicon.is_stopword("hai"));
//! assert_eq!(lexicon.compliments_in("you are so cute and amazing"), vec!["cute", "amazing"]);
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyzerError, Result};

const HINGLISH_STOPWORDS: &[&str] = &[
    "aur", "lekin", "hai", "ka", "ki", "ke", "mein", "ko", "se", "hi", "bhi", "h", "to", "mai",
    "tha",
];

const HINGLISH_COMPLIMENTS: &[&str] = &[
    "achha",
    "pyaara",
    "mast",
    "shandar",
    "badhia",
    "awesome",
    "cute",
    "amazing",
    "great",
    "good",
    "wonderful",
    "love",
];

const HINGLISH_RED_FLAGS: &[&str] = &[
    "gussa", "ignore", "jealous", "hate", "toxic", "ladai", "bekar",
];

/// Raw lexicon lists, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LexiconFile {
    #[serde(default)]
    stopwords: Vec<String>,
    #[serde(default)]
    compliments: Vec<String>,
    #[serde(default, alias = "redFlags")]
    red_flags: Vec<String>,
}

/// Stopwords, compliment terms and red-flag terms for one dialect.
///
/// All terms are stored lower-cased. Compliment and red-flag terms keep
/// their declaration order, which is the order matches are reported in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexicon {
    stopwords: HashSet<String>,
    compliments: Vec<String>,
    red_flags: Vec<String>,
}

impl Lexicon {
    /// Builds a lexicon from term lists. Terms are lower-cased and trimmed;
    /// blank and duplicate terms are dropped.
    pub fn new<S: AsRef<str>>(stopwords: &[S], compliments: &[S], red_flags: &[S]) -> Self {
        Self {
            stopwords: stopwords.iter().filter_map(normalize).collect(),
            compliments: dedup(compliments),
            red_flags: dedup(red_flags),
        }
    }

    /// The built-in Hinglish lexicon.
    pub fn hinglish() -> Self {
        Self::new(HINGLISH_STOPWORDS, HINGLISH_COMPLIMENTS, HINGLISH_RED_FLAGS)
    }

    /// A lexicon with no terms at all.
    pub fn empty() -> Self {
        Self::new::<&str>(&[], &[], &[])
    }

    /// Parses a lexicon from JSON:
    /// `{"stopwords": [...], "compliments": [...], "red_flags": [...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: LexiconFile = serde_json::from_str(json)
            .map_err(|e| AnalyzerError::invalid_input("lexicon file", e.to_string()))?;
        Ok(Self::new(&file.stopwords, &file.compliments, &file.red_flags))
    }

    /// Reads a lexicon JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Returns `true` if `word` (already lower-cased) is a stopword.
    pub fn is_stopword(&self, word: &str) -> bool {
        self.stopwords.contains(word)
    }

    /// Compliment terms contained in `text`, each reported at most once.
    ///
    /// Matching is a case-insensitive substring test, so "goodnight" counts
    /// as "good".
    pub fn compliments_in(&self, text: &str) -> Vec<&str> {
        matching_terms(&self.compliments, text)
    }

    /// Red-flag terms contained in `text`, each reported at most once.
    pub fn red_flags_in(&self, text: &str) -> Vec<&str> {
        matching_terms(&self.red_flags, text)
    }

    pub fn stopwords(&self) -> impl Iterator<Item = &str> {
        self.stopwords.iter().map(String::as_str)
    }

    pub fn compliments(&self) -> &[String] {
        &self.compliments
    }

    pub fn red_flags(&self) -> &[String] {
        &self.red_flags
    }
}

impl Default for Lexicon {
    fn default() -> Self {
        Self::hinglish()
    }
}

fn normalize<S: AsRef<str>>(term: &S) -> Option<String> {
    let term = term.as_ref().trim().to_lowercase();
    (!term.is_empty()).then_some(term)
}

fn dedup<S: AsRef<str>>(terms: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .iter()
        .filter_map(normalize)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

fn matching_terms<'a>(terms: &'a [String], text: &str) -> Vec<&'a str> {
    let lower = text.to_lowercase();
    terms
        .iter()
        .filter(|term| lower.contains(term.as_str()))
        .map(String::as_str)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hinglish_stopwords() {
        let lexicon = Lexicon::hinglish();
        for word in ["aur", "hai", "bhi", "tha"] {
            assert!(lexicon.is_stopword(word), "{word} should be a stopword");
        }
        assert!(!lexicon.is_stopword("pizza"));
    }

    #[test]
    fn test_compliment_counted_once_per_term() {
        let lexicon = Lexicon::hinglish();
        assert_eq!(lexicon.compliments_in("amazing amazing"), vec!["amazing"]);
    }

    #[test]
    fn test_compliment_match_is_case_insensitive() {
        let lexicon = Lexicon::hinglish();
        assert_eq!(lexicon.compliments_in("You look GREAT"), vec!["great"]);
    }

    #[test]
    fn test_compliment_substring_policy() {
        let lexicon = Lexicon::hinglish();
        assert_eq!(lexicon.compliments_in("goodnight"), vec!["good"]);
    }

    #[test]
    fn test_red_flags_in() {
        let lexicon = Lexicon::hinglish();
        assert_eq!(
            lexicon.red_flags_in("Tum mujhe IGNORE karte ho, I hate it"),
            vec!["ignore", "hate"]
        );
        assert!(lexicon.red_flags_in("sab theek hai").is_empty());
    }

    #[test]
    fn test_new_normalizes_and_dedups() {
        let lexicon = Lexicon::new(&[" The "], &["Nice", "nice", ""], &[]);
        assert!(lexicon.is_stopword("the"));
        assert_eq!(lexicon.compliments(), ["nice".to_string()]);
    }

    #[test]
    fn test_from_json() {
        let lexicon =
            Lexicon::from_json(r#"{"stopwords": ["the"], "compliments": ["nice"], "redFlags": ["rude"]}"#)
                .unwrap();
        assert!(lexicon.is_stopword("the"));
        assert_eq!(lexicon.compliments_in("so nice"), vec!["nice"]);
        assert_eq!(lexicon.red_flags_in("so rude"), vec!["rude"]);
    }

    #[test]
    fn test_from_json_missing_lists_default_empty() {
        let lexicon = Lexicon::from_json(r#"{"stopwords": ["a"]}"#).unwrap();
        assert!(lexicon.compliments().is_empty());
        assert!(lexicon.red_flags().is_empty());
    }

    #[test]
    fn test_from_json_invalid() {
        let err = Lexicon::from_json("not json").unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn test_empty_lexicon() {
        let lexicon = Lexicon::empty();
        assert!(lexicon.compliments_in("amazing").is_empty());
        assert_eq!(lexicon.stopwords().count(), 0);
    }
}
