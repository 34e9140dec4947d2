//! Classifier-independent statistics.
//!
//! Everything here is a pure function of the message list and the
//! [`Lexicon`]; the aggregator runs it before fanning out classifier calls.

use std::collections::{BTreeMap, HashMap};

use chrono::TimeDelta;

use crate::Message;
use crate::lexicon::Lexicon;

/// Word frequencies for one sender, remembering first-seen order for
/// tie-breaks.
#[derive(Debug, Clone, Default)]
pub struct WordCounter {
    counts: HashMap<String, (u64, usize)>,
    seen: usize,
}

impl WordCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, word: String) {
        let order = self.seen;
        let entry = self.counts.entry(word).or_insert((0, order));
        if entry.0 == 0 {
            self.seen += 1;
        }
        entry.0 += 1;
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// The `limit` most frequent words, highest first. Equal counts keep the
    /// order the words were first seen in.
    pub fn top(&self, limit: usize) -> Vec<(String, u64)> {
        let mut ranked: Vec<(&String, &(u64, usize))> = self.counts.iter().collect();
        ranked.sort_by(|(_, (ca, oa)), (_, (cb, ob))| cb.cmp(ca).then(oa.cmp(ob)));
        ranked
            .into_iter()
            .take(limit)
            .map(|(word, (count, _))| (word.clone(), *count))
            .collect()
    }
}

/// Lower-cases `text`, splits on whitespace and drops stopwords.
pub fn tokenize(text: &str, lexicon: &Lexicon) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|word| !lexicon.is_stopword(word))
        .map(str::to_string)
        .collect()
}

/// Top words per sender.
pub fn top_words(
    messages: &[Message],
    lexicon: &Lexicon,
    limit: usize,
) -> BTreeMap<String, Vec<(String, u64)>> {
    let mut counters: HashMap<&str, WordCounter> = HashMap::new();
    for msg in messages {
        let counter = counters.entry(&msg.sender).or_default();
        for word in tokenize(&msg.content, lexicon) {
            counter.add(word);
        }
    }
    counters
        .into_iter()
        .map(|(sender, counter)| (sender.to_string(), counter.top(limit)))
        .collect()
}

/// Response-time samples between adjacent messages from different senders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseTimes {
    /// Whole minutes, truncated toward zero. Never negative.
    pub samples: Vec<i64>,
    /// Sender changes whose timestamps went backwards.
    pub skipped: usize,
}

impl ResponseTimes {
    /// Collects samples from `messages` in their given order.
    pub fn collect(messages: &[Message]) -> Self {
        let mut times = Self::default();
        for pair in messages.windows(2) {
            let [prev, next] = pair else { continue };
            if prev.sender == next.sender {
                continue;
            }
            let delta = next.timestamp - prev.timestamp;
            if delta < TimeDelta::zero() {
                times.skipped += 1;
            } else {
                times.samples.push(delta.num_minutes());
            }
        }
        times
    }

    /// Mean of the samples, or `None` when there are none.
    pub fn average(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let total: i64 = self.samples.iter().sum();
        Some(total as f64 / self.samples.len() as f64)
    }
}

/// Messages per `"Mon YYYY"` label and sender.
pub fn monthly_messages(messages: &[Message]) -> BTreeMap<String, BTreeMap<String, u64>> {
    let mut months: BTreeMap<String, BTreeMap<String, u64>> = BTreeMap::new();
    for msg in messages {
        *months
            .entry(msg.month_label())
            .or_default()
            .entry(msg.sender.clone())
            .or_default() += 1;
    }
    months
}

/// Messages per sender.
pub fn message_counts(messages: &[Message]) -> BTreeMap<String, u64> {
    let mut counts: BTreeMap<String, u64> = BTreeMap::new();
    for msg in messages {
        *counts.entry(msg.sender.clone()).or_default() += 1;
    }
    counts
}
