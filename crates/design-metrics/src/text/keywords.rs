//! Keyword extraction with RAKE (Rapid Automatic Keyword Extraction).

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static PHRASE_DELIMITERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,.!?;:\n]\s*").expect("valid regex"));

static WORD_SPLIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9+\-#]").expect("valid regex"));

const MINIMAL_STOPWORDS: &[&str] = &["and", "of", "the", "to", "in", "for", "a", "an", "on", "with"];

static ENGLISH_STOPWORDS: LazyLock<HashSet<String>> =
    LazyLock::new(|| stop_words::get(stop_words::LANGUAGE::English).into_iter().collect());

/// A ranked keyword phrase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Keyword {
    /// Space-joined phrase words.
    pub phrase: String,
    /// Sum of member word scores.
    pub score: f64,
}

/// Stopword list that breaks candidate phrases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StopwordSet {
    /// The ten most common function words.
    #[default]
    Minimal,
    /// The full English list from `stop-words`.
    English,
}

impl StopwordSet {
    fn contains(self, word: &str) -> bool {
        match self {
            Self::Minimal => MINIMAL_STOPWORDS.contains(&word),
            Self::English => ENGLISH_STOPWORDS.contains(word),
        }
    }
}

/// RAKE parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RakeOptions {
    /// Number of phrases returned.
    pub top_k: usize,
    /// Phrase-breaking stopwords.
    pub stopwords: StopwordSet,
}

impl Default for RakeOptions {
    fn default() -> Self {
        Self { top_k: crate::config::defaults::RAKE_TOP_K, stopwords: StopwordSet::Minimal }
    }
}

/// Extract up to `top_k` ranked keyword phrases from `text`.
///
/// # Example
///
/// ```
/// use design_metrics::text::rake_keywords;
///
/// let keywords = rake_keywords(
///     "Design research explores collaboration and innovation in architecture.",
///     3,
/// );
/// assert_eq!(keywords[0].phrase, "design research explores collaboration");
/// ```
#[must_use]
pub fn rake_keywords(text: &str, top_k: usize) -> Vec<Keyword> {
    rake_keywords_with(text, &RakeOptions { top_k, ..RakeOptions::default() })
}

/// RAKE with explicit options.
#[must_use]
pub fn rake_keywords_with(text: &str, options: &RakeOptions) -> Vec<Keyword> {
    let phrases = candidate_phrases(text, options.stopwords);

    let mut frequency: HashMap<&str, usize> = HashMap::new();
    let mut degree: HashMap<&str, usize> = HashMap::new();
    for phrase in &phrases {
        let unique: HashSet<&str> = phrase.iter().map(String::as_str).collect();
        for word in unique {
            *frequency.entry(word).or_default() += 1;
            *degree.entry(word).or_default() += phrase.len() - 1;
        }
    }

    let word_score = |word: &str| -> f64 {
        let freq = frequency.get(word).copied().unwrap_or(1) as f64;
        let deg = degree.get(word).copied().unwrap_or(0) as f64;
        (deg + freq) / freq
    };

    let mut scored: Vec<Keyword> = phrases
        .iter()
        .map(|phrase| Keyword { phrase: phrase.join(" "), score: phrase.iter().map(|w| word_score(w)).sum() })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(options.top_k);
    tracing::debug!(phrases = phrases.len(), returned = scored.len(), "Extracted RAKE keywords");
    scored
}

fn candidate_phrases(text: &str, stopwords: StopwordSet) -> Vec<Vec<String>> {
    let lowered = text.to_lowercase();
    let mut phrases = Vec::new();
    for sentence in PHRASE_DELIMITERS.split(&lowered) {
        let mut phrase: Vec<String> = Vec::new();
        for word in WORD_SPLIT.split(sentence).filter(|w| !w.is_empty()) {
            if stopwords.contains(word) {
                if !phrase.is_empty() {
                    phrases.push(std::mem::take(&mut phrase));
                }
            } else {
                phrase.push(word.to_string());
            }
        }
        if !phrase.is_empty() {
            phrases.push(phrase);
        }
    }
    phrases
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_phrases_split_on_stopwords() {
        let phrases = candidate_phrases("Tools for the design of BIM, C++ and C#", StopwordSet::Minimal);
        assert_eq!(
            phrases,
            vec![
                vec!["tools".to_string()],
                vec!["design".to_string()],
                vec!["bim".to_string()],
                vec!["c++".to_string()],
                vec!["c#".to_string()],
            ]
        );
    }

    #[test]
    fn test_english_stopwords_break_more_phrases() {
        let minimal = rake_keywords_with("we study design", &RakeOptions::default());
        let english = rake_keywords_with(
            "we study design",
            &RakeOptions { stopwords: StopwordSet::English, ..RakeOptions::default() },
        );
        assert_eq!(minimal[0].phrase, "we study design");
        assert!(english.iter().all(|k| !k.phrase.contains("we")));
    }

    #[test]
    fn test_top_k_zero_is_empty() {
        assert!(rake_keywords("design research", 0).is_empty());
    }
}
