//! Text normalisation shared by filters, deduplication and reference matching.

use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid regex"));

/// Lower-case, replace runs of non-alphanumerics with one space and trim.
#[must_use]
pub fn normalise_text(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALNUM.replace_all(&lowered, " ").trim().to_string()
}

/// Lower-cased word tokens.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    WORD.find_iter(&lowered).map(|m| m.as_str().to_string()).collect()
}

/// Strip one common English suffix when at least three characters remain.
#[must_use]
pub fn lemmatise(token: &str) -> String {
    for suffix in ["ing", "ed", "es", "s"] {
        if let Some(stem) = token.strip_suffix(suffix) {
            if stem.chars().count() >= 3 {
                return stem.to_string();
            }
        }
    }
    token.to_string()
}

/// Tokenise and lemmatise.
#[must_use]
pub fn lemmatise_tokens(text: &str) -> Vec<String> {
    tokenize(text).iter().map(|t| lemmatise(t)).collect()
}
