//! Bag-of-words vectorisers.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{MetricsError, MetricsResult};
use crate::utils::Matrix;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("valid regex"));

static STOPWORDS: LazyLock<HashSet<String>> =
    LazyLock::new(|| stop_words::get(stop_words::LANGUAGE::English).into_iter().collect());

/// Documents as term counts over a sorted vocabulary.
#[derive(Debug, Clone)]
pub struct DocumentTermCounts {
    /// Vocabulary in alphabetical order.
    pub vocabulary: Vec<String>,
    /// Per document, `(term index, count)` pairs in ascending term order.
    pub documents: Vec<Vec<(usize, u32)>>,
}

impl DocumentTermCounts {
    /// Tokenise `documents`, drop English stopwords and keep the
    /// `max_features` most frequent terms.
    pub fn fit(documents: &[String], max_features: usize) -> MetricsResult<Self> {
        if max_features == 0 {
            return Err(MetricsError::validation("max_features", "must be positive"));
        }
        let tokenised: Vec<Vec<String>> = documents.iter().map(|d| tokens(d)).collect();

        let mut frequency: HashMap<&str, u64> = HashMap::new();
        for doc in &tokenised {
            for token in doc {
                *frequency.entry(token.as_str()).or_default() += 1;
            }
        }
        if frequency.is_empty() {
            return Err(MetricsError::validation(
                "documents",
                "empty vocabulary; documents contain only stop words",
            ));
        }

        let mut ranked: Vec<(&str, u64)> = frequency.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_features);
        let mut vocabulary: Vec<String> = ranked.into_iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();

        let index: HashMap<&str, usize> =
            vocabulary.iter().enumerate().map(|(i, t)| (t.as_str(), i)).collect();
        let documents = tokenised
            .iter()
            .map(|doc| {
                let mut counts: HashMap<usize, u32> = HashMap::new();
                for token in doc {
                    if let Some(&i) = index.get(token.as_str()) {
                        *counts.entry(i).or_default() += 1;
                    }
                }
                let mut pairs: Vec<(usize, u32)> = counts.into_iter().collect();
                pairs.sort_unstable();
                pairs
            })
            .collect();

        Ok(Self { vocabulary, documents })
    }

    /// Dense TF-IDF rows: smoothed idf `ln((1+n)/(1+df)) + 1`, rows L2-normalised.
    #[must_use]
    pub fn tfidf(&self) -> Matrix {
        let n = self.documents.len();
        let v = self.vocabulary.len();
        let mut df = vec![0usize; v];
        for doc in &self.documents {
            for &(term, _) in doc {
                df[term] += 1;
            }
        }
        let idf: Vec<f64> = df
            .iter()
            .map(|&d| ((1.0 + n as f64) / (1.0 + d as f64)).ln() + 1.0)
            .collect();

        let mut matrix = Matrix::zeros(n, v);
        for (row, doc) in self.documents.iter().enumerate() {
            for &(term, count) in doc {
                matrix.set(row, term, f64::from(count) * idf[term]);
            }
            let norm = crate::utils::l2_norm(matrix.row(row));
            if norm > 0.0 {
                for value in matrix.row_mut(row) {
                    *value /= norm;
                }
            }
        }
        matrix
    }
}

fn tokens(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN
        .find_iter(&lowered)
        .map(|m| m.as_str())
        .filter(|t| !STOPWORDS.contains(*t))
        .map(String::from)
        .collect()
}
