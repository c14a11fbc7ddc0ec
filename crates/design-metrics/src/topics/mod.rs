//! Topic modelling over short scholarly texts.
//!
//! Two in-process models are available:
//!
//! - **LDA**: term counts (English stopwords removed, `max_features` most
//!   frequent terms) fitted by collapsed Gibbs sampling.
//! - **c-TF-IDF**: TF-IDF rows clustered with k-means; a document's topic
//!   weights are its normalised `1 / (1 + distance)` to each centroid.
//!
//! Both are seeded by `random_state`, so repeated fits give identical output.

mod kmeans;
mod lda;
mod vectorize;

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::config::defaults;
use crate::error::{MetricsError, MetricsResult};
use crate::models::TopicModelKind;
use crate::table::Table;
use crate::utils::Matrix;
pub use vectorize::DocumentTermCounts;

/// Topic model parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopicOptions {
    /// Model family.
    pub model: TopicModelKind,
    /// Requested topics.
    pub k: usize,
    /// Vocabulary cap.
    pub max_features: usize,
    /// Seed.
    pub random_state: u64,
}

impl Default for TopicOptions {
    fn default() -> Self {
        Self {
            model: TopicModelKind::Lda,
            k: defaults::TOPIC_COUNT,
            max_features: defaults::TOPIC_MAX_FEATURES,
            random_state: defaults::RANDOM_STATE,
        }
    }
}

/// Fitted topic model.
#[derive(Debug, Clone, Serialize)]
pub struct TopicModelResult {
    /// Model family.
    pub model_type: TopicModelKind,
    /// `topics × terms` weights.
    pub topic_term_matrix: Matrix,
    /// Vocabulary, aligned with the matrix columns.
    pub feature_names: Vec<String>,
    /// `documents × topics` weights.
    pub doc_topic_matrix: Matrix,
    /// Identifier of each document row.
    pub document_ids: Vec<String>,
    /// Fit diagnostics.
    pub metadata: BTreeMap<String, Value>,
}

impl TopicModelResult {
    /// Number of topics.
    #[must_use]
    pub fn topic_count(&self) -> usize {
        self.topic_term_matrix.nrows()
    }
}

/// Fit a topic model; document ids are the input positions.
pub fn fit<S: AsRef<str>>(texts: &[S], options: &TopicOptions) -> MetricsResult<TopicModelResult> {
    let pairs: Vec<(String, String)> = texts
        .iter()
        .enumerate()
        .map(|(i, t)| (i.to_string(), t.as_ref().to_string()))
        .collect();
    fit_keyed(&pairs, options)
}

/// Fit a topic model over `(id, text)` pairs.
///
/// Blank documents are dropped. The topic count is `min(k, documents)`,
/// further capped by the vocabulary size for LDA.
pub fn fit_keyed(documents: &[(String, String)], options: &TopicOptions) -> MetricsResult<TopicModelResult> {
    let (ids, texts): (Vec<String>, Vec<String>) = documents
        .iter()
        .map(|(id, text)| (id.clone(), text.trim().to_string()))
        .filter(|(_, text)| !text.is_empty())
        .unzip();
    if texts.is_empty() {
        return Err(MetricsError::validation("text", "No textual documents supplied for topic modelling"));
    }
    if options.k < 1 {
        return Err(MetricsError::validation("k", "k must be at least 1"));
    }
    let topics = options.k.min(texts.len());

    let mut metadata = BTreeMap::new();
    metadata.insert("documents".to_string(), Value::from(texts.len()));
    metadata.insert("random_state".to_string(), Value::from(options.random_state));

    let (topic_term_matrix, doc_topic_matrix, feature_names) = match options.model {
        TopicModelKind::Lda => {
            let counts = DocumentTermCounts::fit(&texts, options.max_features)?;
            let topics = topics.min(counts.vocabulary.len());
            let fitted = lda::fit(&counts, topics, options.random_state);
            metadata.insert("iterations".to_string(), Value::from(lda::ITERATIONS));
            metadata.insert("doc_topic_prior".to_string(), Value::from(1.0 / topics as f64));
            (fitted.components, fitted.doc_topics, counts.vocabulary)
        }
        TopicModelKind::Ctfidf => {
            let counts = DocumentTermCounts::fit(&texts, options.max_features)?;
            let weights = counts.tfidf();
            let fitted = kmeans::fit(&weights, topics, options.random_state);
            metadata.insert("inertia".to_string(), Value::from(fitted.inertia));
            metadata.insert("iterations".to_string(), Value::from(fitted.iterations));
            (fitted.centers, normalise_distances(&fitted.distances), counts.vocabulary)
        }
        TopicModelKind::Bertopic => {
            return Err(MetricsError::unavailable(
                "BERTopic needs a transformer backend, which this build does not include",
            ));
        }
    };
    metadata.insert("vocabulary_size".to_string(), Value::from(feature_names.len()));

    tracing::info!(
        model = %options.model,
        documents = texts.len(),
        topics = topic_term_matrix.nrows(),
        vocabulary = feature_names.len(),
        "Fitted topic model"
    );

    Ok(TopicModelResult {
        model_type: options.model,
        topic_term_matrix,
        feature_names,
        doc_topic_matrix,
        document_ids: ids,
        metadata,
    })
}

/// Row-normalised similarities `1 / (1 + distance)`.
fn normalise_distances(distances: &Matrix) -> Matrix {
    let mut similarities = distances.clone();
    for r in 0..similarities.nrows() {
        let row = similarities.row_mut(r);
        for value in row.iter_mut() {
            *value = 1.0 / (1.0 + *value);
        }
        let sum: f64 = row.iter().sum();
        let sum = if sum == 0.0 { 1.0 } else { sum };
        for value in row.iter_mut() {
            *value /= sum;
        }
    }
    similarities
}

/// One row per topic: `topic` and its `top_n` highest-weighted terms,
/// comma-joined.
pub fn describe(result: &TopicModelResult, top_n: usize) -> MetricsResult<Table> {
    let mut table = Table::new(["topic", "keywords"]);
    for (topic, weights) in result.topic_term_matrix.iter_rows().enumerate() {
        if weights.is_empty() {
            continue;
        }
        let mut order: Vec<usize> = (0..weights.len()).collect();
        order.sort_by(|&a, &b| weights[b].total_cmp(&weights[a]));
        let keywords: Vec<&str> = order
            .into_iter()
            .take(top_n)
            .filter_map(|i| result.feature_names.get(i).map(String::as_str))
            .collect();
        table.push_row(vec![Value::from(topic), Value::String(keywords.join(", "))])?;
    }
    Ok(table)
}

/// Per-document weights: `document_id`, `topic_0`, `topic_1`, ...
pub fn doc_topics(result: &TopicModelResult) -> MetricsResult<Table> {
    let topics = result.doc_topic_matrix.ncols();
    let mut columns = vec!["document_id".to_string()];
    columns.extend((0..topics).map(|k| format!("topic_{k}")));
    let mut table = Table::new(columns);
    for (id, weights) in result.document_ids.iter().zip(result.doc_topic_matrix.iter_rows()) {
        let mut row = vec![Value::String(id.clone())];
        row.extend(weights.iter().map(|&w| Value::from(w)));
        table.push_row(row)?;
    }
    Ok(table)
}
