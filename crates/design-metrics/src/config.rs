//! Configuration for design-metrics.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MetricsResult;

/// Default parameters shared by the library and the CLI.
pub mod defaults {
    /// Number of RAKE phrases returned.
    pub const RAKE_TOP_K: usize = 10;

    /// Requested number of topics.
    pub const TOPIC_COUNT: usize = 20;

    /// Vocabulary cap for topic vectorisers.
    pub const TOPIC_MAX_FEATURES: usize = 5000;

    /// Keywords listed per topic by `describe`.
    pub const TOPIC_TOP_N: usize = 10;

    /// Seed for every randomised algorithm.
    pub const RANDOM_STATE: u64 = 0;

    /// Output dimensions for embedding reducers.
    pub const REDUCED_COMPONENTS: usize = 2;

    /// t-SNE perplexity.
    pub const TSNE_PERPLEXITY: f64 = 30.0;

    /// Title similarity at which two papers count as duplicates.
    pub const DEDUPE_SIMILARITY: f64 = 0.9;

    /// Separator between affiliations in a single cell.
    pub const AFFILIATION_SEPARATOR: &str = ";";

    /// Sentence-embedding model used for scholarly text.
    pub const EMBEDDING_MODEL: &str = "allenai/specter2_base";

    /// Dimensions of the hashing embedder.
    pub const HASHING_DIMENSIONS: usize = 256;
}

/// Default text columns searched by keyword filters, in priority order.
pub const TEXT_COLUMNS: &[&str] = &["title", "abstract", "keywords", "summary"];

/// Analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RAKE phrases returned.
    pub rake_top_k: usize,

    /// Requested topics.
    pub topic_count: usize,

    /// Vocabulary cap for topic vectorisers.
    pub topic_max_features: usize,

    /// Seed for randomised algorithms.
    pub random_state: u64,

    /// Duplicate title threshold.
    pub dedupe_similarity: f64,

    /// Affiliation separator.
    pub affiliation_separator: String,

    /// Embedding model name.
    pub embedding_model: String,
}

impl Config {
    /// Create configuration from environment variables.
    ///
    /// Reads a `.env` file when present. Unset or unparsable variables keep
    /// their defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut config = Self::default();
        if let Some(value) = env_parse("DESIGN_METRICS_RAKE_TOP_K") {
            config.rake_top_k = value;
        }
        if let Some(value) = env_parse("DESIGN_METRICS_TOPIC_COUNT") {
            config.topic_count = value;
        }
        if let Some(value) = env_parse("DESIGN_METRICS_TOPIC_MAX_FEATURES") {
            config.topic_max_features = value;
        }
        if let Some(value) = env_parse("DESIGN_METRICS_RANDOM_STATE") {
            config.random_state = value;
        }
        if let Some(value) = env_parse("DESIGN_METRICS_DEDUPE_SIMILARITY") {
            config.dedupe_similarity = value;
        }
        if let Ok(value) = std::env::var("DESIGN_METRICS_AFFILIATION_SEPARATOR") {
            config.affiliation_separator = value;
        }
        if let Ok(value) = std::env::var("DESIGN_METRICS_EMBEDDING_MODEL") {
            config.embedding_model = value;
        }
        Ok(config)
    }

    /// Load configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> MetricsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> MetricsResult<Self> {
        Ok(toml::from_str(text)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rake_top_k: defaults::RAKE_TOP_K,
            topic_count: defaults::TOPIC_COUNT,
            topic_max_features: defaults::TOPIC_MAX_FEATURES,
            random_state: defaults::RANDOM_STATE,
            dedupe_similarity: defaults::DEDUPE_SIMILARITY,
            affiliation_separator: defaults::AFFILIATION_SEPARATOR.to_string(),
            embedding_model: defaults::EMBEDDING_MODEL.to_string(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.rake_top_k, 10);
        assert_eq!(config.embedding_model, "allenai/specter2_base");
        assert!((config.dedupe_similarity - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_config_partial_toml() {
        let config = Config::from_toml_str("topic_count = 5\nrandom_state = 42\n").unwrap();
        assert_eq!(config.topic_count, 5);
        assert_eq!(config.random_state, 42);
        assert_eq!(config.topic_max_features, defaults::TOPIC_MAX_FEATURES);
    }

    #[test]
    fn test_config_rejects_bad_toml() {
        assert!(Config::from_toml_str("topic_count = \"many\"").is_err());
    }

    #[test]
    fn test_text_columns() {
        assert_eq!(TEXT_COLUMNS.first(), Some(&"title"));
        assert!(TEXT_COLUMNS.contains(&"abstract"));
    }
}
