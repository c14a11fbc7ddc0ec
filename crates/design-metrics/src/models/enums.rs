//! Option enums shared by the library and the CLI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Human-readable markdown.
    #[default]
    Markdown,
    /// Machine-readable JSON.
    Json,
}

/// Reference manager export format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// RIS tagged format.
    #[default]
    Ris,
    /// BibTeX.
    Bibtex,
    /// Comma-separated values.
    Csv,
    /// EndNote tagged format.
    Endnote,
}

/// Keyword matching strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordMode {
    /// Phrase match over suffix-stripped tokens.
    #[default]
    Lemma,
    /// At least `min_match` terms found as substrings.
    MinMatch,
    /// Any term found as a substring.
    Substring,
}

impl FromStr for KeywordMode {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lemma" => Ok(Self::Lemma),
            "minmatch" => Ok(Self::MinMatch),
            "substring" => Ok(Self::Substring),
            other => Err(MetricsError::validation("mode", format!("Unsupported mode '{other}'"))),
        }
    }
}

impl fmt::Display for KeywordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lemma => "lemma",
            Self::MinMatch => "minmatch",
            Self::Substring => "substring",
        })
    }
}

/// Topic model family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicModelKind {
    /// Latent Dirichlet Allocation over term counts.
    #[default]
    Lda,
    /// Class-based TF-IDF with k-means clusters.
    Ctfidf,
    /// Transformer-backed BERTopic.
    Bertopic,
}

impl FromStr for TopicModelKind {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lda" => Ok(Self::Lda),
            "ctfidf" => Ok(Self::Ctfidf),
            "bertopic" => Ok(Self::Bertopic),
            other => Err(MetricsError::validation("model", format!("Unsupported topic model '{other}'"))),
        }
    }
}

impl fmt::Display for TopicModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lda => "lda",
            Self::Ctfidf => "ctfidf",
            Self::Bertopic => "bertopic",
        })
    }
}

/// Community detection algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommunityMethod {
    /// Greedy modularity optimisation.
    #[default]
    Louvain,
    /// Refined Louvain; recognised but not available.
    Leiden,
}

impl FromStr for CommunityMethod {
    type Err = MetricsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "louvain" => Ok(Self::Louvain),
            "leiden" => Ok(Self::Leiden),
            other => Err(MetricsError::validation("method", format!("Unsupported method '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_mode_parse() {
        assert_eq!("MinMatch".parse::<KeywordMode>().unwrap(), KeywordMode::MinMatch);
        assert!("fuzzy".parse::<KeywordMode>().is_err());
    }

    #[test]
    fn test_export_format_serde() {
        let fmt: ExportFormat = serde_json::from_str("\"endnote\"").unwrap();
        assert_eq!(fmt, ExportFormat::Endnote);
    }

    #[test]
    fn test_community_method_parse() {
        assert_eq!("leiden".parse::<CommunityMethod>().unwrap(), CommunityMethod::Leiden);
        assert!("girvan".parse::<CommunityMethod>().is_err());
    }
}
