//! Compact JSON output.

use serde_json::{Value, json};

use crate::graphs::NetworkStats;
use crate::models::Paper;
use crate::text::Keyword;

/// Compact paper representation; optional fields appear only when set.
#[must_use]
pub fn compact_paper(paper: &Paper) -> Value {
    let mut obj = json!({
        "id": paper.paper_id,
        "title": paper.title_or_default(),
        "year": paper.year,
    });

    if !paper.authors.is_empty() {
        obj["authors"] = json!(paper.authors);
    }

    if let Some(venue) = &paper.venue {
        obj["venue"] = json!(venue);
    }

    if let Some(doi) = paper.doi() {
        obj["doi"] = json!(doi);
    }

    if !paper.keywords.is_empty() {
        obj["keywords"] = json!(paper.keywords);
    }

    obj
}

/// Keywords as `[{"phrase": .., "score": ..}]`.
#[must_use]
pub fn compact_keywords(keywords: &[Keyword]) -> Value {
    json!(keywords)
}

/// Network statistics with an optional centrality ranking.
#[must_use]
pub fn compact_stats(stats: &NetworkStats, top: &[(String, f64)]) -> Value {
    let mut obj = json!(stats);
    if !top.is_empty() {
        obj["top_degree"] = top.iter().map(|(node, score)| json!({"node": node, "degree": score})).collect();
    }
    obj
}
