//! Reference extraction from page text and in-corpus citation matching.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::MetricsResult;
use crate::table::{Table, compare_values, value_to_text};
use crate::text::normalise_text;

/// A line that opens a new numbered reference: `[12] `, `12 ` or `12. `.
static REFERENCE_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\[?\d+\]?|\d+\.)\s").expect("valid regex"));

/// Split each paper's page text into reference strings.
///
/// Pages are grouped by `paper_column` (sorted, missing ids skipped) and
/// their non-missing texts joined with newlines. The result has columns
/// `paper_id` and `reference`.
pub fn extract(pages: &Table, paper_column: &str, text_column: &str) -> MetricsResult<Table> {
    let paper_index = pages.require_column(paper_column, "pages")?;
    let text_index = pages.require_column(text_column, "pages")?;

    let mut groups: Vec<(Value, Vec<String>)> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for row in pages.rows() {
        let paper = &row.values()[paper_index];
        if paper.is_null() {
            continue;
        }
        let slot = *lookup.entry(value_to_text(paper)).or_insert_with(|| {
            groups.push((paper.clone(), Vec::new()));
            groups.len() - 1
        });
        let text = &row.values()[text_index];
        if !text.is_null() {
            groups[slot].1.push(value_to_text(text));
        }
    }
    groups.sort_by(|a, b| compare_values(&a.0, &b.0));

    let mut table = Table::new(["paper_id", "reference"]);
    for (paper, texts) in groups {
        let paper = value_to_text(&paper);
        for reference in split_references(&texts.join("\n")) {
            table.push_row(vec![Value::String(paper.clone()), Value::String(reference)])?;
        }
    }
    tracing::debug!(pages = pages.len(), references = table.len(), "Extracted references");
    Ok(table)
}

/// Group trimmed non-empty lines into references; a numbered line starts a
/// new one. Lines of a reference are joined with single spaces.
#[must_use]
pub fn split_references(text: &str) -> Vec<String> {
    let mut references = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if REFERENCE_START.is_match(line) && !current.is_empty() {
            references.push(current.join(" "));
            current.clear();
        }
        current.push(line);
    }
    if !current.is_empty() {
        references.push(current.join(" "));
    }
    references
}

/// Column names used by [`in_corpus_citations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationOptions {
    /// Reference text column of the references table.
    pub reference_column: String,
    /// Title column of the papers table.
    pub title_column: String,
    /// Citing paper column of the references table.
    pub paper_id_column: String,
    /// Id column of the papers table; defaults to `paper_id_column`.
    pub corpus_id_column: Option<String>,
}

impl Default for CitationOptions {
    fn default() -> Self {
        Self {
            reference_column: "reference".to_string(),
            title_column: "title".to_string(),
            paper_id_column: "paper_id".to_string(),
            corpus_id_column: None,
        }
    }
}

/// Citation edges and in-degree counts.
#[derive(Debug, Clone)]
pub struct Citations {
    /// `citing_paper_id`, `cited_paper_id`, `reference`.
    pub edges: Table,
    /// `paper_id`, `indegree`, sorted by paper id.
    pub indegree: Table,
}

/// Match references against corpus titles.
///
/// A reference cites the first corpus paper (in papers order) whose
/// normalised title occurs inside the normalised reference, skipping the
/// citing paper itself. When two papers share a normalised title the later
/// id wins.
pub fn in_corpus_citations(references: &Table, papers: &Table, options: &CitationOptions) -> MetricsResult<Citations> {
    let reference_index = references.require_column(&options.reference_column, "references")?;
    let citing_index = references.require_column(&options.paper_id_column, "references")?;
    let title_index = papers.require_column(&options.title_column, "papers")?;
    let corpus_column = options.corpus_id_column.as_deref().unwrap_or(&options.paper_id_column);
    let corpus_index = papers.require_column(corpus_column, "papers")?;

    let mut titles: Vec<(String, String)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for row in papers.rows() {
        let Value::String(title) = &row.values()[title_index] else {
            continue;
        };
        let key = normalise_text(title);
        let id = value_to_text(&row.values()[corpus_index]);
        match positions.get(&key) {
            Some(&slot) => titles[slot].1 = id,
            None => {
                positions.insert(key.clone(), titles.len());
                titles.push((key, id));
            }
        }
    }

    let mut edges = Table::new(["citing_paper_id", "cited_paper_id", "reference"]);
    let mut indegree: BTreeMap<String, i64> = BTreeMap::new();
    for row in references.rows() {
        let reference = &row.values()[reference_index];
        let citing = &row.values()[citing_index];
        let normalised = normalise_text(&value_to_text(reference));
        let citing_text = value_to_text(citing);
        let matched = titles
            .iter()
            .find(|(key, id)| !key.is_empty() && normalised.contains(key.as_str()) && *id != citing_text);
        if let Some((_, cited)) = matched {
            edges.push_row(vec![citing.clone(), Value::String(cited.clone()), reference.clone()])?;
            *indegree.entry(cited.clone()).or_default() += 1;
        }
    }

    let mut counts = Table::new(["paper_id", "indegree"]);
    for (paper, count) in indegree {
        counts.push_row(vec![Value::String(paper), Value::from(count)])?;
    }
    tracing::info!(references = references.len(), citations = edges.len(), "Matched in-corpus citations");
    Ok(Citations { edges, indegree: counts })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_split_numbered_references() {
        let text = "References\n[1] Smith, J. Timber shells.\n  Journal 2020.\n\n2. Lee, B. Robots.\n3 Tan, A. GANs";
        let refs = split_references(text);
        assert_eq!(
            refs,
            vec![
                "References".to_string(),
                "[1] Smith, J. Timber shells. Journal 2020.".to_string(),
                "2. Lee, B. Robots.".to_string(),
                "3 Tan, A. GANs".to_string(),
            ]
        );
    }

    #[test]
    fn test_extract_groups_pages_by_paper() {
        let pages = Table::from_rows(
            ["paper_id", "text"],
            vec![
                vec![json!("P2"), json!("[1] Alpha")],
                vec![json!("P1"), json!("[1] Beta")],
                vec![json!("P1"), Value::Null],
                vec![json!("P1"), json!("[2] Gamma")],
            ],
        )
        .unwrap();
        let refs = extract(&pages, "paper_id", "text").unwrap();
        assert_eq!(refs.len(), 3);
        assert_eq!(refs.row(0).text("paper_id"), "P1");
        assert_eq!(refs.row(1).text("reference"), "[2] Gamma");
        assert_eq!(refs.row(2).text("paper_id"), "P2");
    }

    #[test]
    fn test_citations_skip_self_and_count_indegree() {
        let papers = Table::from_rows(
            ["paper_id", "title"],
            vec![vec![json!("P1"), json!("Timber Shells!")], vec![json!("P2"), json!("Robotic assembly")]],
        )
        .unwrap();
        let references = Table::from_rows(
            ["paper_id", "reference"],
            vec![
                vec![json!("P1"), json!("Smith. Timber shells. 2020")],
                vec![json!("P2"), json!("Smith. TIMBER-shells. 2020")],
                vec![json!("P2"), json!("Unrelated work")],
            ],
        )
        .unwrap();
        let citations = in_corpus_citations(&references, &papers, &CitationOptions::default()).unwrap();
        assert_eq!(citations.edges.len(), 1);
        assert_eq!(citations.edges.row(0).text("cited_paper_id"), "P1");
        assert_eq!(citations.indegree.row(0).get("indegree"), Some(&json!(1)));
    }

    #[test]
    fn test_no_citations_keeps_columns() {
        let papers = Table::from_rows(["paper_id", "title"], vec![vec![json!("P1"), json!("Shells")]]).unwrap();
        let references = Table::new(["paper_id", "reference"]);
        let citations = in_corpus_citations(&references, &papers, &CitationOptions::default()).unwrap();
        assert!(citations.indegree.is_empty());
        assert_eq!(citations.indegree.columns(), &["paper_id".to_string(), "indegree".to_string()]);
    }
}
