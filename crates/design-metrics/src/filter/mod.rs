//! Subsetting and labelling of paper tables by keyword rules.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::TEXT_COLUMNS;
use crate::error::{MetricsError, MetricsResult};
use crate::models::KeywordMode;
use crate::table::{Row, Table};
use crate::text::{lemmatise, normalise_text};

/// Keyword matching options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordOptions {
    /// Matching strategy.
    pub mode: KeywordMode,
    /// Columns to search; absent names fall back to the default text columns.
    pub columns: Option<Vec<String>>,
    /// Terms required in `minmatch` mode; defaults to all terms.
    pub min_match: Option<usize>,
}

impl KeywordOptions {
    /// Options for `mode` with default columns.
    #[must_use]
    pub fn new(mode: KeywordMode) -> Self {
        Self { mode, ..Self::default() }
    }
}

/// Rows of `papers` that satisfy the keyword constraint.
///
/// An empty term list yields an empty table with the same columns.
pub fn by_keywords(papers: &Table, terms: &[&str], options: &KeywordOptions) -> MetricsResult<Table> {
    let mask = keyword_mask(papers, terms, options)?;
    let subset = papers.filter_rows(&mask);
    tracing::debug!(
        mode = %options.mode,
        terms = terms.len(),
        matched = subset.len(),
        total = papers.len(),
        "Filtered papers by keywords"
    );
    Ok(subset)
}

/// Per-row match flags for [`by_keywords`].
pub fn keyword_mask(papers: &Table, terms: &[&str], options: &KeywordOptions) -> MetricsResult<Vec<bool>> {
    let terms: Vec<String> = terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|t| normalise_text(t))
        .filter(|t| !t.is_empty())
        .collect();
    if terms.is_empty() {
        return Ok(vec![false; papers.len()]);
    }

    let columns = resolve_columns(papers, options.columns.as_deref())?;
    let matcher = Matcher::new(options.mode, terms, options.min_match);
    Ok(papers.rows().map(|row| matcher.matches(&row, &columns)).collect())
}

fn resolve_columns(papers: &Table, columns: Option<&[String]>) -> MetricsResult<Vec<String>> {
    if let Some(columns) = columns {
        let resolved: Vec<String> = columns.iter().filter(|c| papers.has_column(c)).cloned().collect();
        if !resolved.is_empty() {
            return Ok(resolved);
        }
    }
    let resolved: Vec<String> = TEXT_COLUMNS
        .iter()
        .filter(|c| papers.has_column(c))
        .map(|c| (*c).to_string())
        .collect();
    if resolved.is_empty() {
        return Err(MetricsError::validation(
            "columns",
            "No textual columns available for keyword filtering",
        ));
    }
    Ok(resolved)
}

enum Matcher {
    Lemma(Vec<Vec<String>>),
    MinMatch { terms: Vec<String>, required: usize },
    Substring(Vec<String>),
}

impl Matcher {
    fn new(mode: KeywordMode, terms: Vec<String>, min_match: Option<usize>) -> Self {
        match mode {
            KeywordMode::Lemma => Self::Lemma(
                terms.iter().map(|t| t.split_whitespace().map(lemmatise).collect()).collect(),
            ),
            KeywordMode::MinMatch => {
                let required = min_match.unwrap_or(terms.len()).max(1);
                Self::MinMatch { terms, required }
            }
            KeywordMode::Substring => Self::Substring(terms),
        }
    }

    fn matches(&self, row: &Row<'_>, columns: &[String]) -> bool {
        match self {
            Self::Lemma(phrases) => {
                let sequences: Vec<Vec<String>> = columns
                    .iter()
                    .map(|c| normalise_text(&row.text(c)).split_whitespace().map(lemmatise).collect())
                    .collect();
                phrases.iter().any(|phrase| {
                    sequences.iter().any(|tokens| {
                        tokens.windows(phrase.len()).any(|window| window == phrase.as_slice())
                    })
                })
            }
            Self::MinMatch { terms, required } => {
                let haystack = haystack(row, columns);
                terms.iter().filter(|t| haystack.contains(t.as_str())).count() >= *required
            }
            Self::Substring(terms) => {
                let haystack = haystack(row, columns);
                terms.iter().any(|t| haystack.contains(t.as_str()))
            }
        }
    }
}

fn haystack(row: &Row<'_>, columns: &[String]) -> String {
    columns.iter().map(|c| normalise_text(&row.text(c))).collect::<Vec<_>>().join(" ")
}

/// A labelling rule.
///
/// `terms`, `any` and `all` are merged into one term list. `match = "all"`
/// requires every term (and turns `lemma` into `minmatch`) unless
/// `min_match` is given explicitly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Rule {
    /// Label assigned to matching papers.
    pub label: String,
    /// Terms, any of which may match.
    #[serde(deserialize_with = "string_or_list")]
    pub terms: Vec<String>,
    /// Alias for `terms`.
    #[serde(deserialize_with = "string_or_list")]
    pub any: Vec<String>,
    /// Terms that should all match.
    #[serde(deserialize_with = "string_or_list")]
    pub all: Vec<String>,
    /// `lemma`, `minmatch` or `substring`.
    pub mode: Option<String>,
    /// Columns to search.
    pub columns: Option<Vec<String>>,
    /// Minimum number of matching terms.
    pub min_match: Option<usize>,
    /// `any` or `all`.
    #[serde(rename = "match")]
    pub match_type: Option<String>,
}

/// An ordered list of labelling rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RuleSet {
    /// Rules in evaluation order.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleDocument {
    Wrapped(RuleSet),
    List(Vec<Rule>),
}

impl RuleSet {
    /// Parse rules from JSON: either `{"rules": [...]}` or a bare array.
    pub fn from_json(text: &str) -> MetricsResult<Self> {
        Ok(match serde_json::from_str::<RuleDocument>(text)? {
            RuleDocument::Wrapped(set) => set,
            RuleDocument::List(rules) => Self { rules },
        })
    }

    /// Parse rules from TOML (`[[rules]]` tables).
    pub fn from_toml(text: &str) -> MetricsResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Parse a JSON value.
    pub fn from_value(value: Value) -> MetricsResult<Self> {
        Ok(match serde_json::from_value::<RuleDocument>(value)? {
            RuleDocument::Wrapped(set) => set,
            RuleDocument::List(rules) => Self { rules },
        })
    }
}

struct CompiledRule {
    label: String,
    terms: Vec<String>,
    options: KeywordOptions,
}

fn compile(rule: &Rule) -> MetricsResult<Option<CompiledRule>> {
    let label = rule.label.trim();
    if label.is_empty() {
        tracing::warn!("Skipping rule without a label");
        return Ok(None);
    }
    let terms: Vec<String> = rule
        .terms
        .iter()
        .chain(&rule.any)
        .chain(&rule.all)
        .filter(|t| !t.trim().is_empty())
        .cloned()
        .collect();
    if terms.is_empty() {
        tracing::warn!(label, "Skipping rule without terms");
        return Ok(None);
    }

    let mut mode: KeywordMode = rule.mode.as_deref().unwrap_or("lemma").parse()?;
    let min_match = match rule.min_match {
        Some(n) => Some(n),
        None => {
            let require_all = rule.match_type.as_deref().is_some_and(|m| m.eq_ignore_ascii_case("all"));
            if require_all && mode == KeywordMode::Lemma {
                mode = KeywordMode::MinMatch;
            }
            require_all.then_some(terms.len())
        }
    };

    Ok(Some(CompiledRule {
        label: label.to_string(),
        terms,
        options: KeywordOptions { mode, columns: rule.columns.clone(), min_match },
    }))
}

/// Add `label_column` holding the sorted labels of every matching rule.
pub fn label_by_rules(papers: &Table, rules: &RuleSet, label_column: &str) -> MetricsResult<Table> {
    let mut labels: Vec<BTreeSet<String>> = vec![BTreeSet::new(); papers.len()];

    for rule in &rules.rules {
        let Some(compiled) = compile(rule)? else {
            continue;
        };
        let terms: Vec<&str> = compiled.terms.iter().map(String::as_str).collect();
        let mask = keyword_mask(papers, &terms, &compiled.options)?;
        for (set, hit) in labels.iter_mut().zip(mask) {
            if hit {
                set.insert(compiled.label.clone());
            }
        }
    }

    let values = labels
        .into_iter()
        .map(|set| Value::Array(set.into_iter().map(Value::String).collect()))
        .collect();
    let mut labelled = papers.clone();
    labelled.set_column(label_column, values)?;
    Ok(labelled)
}

fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
        None => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn papers() -> Table {
        Table::from_rows(
            ["paper_id", "title"],
            vec![
                vec![json!("P1"), json!("Learning Spaces for Designers")],
                vec![json!("P2"), json!("Parametric design tools")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_lemma_matches_inflections() {
        let subset = by_keywords(&papers(), &["designer"], &KeywordOptions::default()).unwrap();
        assert_eq!(subset.len(), 1);
        assert_eq!(subset.row(0).text("paper_id"), "P1");
    }

    #[test]
    fn test_minmatch_requires_all_by_default() {
        let options = KeywordOptions::new(KeywordMode::MinMatch);
        let subset = by_keywords(&papers(), &["parametric", "tools", "bim"], &options).unwrap();
        assert!(subset.is_empty());

        let options = KeywordOptions { min_match: Some(2), ..options };
        let subset = by_keywords(&papers(), &["parametric", "tools", "bim"], &options).unwrap();
        assert_eq!(subset.len(), 1);
    }

    #[test]
    fn test_no_text_columns_is_error() {
        let table = Table::new(["paper_id"]);
        assert!(by_keywords(&table, &["x"], &KeywordOptions::default()).is_err());
    }

    #[test]
    fn test_rules_from_toml() {
        let rules = RuleSet::from_toml(
            "[[rules]]\nlabel = \"Tools\"\nterms = \"tools\"\nmode = \"substring\"\n",
        )
        .unwrap();
        let labelled = label_by_rules(&papers(), &rules, "labels").unwrap();
        assert_eq!(labelled.row(1).get("labels"), Some(&json!(["Tools"])));
        assert_eq!(labelled.row(0).get("labels"), Some(&json!([])));
    }

    #[test]
    fn test_rule_with_unknown_mode_fails() {
        let rules = RuleSet::from_json(r#"[{"label": "X", "terms": ["a"], "mode": "fuzzy"}]"#).unwrap();
        assert!(label_by_rules(&papers(), &rules, "labels").is_err());
    }
}
