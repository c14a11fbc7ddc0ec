//! Affiliation parsing and geographic aggregation.

use std::collections::HashMap;

use serde_json::Value;

use crate::config::defaults;
use crate::error::MetricsResult;
use crate::table::{Table, compare_values, value_to_text};

/// Where affiliations live in the papers table and how they are joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffiliationOptions {
    /// Column holding affiliation strings or lists.
    pub column: String,
    /// Paper identifier column.
    pub paper_id: String,
    /// Separator between affiliations in a string cell.
    pub separator: String,
}

impl Default for AffiliationOptions {
    fn default() -> Self {
        Self {
            column: "affiliations".to_string(),
            paper_id: "paper_id".to_string(),
            separator: defaults::AFFILIATION_SEPARATOR.to_string(),
        }
    }
}

/// One row per (paper, affiliation): `paper_id`, `affiliation`, `country`.
///
/// String cells are split on the separator; list cells contribute each
/// item. Missing cells and blank entries are skipped.
pub fn parse_affiliations(papers: &Table, options: &AffiliationOptions) -> MetricsResult<Table> {
    let column = papers.require_column(&options.column, "papers")?;
    let paper_id = papers.require_column(&options.paper_id, "papers")?;

    let mut table = Table::new(["paper_id", "affiliation", "country"]);
    for row in papers.rows() {
        let entries: Vec<String> = match &row.values()[column] {
            Value::Null => continue,
            Value::String(s) => s.split(options.separator.as_str()).map(|p| p.trim().to_string()).collect(),
            Value::Array(items) => items.iter().map(|v| value_to_text(v).trim().to_string()).collect(),
            other => vec![value_to_text(other).trim().to_string()],
        };
        let id = value_to_text(&row.values()[paper_id]);
        for entry in entries.into_iter().filter(|e| !e.is_empty()) {
            let country = infer_country(&entry);
            table.push_row(vec![Value::String(id.clone()), Value::String(entry), Value::String(country)])?;
        }
    }
    tracing::debug!(papers = papers.len(), affiliations = table.len(), "Parsed affiliations");
    Ok(table)
}

/// Country from a trailing "(Country)", else the last non-empty
/// comma-separated part when the entry has a comma, else "Unknown".
#[must_use]
pub fn infer_country(entry: &str) -> String {
    if entry.contains('(') && entry.contains(')') {
        if let Some((_, inside)) = entry.rsplit_once('(') {
            let inside = inside.trim_end_matches([')', ' ']);
            if !inside.is_empty() {
                return inside.to_string();
            }
        }
    }
    if entry.contains(',') {
        if let Some(last) = entry.split(',').map(str::trim).rfind(|p| !p.is_empty()) {
            return last.to_string();
        }
    }
    "Unknown".to_string()
}

/// Count rows per value of `level`, most frequent first. Missing values
/// form their own group; ties keep sorted value order.
pub fn aggregate(table: &Table, level: &str) -> MetricsResult<Table> {
    let index = table.require_column(level, "affiliation data")?;

    let mut groups: Vec<(Value, i64)> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for row in table.rows() {
        let value = &row.values()[index];
        let key = serde_json::to_string(value)?;
        let slot = *lookup.entry(key).or_insert_with(|| {
            groups.push((value.clone(), 0));
            groups.len() - 1
        });
        groups[slot].1 += 1;
    }
    groups.sort_by(|a, b| compare_values(&a.0, &b.0));
    groups.sort_by(|a, b| b.1.cmp(&a.1));

    let mut result = Table::new([level, "count"]);
    for (value, count) in groups {
        result.push_row(vec![value, Value::from(count)])?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_infer_country() {
        assert_eq!(infer_country("Aalto University (Finland)"), "Finland");
        assert_eq!(infer_country("ETH Zurich, Zurich, Switzerland"), "Switzerland");
        assert_eq!(infer_country("Independent researcher"), "Unknown");
        assert_eq!(infer_country("Lab ()"), "Unknown");
    }

    #[test]
    fn test_infer_country_without_comma_is_unknown() {
        assert_eq!(infer_country("Bartlett School of Architecture"), "Unknown");
        assert_eq!(infer_country(" , "), "Unknown");
        assert_eq!(infer_country("Studio X, "), "Studio X");
    }

    #[test]
    fn test_parse_strings_and_lists() {
        let papers = Table::from_rows(
            ["paper_id", "affiliations"],
            vec![
                vec![json!("P1"), json!("MIT, USA; TU Delft (Netherlands)")],
                vec![json!("P2"), json!(["UCL, UK", "  "])],
                vec![json!("P3"), Value::Null],
            ],
        )
        .unwrap();
        let parsed = parse_affiliations(&papers, &AffiliationOptions::default()).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.row(1).text("country"), "Netherlands");
        assert_eq!(parsed.row(2).text("paper_id"), "P2");
    }

    #[test]
    fn test_parse_missing_column() {
        let papers = Table::new(["paper_id"]);
        assert!(parse_affiliations(&papers, &AffiliationOptions::default()).is_err());
    }

    #[test]
    fn test_aggregate_descending() {
        let table = Table::from_rows(
            ["country"],
            vec![vec![json!("UK")], vec![json!("USA")], vec![json!("UK")], vec![Value::Null]],
        )
        .unwrap();
        let counts = aggregate(&table, "country").unwrap();
        assert_eq!(counts.row(0).get("country"), Some(&json!("UK")));
        assert_eq!(counts.row(0).get("count"), Some(&json!(2)));
        assert_eq!(counts.row(1).get("country"), Some(&json!("USA")));
        assert_eq!(counts.row(2).get("country"), Some(&Value::Null));
    }
}
