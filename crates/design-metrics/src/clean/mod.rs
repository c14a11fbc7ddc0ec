//! Schema validation, duplicate removal and name normalisation.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use crate::error::{MetricsError, MetricsResult};
use crate::table::{Table, value_to_text};
use crate::text::normalise_text;

/// Required columns of each known corpus table.
const REQUIRED_COLUMNS: &[(&str, &[&str])] = &[
    ("papers", &["paper_id", "title"]),
    ("authors", &["author_id", "name"]),
    ("authorships", &["paper_id", "author_id"]),
    ("affiliations", &["paper_id"]),
    ("references", &["citing_paper_id"]),
];

/// One schema problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// Table name.
    pub table: String,
    /// Column concerned, if any.
    pub column: Option<String>,
    /// Description.
    pub message: String,
}

/// Outcome of [`validate_schema`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    /// Problems found, in check order.
    pub issues: Vec<SchemaIssue>,
}

impl SchemaReport {
    /// True when no issue was found.
    #[must_use]
    pub fn ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Issues as a `table`, `column`, `message` table.
    pub fn to_table(&self) -> MetricsResult<Table> {
        let rows = self
            .issues
            .iter()
            .map(|issue| {
                vec![
                    Value::String(issue.table.clone()),
                    issue.column.clone().map_or(Value::Null, Value::String),
                    Value::String(issue.message.clone()),
                ]
            })
            .collect();
        Table::from_rows(["table", "column", "message"], rows)
    }

    fn push(&mut self, table: &str, column: Option<&str>, message: impl Into<String>) {
        self.issues.push(SchemaIssue {
            table: table.to_string(),
            column: column.map(String::from),
            message: message.into(),
        });
    }
}

/// Check the corpus tables for missing columns, bad paper ids and
/// dangling references. Unknown table names are ignored.
#[must_use]
pub fn validate_schema(tables: &BTreeMap<String, Table>) -> SchemaReport {
    let mut report = SchemaReport::default();

    if !tables.contains_key("papers") {
        report.push("papers", None, "required table is missing");
    }
    for (name, required) in REQUIRED_COLUMNS {
        let Some(table) = tables.get(*name) else {
            continue;
        };
        for column in *required {
            if !table.has_column(column) {
                report.push(name, Some(column), format!("Column '{column}' missing from {name}"));
            }
        }
    }

    let paper_ids = tables.get("papers").and_then(|papers| check_ids(papers, "papers", "paper_id", &mut report));
    let author_ids = tables.get("authors").and_then(|authors| check_ids(authors, "authors", "author_id", &mut report));

    if let Some(ids) = &paper_ids {
        for (name, column) in [("authorships", "paper_id"), ("affiliations", "paper_id"), ("references", "citing_paper_id")] {
            if let Some(table) = tables.get(name) {
                check_foreign_keys(table, name, column, ids, "paper", &mut report);
            }
        }
    }
    if let (Some(ids), Some(authorships)) = (&author_ids, tables.get("authorships")) {
        check_foreign_keys(authorships, "authorships", "author_id", ids, "author", &mut report);
    }

    tracing::debug!(tables = tables.len(), issues = report.issues.len(), "Validated corpus schema");
    report
}

fn check_ids(table: &Table, name: &str, column: &str, report: &mut SchemaReport) -> Option<HashSet<String>> {
    let values = table.column(column)?;
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    let mut missing = 0usize;
    for value in values {
        if value.is_null() || value_to_text(value).trim().is_empty() {
            missing += 1;
            continue;
        }
        let id = value_to_text(value);
        if !seen.insert(id.clone()) {
            duplicates.push(id);
        }
    }
    if missing > 0 {
        report.push(name, Some(column), format!("{missing} row(s) without {column}"));
    }
    if !duplicates.is_empty() {
        report.push(name, Some(column), format!("Duplicate {column} values: {}", duplicates.join(", ")));
    }
    Some(seen)
}

fn check_foreign_keys(
    table: &Table,
    name: &str,
    column: &str,
    known: &HashSet<String>,
    target: &str,
    report: &mut SchemaReport,
) {
    let Some(values) = table.column(column) else {
        return;
    };
    let mut dangling: Vec<String> = values
        .into_iter()
        .filter(|v| !v.is_null())
        .map(value_to_text)
        .filter(|id| !known.contains(id))
        .collect();
    dangling.sort();
    dangling.dedup();
    if !dangling.is_empty() {
        report.push(name, Some(column), format!("Unknown {target} ids: {}", dangling.join(", ")));
    }
}

/// Drop papers whose normalised title is at least `similarity` similar to
/// an earlier kept paper, or which repeat an earlier DOI.
pub fn dedupe_papers(papers: &Table, similarity: f64) -> MetricsResult<Table> {
    if !(similarity > 0.0 && similarity <= 1.0) {
        return Err(MetricsError::validation("similarity", "must lie in (0, 1]"));
    }
    papers.require_column("title", "papers")?;

    let mut kept_titles: Vec<Vec<char>> = Vec::new();
    let mut kept_dois: HashSet<String> = HashSet::new();
    let mut mask = Vec::with_capacity(papers.len());

    for row in papers.rows() {
        let doi = row.text("doi").trim().to_lowercase();
        if !doi.is_empty() && kept_dois.contains(&doi) {
            mask.push(false);
            continue;
        }
        let title: Vec<char> = normalise_text(&row.text("title")).chars().collect();
        let duplicate = !title.is_empty()
            && kept_titles.iter().any(|kept| similarity_ratio(kept, &title) >= similarity);
        if duplicate {
            mask.push(false);
            continue;
        }
        kept_titles.push(title);
        if !doi.is_empty() {
            kept_dois.insert(doi);
        }
        mask.push(true);
    }

    let deduped = papers.filter_rows(&mask);
    tracing::info!(before = papers.len(), after = deduped.len(), similarity, "Removed duplicate papers");
    Ok(deduped)
}

/// Ratcliff/Obershelp similarity: `2·M / (len(a) + len(b))` where `M` is
/// the total size of the recursively found longest common blocks.
#[must_use]
pub fn similarity_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_characters(a, b) as f64 / total as f64
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut stack = vec![(0, a.len(), 0, b.len())];
    let mut matched = 0;
    while let Some((alo, ahi, blo, bhi)) = stack.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size == 0 {
            continue;
        }
        matched += size;
        if alo < i && blo < j {
            stack.push((alo, i, blo, j));
        }
        if i + size < ahi && j + size < bhi {
            stack.push((i + size, ahi, j + size, bhi));
        }
    }
    matched
}

/// Longest common block, earliest in `a` then earliest in `b`.
fn longest_match(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best) = (alo, blo, 0);
    let mut previous: HashMap<usize, usize> = HashMap::new();
    for i in alo..ahi {
        let mut current = HashMap::new();
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = previous.get(&(j.wrapping_sub(1))).copied().unwrap_or(0) + 1;
                current.insert(j, k);
                if k > best {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best = k;
                }
            }
        }
        previous = current;
    }
    (best_i, best_j, best)
}

/// Rewrite `name` as "Surname, I." and keep the original in `name_raw`.
pub fn normalize_authors(authors: &Table) -> MetricsResult<Table> {
    let names = authors
        .column("name")
        .ok_or_else(|| MetricsError::missing_column("authors", "name"))?;

    let raw: Vec<Value> = names.iter().map(|v| (*v).clone()).collect();
    let formatted: Vec<Value> = names
        .iter()
        .map(|v| match v {
            Value::String(s) => format_author_name(s).map_or_else(|| (*v).clone(), Value::String),
            other => (*other).clone(),
        })
        .collect();

    let mut table = authors.clone();
    table.set_column("name", formatted)?;
    table.set_column("name_raw", raw)?;
    Ok(table)
}

/// "alice tan" → "Tan, A."; "Lee, Bob" → "Lee, B.". Blank names yield `None`.
#[must_use]
pub fn format_author_name(name: &str) -> Option<String> {
    let (surname, given): (String, Vec<&str>) = match name.split_once(',') {
        Some((last, first)) => (last.trim().to_string(), first.split_whitespace().collect()),
        None => {
            let mut parts: Vec<&str> = name.split_whitespace().collect();
            let last = parts.pop()?;
            (last.to_string(), parts)
        }
    };
    if surname.is_empty() {
        return None;
    }
    let surname = capitalise_words(&surname);
    let initials: Vec<String> = given
        .iter()
        .filter_map(|g| g.chars().next())
        .map(|c| format!("{}.", c.to_uppercase()))
        .collect();
    if initials.is_empty() {
        Some(surname)
    } else {
        Some(format!("{surname}, {}", initials.join(" ")))
    }
}

fn capitalise_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_start = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if at_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_start = false;
        } else {
            out.push(c);
            at_start = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_similarity_ratio_matches_difflib() {
        assert!((similarity_ratio(&chars("abcd"), &chars("bcde")) - 0.75).abs() < 1e-12);
        assert!((similarity_ratio(&chars("modelling"), &chars("modeling")) - 16.0 / 17.0).abs() < 1e-12);
        assert!(similarity_ratio(&chars("abc"), &chars("xyz")).abs() < 1e-12);
    }

    #[test]
    fn test_format_author_name() {
        assert_eq!(format_author_name("alice tan").as_deref(), Some("Tan, A."));
        assert_eq!(format_author_name("BOB LEE").as_deref(), Some("Lee, B."));
        assert_eq!(format_author_name(" Carla  Gomez ").as_deref(), Some("Gomez, C."));
        assert_eq!(format_author_name("Lee, Bob").as_deref(), Some("Lee, B."));
        assert_eq!(format_author_name("o'neil").as_deref(), Some("O'Neil"));
        assert_eq!(format_author_name("   "), None);
    }

    #[test]
    fn test_schema_report_table() {
        let mut tables = BTreeMap::new();
        tables.insert("papers".to_string(), Table::new(["paper_id"]));
        let report = validate_schema(&tables);
        let table = report.to_table().unwrap();
        assert_eq!(table.columns(), &["table", "column", "message"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.row(0).text("column"), "title");
        assert_eq!(table.row(0).text("message"), "Column 'title' missing from papers");

        let missing = validate_schema(&BTreeMap::new()).to_table().unwrap();
        assert_eq!(missing.row(0).get("column"), Some(&Value::Null));
        assert_eq!(missing.row(0).text("table"), "papers");

        let empty = SchemaReport::default().to_table().unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.columns().len(), 3);
    }

    #[test]
    fn test_dedupe_rejects_bad_threshold() {
        let papers = Table::new(["paper_id", "title"]);
        assert!(dedupe_papers(&papers, 0.0).is_err());
        assert!(dedupe_papers(&papers, 1.5).is_err());
    }
}
