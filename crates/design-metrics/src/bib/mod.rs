//! Corpus ingestion from bibliographic exports.
//!
//! A corpus directory holds three tables under conventional names:
//!
//! | table         | accepted stems                          |
//! |---------------|-----------------------------------------|
//! | `papers`      | `papers`, `papers_metadata`, `metadata` |
//! | `authors`     | `authors`, `researchers`                |
//! | `authorships` | `authorships`, `paper_authors`, `links` |
//!
//! Each may be `.csv` or `.json` (an array of objects).

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::{MetricsError, MetricsResult};
use crate::filter::{KeywordOptions, by_keywords};
use crate::io::{LopdfSource, PdfTextSource};
use crate::models::KeywordMode;
use crate::table::{Table, value_as_f64};

const PAPER_STEMS: &[&str] = &["papers", "papers_metadata", "metadata"];
const AUTHOR_STEMS: &[&str] = &["authors", "researchers"];
const AUTHORSHIP_STEMS: &[&str] = &["authorships", "paper_authors", "links"];

/// The three normalised corpus tables.
#[derive(Debug, Clone, PartialEq)]
pub struct BibliographicRecords {
    /// One row per paper; always has `paper_id`, `title` and `venue`.
    pub papers: Table,
    /// One row per author; always has `author_id` and `name`.
    pub authors: Table,
    /// Paper/author links; always has `paper_id` and `author_id`.
    pub authorships: Table,
}

/// Load and normalise the corpus tables in `directory`.
pub fn load_records(directory: &Path) -> MetricsResult<BibliographicRecords> {
    if !directory.exists() {
        return Err(MetricsError::not_found(format!("Directory not found: {}", directory.display())));
    }

    let papers = normalise_papers(read_table(directory, "papers", PAPER_STEMS)?)?;
    let authors = normalise_authors(read_table(directory, "authors", AUTHOR_STEMS)?)?;
    let authorships = normalise_authorships(read_table(directory, "authorships", AUTHORSHIP_STEMS)?)?;

    tracing::info!(
        directory = %directory.display(),
        papers = papers.len(),
        authors = authors.len(),
        authorships = authorships.len(),
        "Loaded bibliographic records"
    );
    Ok(BibliographicRecords { papers, authors, authorships })
}

fn read_table(base: &Path, table: &str, stems: &[&str]) -> MetricsResult<Table> {
    for stem in stems {
        let csv = base.join(format!("{stem}.csv"));
        if csv.exists() {
            return Table::read_csv(&csv);
        }
        let json = base.join(format!("{stem}.json"));
        if json.exists() {
            return Table::read_json(&json);
        }
        let parquet = base.join(format!("{stem}.parquet"));
        if parquet.exists() {
            return Err(MetricsError::unsupported(format!(
                "Parquet tables are not supported: {}",
                parquet.display()
            )));
        }
    }
    Err(MetricsError::not_found(format!("No table found for '{table}' in {}", base.display())))
}

fn index_ids(len: usize) -> Vec<Value> {
    (0..len).map(|i| Value::String(i.to_string())).collect()
}

fn normalise_papers(mut frame: Table) -> MetricsResult<Table> {
    frame.rename_columns(&[("id", "paper_id"), ("paperID", "paper_id"), ("paper", "paper_id")]);
    if !frame.has_column("paper_id") {
        let ids = index_ids(frame.len());
        frame.insert_column(0, "paper_id", ids)?;
    }
    for column in ["paper_id", "title"] {
        frame.require_column(column, "papers")?;
    }
    if let Some(years) = frame.column("year") {
        let coerced = years
            .into_iter()
            .map(|v| match value_as_f64(v) {
                Some(y) if y.fract() == 0.0 => Value::from(y as i64),
                _ => Value::Null,
            })
            .collect();
        frame.set_column("year", coerced)?;
    }
    if !frame.has_column("venue") {
        let venues = vec![Value::String("Unknown".into()); frame.len()];
        frame.set_column("venue", venues)?;
    }
    Ok(frame)
}

fn normalise_authors(mut frame: Table) -> MetricsResult<Table> {
    frame.rename_columns(&[("id", "author_id"), ("author", "name")]);
    if !frame.has_column("author_id") {
        let ids = index_ids(frame.len());
        frame.insert_column(0, "author_id", ids)?;
    }
    frame.require_column("name", "authors")?;
    Ok(frame)
}

fn normalise_authorships(mut frame: Table) -> MetricsResult<Table> {
    frame.rename_columns(&[("paper", "paper_id"), ("author", "author_id"), ("person_id", "author_id")]);
    for column in ["paper_id", "author_id"] {
        frame.require_column(column, "authorships")?;
    }
    Ok(frame)
}

/// Page-level text of the given PDFs: `paper_id` (file stem), `page`
/// (0-based), `text` (trimmed) and `path`.
pub fn pdf_text(paths: &[PathBuf]) -> MetricsResult<Table> {
    pdf_text_with(&LopdfSource, paths)
}

/// [`pdf_text`] with an explicit text source.
pub fn pdf_text_with(source: &dyn PdfTextSource, paths: &[PathBuf]) -> MetricsResult<Table> {
    let mut table = Table::new(["paper_id", "page", "text", "path"]);
    for path in paths {
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        for (page, text) in source.page_texts(path)?.iter().enumerate() {
            table.push_row(vec![
                Value::String(stem.clone()),
                Value::from(page),
                Value::String(text.trim().to_string()),
                Value::String(path.display().to_string()),
            ])?;
        }
    }
    Ok(table)
}

/// Papers mentioning any of `keywords`.
///
/// `Substring` and `Lemma` match any keyword; `MinMatch` requires all of
/// them. `columns` defaults to title, abstract, keywords and summary.
pub fn keyword_filter(
    papers: &Table,
    keywords: &[&str],
    columns: Option<&[&str]>,
    mode: KeywordMode,
) -> MetricsResult<Table> {
    if keywords.iter().all(|k| k.trim().is_empty()) {
        return Ok(papers.empty_like());
    }
    let options = KeywordOptions {
        mode,
        columns: columns.map(|cols| cols.iter().map(|c| (*c).to_string()).collect()),
        min_match: None,
    };
    by_keywords(papers, keywords, &options)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_normalise_papers_renames_and_defaults() {
        let frame = Table::from_rows(
            ["id", "title", "year"],
            vec![vec![json!("X1"), json!("A"), json!("2020")], vec![json!("X2"), json!("B"), json!("n/a")]],
        )
        .unwrap();
        let papers = normalise_papers(frame).unwrap();
        assert_eq!(papers.row(0).get("paper_id"), Some(&json!("X1")));
        assert_eq!(papers.row(0).get("year"), Some(&json!(2020)));
        assert_eq!(papers.row(1).get("year"), Some(&Value::Null));
        assert_eq!(papers.row(1).get("venue"), Some(&json!("Unknown")));
    }

    #[test]
    fn test_normalise_papers_synthesises_ids() {
        let frame = Table::from_rows(["title"], vec![vec![json!("A")], vec![json!("B")]]).unwrap();
        let papers = normalise_papers(frame).unwrap();
        assert_eq!(papers.columns()[0], "paper_id");
        assert_eq!(papers.row(1).get("paper_id"), Some(&json!("1")));
    }

    #[test]
    fn test_normalise_authorships_requires_author() {
        let frame = Table::from_rows(["paper"], vec![vec![json!("P1")]]).unwrap();
        let err = normalise_authorships(frame).unwrap_err();
        assert_eq!(err.to_string(), "Column 'author_id' missing from authorships");
    }
}
