//! Markdown output formatting.

use std::borrow::Cow;
use std::fmt::Write as _;

use crate::graphs::NetworkStats;
use crate::models::Paper;
use crate::table::{Table, value_to_text};
use crate::text::Keyword;

/// Format a list of papers as Markdown.
#[must_use]
pub fn format_papers_markdown(papers: &[Paper]) -> String {
    if papers.is_empty() {
        return "No entries found.".to_string();
    }

    let mut output = format!("# Entries ({} results)\n\n", papers.len());

    for (i, paper) in papers.iter().enumerate() {
        output.push_str(&format_paper_markdown(paper, i + 1));
        output.push_str("\n---\n\n");
    }

    output
}

/// Format a single paper as Markdown.
#[must_use]
pub fn format_paper_markdown(paper: &Paper, index: usize) -> String {
    let mut output = String::new();

    let _ = write!(output, "## {}. {}\n\n", index, paper.title_or_default());

    if !paper.authors.is_empty() {
        let _ = write!(output, "**Authors**: {}\n\n", paper.author_names());
    }

    let mut meta = vec![format!("**Key**: `{}`", paper.paper_id)];
    if let Some(year) = paper.year {
        meta.push(format!("**Year**: {year}"));
    }
    if let Some(venue) = &paper.venue {
        meta.push(format!("**Venue**: {venue}"));
    }
    let _ = write!(output, "{}\n\n", meta.join(" | "));

    if !paper.keywords.is_empty() {
        let _ = write!(output, "**Keywords**: {}\n\n", paper.keywords.join(", "));
    }

    if let Some(doi) = paper.doi() {
        let _ = write!(output, "**Links**: [DOI](https://doi.org/{doi})\n\n");
    }

    // Abstract (truncated)
    if let Some(abs) = &paper.r#abstract {
        let truncated: Cow<'_, str> = if abs.chars().count() > 300 {
            Cow::Owned(format!("{}...", abs.chars().take(300).collect::<String>()))
        } else {
            Cow::Borrowed(abs)
        };
        let _ = writeln!(output, "**Abstract**: {truncated}");
    }

    output
}

/// Ranked keyword list.
#[must_use]
pub fn format_keywords_markdown(keywords: &[Keyword]) -> String {
    if keywords.is_empty() {
        return "No keywords found.".to_string();
    }

    let mut output = format!("# Keywords ({} results)\n\n", keywords.len());
    for (i, keyword) in keywords.iter().enumerate() {
        let _ = writeln!(output, "{}. **{}** ({:.2})", i + 1, keyword.phrase, keyword.score);
    }
    output
}

/// Render a table as a pipe table. Pipes inside cells are escaped.
#[must_use]
pub fn format_table_markdown(table: &Table) -> String {
    if table.columns().is_empty() {
        return "No data.".to_string();
    }
    let cell = |text: &str| text.replace('|', "\\|").replace('\n', " ");

    let mut output = String::new();
    let header: Vec<String> = table.columns().iter().map(|c| cell(c)).collect();
    let _ = writeln!(output, "| {} |", header.join(" | "));
    let _ = writeln!(output, "|{}", " --- |".repeat(header.len()));
    for row in table.rows() {
        let cells: Vec<String> = row.values().iter().map(|v| cell(&value_to_text(v))).collect();
        let _ = writeln!(output, "| {} |", cells.join(" | "));
    }
    output
}

/// Network summary as a Markdown section.
#[must_use]
pub fn format_stats_markdown(stats: &NetworkStats) -> String {
    let mut output = String::from("# Co-authorship network\n\n");
    let _ = writeln!(output, "**Nodes**: {} | **Edges**: {}", stats.nodes, stats.edges);
    let _ = writeln!(output, "**Density**: {:.4} | **Average degree**: {:.2}", stats.density, stats.average_degree);
    let _ = writeln!(
        output,
        "**Components**: {} | **Largest component**: {:.1}%",
        stats.components,
        stats.largest_component_fraction * 100.0
    );
    output
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_table_markdown_escapes_pipes() {
        let table = Table::from_rows(["node", "degree"], vec![vec![json!("A|B"), json!(0.5)]]).unwrap();
        let output = format_table_markdown(&table);
        assert_eq!(output, "| node | degree |\n| --- | --- |\n| A\\|B | 0.5 |\n");
    }

    #[test]
    fn test_empty_papers() {
        assert_eq!(format_papers_markdown(&[]), "No entries found.");
    }

    #[test]
    fn test_keywords_markdown() {
        let keywords = vec![Keyword { phrase: "timber gridshell".to_string(), score: 4.0 }];
        let output = format_keywords_markdown(&keywords);
        assert!(output.contains("1. **timber gridshell** (4.00)"));
    }
}
