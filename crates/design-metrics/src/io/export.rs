//! Reference-manager exports for paper records.

use crate::error::{MetricsError, MetricsResult};
use crate::models::{ExportFormat, Paper};

/// Render `papers` in the requested format.
pub fn export_papers(papers: &[Paper], format: ExportFormat, include_abstract: bool) -> MetricsResult<String> {
    let output = match format {
        ExportFormat::Ris => format_ris(papers, include_abstract),
        ExportFormat::Bibtex => format_bibtex(papers, include_abstract),
        ExportFormat::Csv => format_csv(papers, include_abstract)?,
        ExportFormat::Endnote => format_endnote(papers, include_abstract),
    };
    tracing::debug!(papers = papers.len(), ?format, "Exported papers");
    Ok(output)
}

/// Format papers as RIS.
fn format_ris(papers: &[Paper], include_abstract: bool) -> String {
    let mut output = String::new();

    for paper in papers {
        output.push_str("TY  - JOUR\n");
        output.push_str(&format!("TI  - {}\n", paper.title_or_default()));
        for author in &paper.authors {
            output.push_str(&format!("AU  - {author}\n"));
        }
        if let Some(year) = paper.year {
            output.push_str(&format!("PY  - {year}\n"));
        }
        if let Some(venue) = &paper.venue {
            output.push_str(&format!("JO  - {venue}\n"));
        }
        for keyword in &paper.keywords {
            output.push_str(&format!("KW  - {keyword}\n"));
        }
        if include_abstract {
            if let Some(abs) = &paper.r#abstract {
                output.push_str(&format!("AB  - {}\n", single_line(abs)));
            }
        }
        if let Some(doi) = paper.doi() {
            output.push_str(&format!("DO  - {doi}\n"));
        }
        output.push_str(&format!("ID  - {}\n", paper.paper_id));
        output.push_str("ER  - \n\n");
    }

    output
}

/// Format papers as BibTeX. Keys are first-author surname plus year.
fn format_bibtex(papers: &[Paper], include_abstract: bool) -> String {
    let mut output = String::new();

    for paper in papers {
        let key = citation_key(paper);
        output.push_str(&format!("@article{{{key},\n"));
        output.push_str(&format!("  title = {{{}}},\n", escape_bibtex(paper.title_or_default())));
        if !paper.authors.is_empty() {
            output.push_str(&format!("  author = {{{}}},\n", escape_bibtex(&paper.authors.join(" and "))));
        }
        if let Some(year) = paper.year {
            output.push_str(&format!("  year = {{{year}}},\n"));
        }
        if let Some(venue) = &paper.venue {
            output.push_str(&format!("  journal = {{{}}},\n", escape_bibtex(venue)));
        }
        if !paper.keywords.is_empty() {
            output.push_str(&format!("  keywords = {{{}}},\n", escape_bibtex(&paper.keywords.join(", "))));
        }
        if include_abstract {
            if let Some(abs) = &paper.r#abstract {
                output.push_str(&format!("  abstract = {{{}}},\n", escape_bibtex(abs)));
            }
        }
        if let Some(doi) = paper.doi() {
            output.push_str(&format!("  doi = {{{doi}}},\n"));
        }
        output.push_str("}\n\n");
    }

    output
}

/// Format papers as CSV.
fn format_csv(papers: &[Paper], include_abstract: bool) -> MetricsResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["paper_id", "title", "authors", "year", "venue", "keywords", "doi"];
    if include_abstract {
        header.push("abstract");
    }
    writer.write_record(&header)?;

    for paper in papers {
        let mut row = vec![
            guard_formula(&paper.paper_id),
            guard_formula(paper.title_or_default()),
            guard_formula(&paper.author_names()),
            paper.year.map_or_else(String::new, |y| y.to_string()),
            guard_formula(paper.venue.as_deref().unwrap_or("")),
            guard_formula(&paper.keywords.join("; ")),
            guard_formula(paper.doi().unwrap_or("")),
        ];
        if include_abstract {
            row.push(guard_formula(paper.r#abstract.as_deref().unwrap_or("")));
        }
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| MetricsError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Format papers as EndNote.
fn format_endnote(papers: &[Paper], include_abstract: bool) -> String {
    let mut output = String::new();

    for paper in papers {
        output.push_str("%0 Journal Article\n");
        output.push_str(&format!("%T {}\n", paper.title_or_default()));
        for author in &paper.authors {
            output.push_str(&format!("%A {author}\n"));
        }
        if let Some(year) = paper.year {
            output.push_str(&format!("%D {year}\n"));
        }
        if let Some(venue) = &paper.venue {
            output.push_str(&format!("%J {venue}\n"));
        }
        for keyword in &paper.keywords {
            output.push_str(&format!("%K {keyword}\n"));
        }
        if include_abstract {
            if let Some(abs) = &paper.r#abstract {
                output.push_str(&format!("%X {}\n", single_line(abs)));
            }
        }
        if let Some(doi) = paper.doi() {
            output.push_str(&format!("%R {doi}\n"));
        }
        output.push('\n');
    }

    output
}

fn citation_key(paper: &Paper) -> String {
    let surname = paper
        .first_author()
        .map(|a| match a.split_once(',') {
            Some((last, _)) => last.trim(),
            None => a.split_whitespace().last().unwrap_or("Unknown"),
        })
        .filter(|s| !s.is_empty())
        .unwrap_or("Unknown");
    let surname: String = surname.chars().filter(|c| c.is_alphanumeric()).collect();
    match paper.year {
        Some(year) => format!("{surname}{year}"),
        None => surname,
    }
}

fn single_line(text: &str) -> String {
    text.replace('\r', "").replace('\n', " ")
}

/// Escape a string for BibTeX output.
fn escape_bibtex(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '^' => out.push_str("\\textasciicircum{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            '{' | '}' | '&' | '%' | '$' | '#' | '_' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Prefix cells that a spreadsheet would evaluate as a formula.
fn guard_formula(s: &str) -> String {
    if s.starts_with(['=', '+', '-', '@']) {
        format!("'{s}")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_formula() {
        assert_eq!(guard_formula("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(guard_formula("Design"), "Design");
    }

    #[test]
    fn test_citation_key_uses_surname() {
        let paper = Paper {
            authors: vec!["Tan, Alice".into()],
            year: Some(2020),
            ..Paper::default()
        };
        assert_eq!(citation_key(&paper), "Tan2020");

        let paper = Paper { authors: vec!["Alice Tan".into()], ..Paper::default() };
        assert_eq!(citation_key(&paper), "Tan");
    }

    #[test]
    fn test_escape_bibtex() {
        assert_eq!(escape_bibtex("R&D 50%"), "R\\&D 50\\%");
        assert_eq!(escape_bibtex("a\\b{c}"), "a\\textbackslash{}b\\{c\\}");
    }
}
