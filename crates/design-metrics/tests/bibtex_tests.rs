//! BibTeX parsing, writing and table conversion.

use design_metrics::MetricsError;
use design_metrics::io::{entries_to_table, parse_bibtex_entries};
use proptest::prelude::*;

const LIBRARY: &str = r#"% exported from a reference manager
@article{tan2021,
  title = {Timber {G}ridshells in Practice},
  author = {Tan, Alice and Lee, Bob},
  journal = "Design Studies",
  year = 2021,
  keywords = {timber; robotics, fabrication}
}

@inproceedings(gomez2020,
  title = {GANs for
           early massing},
  booktitle = {CAADRIA},
  year = {2020}
)
"#;

fn line_of(err: &MetricsError) -> usize {
    match err {
        MetricsError::BibTex { line, .. } => *line,
        other => panic!("expected a BibTeX error, got {other:?}"),
    }
}

// =============================================================================
// Parsing
// =============================================================================

#[test]
fn test_parses_both_delimiters() {
    let entries = parse_bibtex_entries(LIBRARY).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].entry_type, "article");
    assert_eq!(entries[0].citation_key, "tan2021");
    assert_eq!(entries[1].entry_type, "inproceedings");
    assert_eq!(entries[1].citation_key, "gomez2020");
}

#[test]
fn test_values_keep_inner_braces_and_collapse_whitespace() {
    let entries = parse_bibtex_entries(LIBRARY).unwrap();
    assert_eq!(entries[0].field("title"), Some("Timber {G}ridshells in Practice"));
    assert_eq!(entries[0].field("JOURNAL"), Some("Design Studies"));
    assert_eq!(entries[0].field("year"), Some("2021"));
    assert_eq!(entries[1].field("title"), Some("GANs for early massing"));
}

#[test]
fn test_minimal_entry_round_trips() {
    let entries = parse_bibtex_entries("@misc{key1, title = {Design Metrics}, year = {2024}}").unwrap();
    let rendered = entries[0].to_bibtex();
    assert_eq!(rendered, "@misc{key1,\n  title = {Design Metrics},\n  year = {2024},\n}\n");
    let reparsed = parse_bibtex_entries(&rendered).unwrap();
    assert_eq!(reparsed, entries);
}

#[test]
fn test_empty_input_has_no_entries() {
    assert!(parse_bibtex_entries("").unwrap().is_empty());
    assert!(parse_bibtex_entries("% only a comment\n").unwrap().is_empty());
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_missing_equals_reports_line() {
    let err = parse_bibtex_entries("@article{a,\n  title {Oops}\n}").unwrap_err();
    assert_eq!(line_of(&err), 2);
    assert!(err.to_string().contains("Missing '='"));
}

#[test]
fn test_unterminated_entry_reports_start_line() {
    let err = parse_bibtex_entries("\n\n@article{a,\n  title = {Open},\n").unwrap_err();
    assert_eq!(line_of(&err), 3);
    assert!(err.to_string().contains("Unterminated BibTeX entry"));
}

#[test]
fn test_unterminated_value() {
    let err = parse_bibtex_entries("@article{a,\n  title = {Open\n").unwrap_err();
    assert!(err.to_string().contains("Unterminated BibTeX value"));
    assert_eq!(line_of(&err), 2);
}

#[test]
fn test_nested_entry_detected() {
    let err = parse_bibtex_entries("@article{a,\n  title = {A},\n@article{b, title = {B}}").unwrap_err();
    assert!(err.to_string().contains("Nested BibTeX entries"));
}

#[test]
fn test_malformed_header() {
    assert!(parse_bibtex_entries("@{a, title = {A}}").is_err());
    assert!(parse_bibtex_entries("@article a, title = {A}").is_err());
}

#[test]
fn test_missing_comma_between_fields() {
    let err = parse_bibtex_entries("@article{a, title = {A} year = {2020}}").unwrap_err();
    assert!(err.to_string().contains("Expected ','"));
}

// =============================================================================
// Conversion
// =============================================================================

#[test]
fn test_entries_to_table() {
    let entries = parse_bibtex_entries(LIBRARY).unwrap();
    let table = entries_to_table(&entries);
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.columns(),
        &["ENTRYTYPE", "ID", "title", "author", "journal", "year", "keywords", "booktitle"]
    );
    assert_eq!(table.row(1).text("booktitle"), "CAADRIA");
    assert!(table.row(1).get("journal").is_some_and(serde_json::Value::is_null));
}

#[test]
fn test_to_paper_maps_fields() {
    let entries = parse_bibtex_entries(LIBRARY).unwrap();
    let paper = entries[0].to_paper();
    assert_eq!(paper.paper_id, "tan2021");
    assert_eq!(paper.year, Some(2021));
    assert_eq!(paper.venue.as_deref(), Some("Design Studies"));
    assert_eq!(paper.authors, vec!["Tan, Alice", "Lee, Bob"]);
    assert_eq!(paper.keywords, vec!["timber", "robotics", "fabrication"]);

    let second = entries[1].to_paper();
    assert_eq!(second.venue.as_deref(), Some("CAADRIA"));
}

proptest! {
    /// The parser returns a value or an error for any input; it never panics.
    #[test]
    fn parser_never_panics(text in ".{0,300}") {
        let _ = parse_bibtex_entries(&text);
    }

    /// Simple braced values survive parse → render → parse.
    #[test]
    fn braced_values_round_trip(key in "[a-z][a-z0-9]{0,10}", title in "[A-Za-z][A-Za-z0-9 ]{0,40}") {
        let source = format!("@article{{{key}, title = {{{title}}}}}");
        let entries = parse_bibtex_entries(&source).unwrap();
        prop_assert_eq!(entries.len(), 1);
        let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
        prop_assert_eq!(entries[0].field("title"), Some(collapsed.as_str()));
        let reparsed = parse_bibtex_entries(&entries[0].to_bibtex()).unwrap();
        prop_assert_eq!(reparsed, entries);
    }
}
