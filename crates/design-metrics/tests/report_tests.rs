//! Report capture and rendering.

use design_metrics::Table;
use design_metrics::report::{ReportContext, ReportRegistry, notebook, render_html};
use serde_json::json;
use tempfile::TempDir;

fn trend_table(count: i64) -> Table {
    Table::from_rows(["year", "count"], vec![vec![json!(2021), json!(count)]]).unwrap()
}

// =============================================================================
// Rendering to disk
// =============================================================================

#[test]
fn test_render_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("reports").join("2024").join("summary.html");
    let mut registry = ReportRegistry::new();
    registry.capture("trend", trend_table(4));

    let written = notebook("summary").render(&registry, &out, None).unwrap();
    assert_eq!(written, out);

    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.starts_with("<html><body>\n<h1>Summary Report</h1>"));
    assert!(html.contains("<section><h2>Trends</h2>"));
    assert!(html.contains("<td>2021</td><td>4</td>"));
    assert!(html.contains("<footer>Generated "));
    assert!(html.ends_with("</body></html>"));
}

#[test]
fn test_context_precedence() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("report.html");
    let mut registry = ReportRegistry::new();
    registry.capture("trend", trend_table(1));
    registry.capture("geo", json!("from registry"));

    let template = notebook("overview").with_context("trend", trend_table(2)).with_context("topics", json!("template topics"));
    let mut call = ReportContext::new();
    call.insert("trend".to_string(), trend_table(3).into());

    template.render(&registry, &out, Some(&call)).unwrap();
    let html = std::fs::read_to_string(&out).unwrap();
    assert!(html.contains("<td>3</td>"));
    assert!(!html.contains("<td>1</td>"));
    assert!(!html.contains("<td>2</td>"));
    assert!(html.contains("<pre>template topics</pre>"));
    assert!(html.contains("<pre>from registry</pre>"));
}

#[test]
fn test_registry_reset() {
    let mut registry = ReportRegistry::new();
    registry.capture("trend", trend_table(1));
    assert_eq!(registry.snapshot().len(), 1);
    registry.reset();
    assert!(registry.snapshot().is_empty());
}

// =============================================================================
// HTML body
// =============================================================================

#[test]
fn test_sections_follow_fixed_order() {
    let mut context = ReportContext::new();
    context.insert("geo".to_string(), json!({"Japan": 2}).into());
    context.insert("coauthor_stats".to_string(), json!({"nodes": 4}).into());
    context.insert("trend".to_string(), trend_table(5).into());
    let html = render_html("design", &context);

    let trend = html.find("<h2>Trends</h2>").unwrap();
    let coauthors = html.find("<h2>Co-authorship</h2>").unwrap();
    let geo = html.find("<h2>Geography</h2>").unwrap();
    assert!(trend < coauthors && coauthors < geo);
    assert!(!html.contains("<h2>Topics</h2>"));
    assert!(!html.contains("No data available."));
}

#[test]
fn test_empty_values_are_skipped() {
    let mut context = ReportContext::new();
    context.insert("trend".to_string(), Table::new(["year", "count"]).into());
    context.insert("topics".to_string(), json!(null).into());
    let html = render_html("empty", &context);
    assert!(html.contains("<p>No data available.</p>"));
    assert!(!html.contains("<section>"));
}

#[test]
fn test_unknown_keys_are_ignored() {
    let mut context = ReportContext::new();
    context.insert("scratch".to_string(), json!("not shown").into());
    let html = render_html("misc", &context);
    assert!(!html.contains("not shown"));
}

#[test]
fn test_cells_are_escaped() {
    let table = Table::from_rows(["venue"], vec![vec![json!("<script>&")]]).unwrap();
    let mut context = ReportContext::new();
    context.insert("geo".to_string(), table.into());
    let html = render_html("geo", &context);
    assert!(html.contains("<td>&lt;script&gt;&amp;</td>"));
}
