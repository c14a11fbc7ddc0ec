//! HTML reports assembled from captured analysis results.
//!
//! Results are captured into a [`ReportRegistry`] under well-known keys and
//! rendered by a [`NotebookTemplate`]:
//!
//! | key              | section       |
//! |------------------|---------------|
//! | `trend`          | Trends        |
//! | `topics`         | Topics        |
//! | `coauthor_stats` | Co-authorship |
//! | `geo`            | Geography     |
//!
//! When the same key appears in several places the registry is overridden
//! by the template context, which is overridden by the render call context.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::error::MetricsResult;
use crate::table::{Table, value_to_text};

const SECTIONS: &[(&str, &str)] = &[
    ("trend", "Trends"),
    ("topics", "Topics"),
    ("coauthor_stats", "Co-authorship"),
    ("geo", "Geography"),
];

/// A value that can appear in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportValue {
    /// Rendered as an HTML table.
    Table(Table),
    /// Objects render as a one-row table, anything else as preformatted text.
    Value(Value),
}

impl ReportValue {
    fn has_content(&self) -> bool {
        match self {
            Self::Table(table) => !table.is_empty(),
            Self::Value(Value::Null) => false,
            Self::Value(Value::Object(map)) => !map.is_empty(),
            Self::Value(Value::Array(items)) => !items.is_empty(),
            Self::Value(Value::String(s)) => !s.trim().is_empty(),
            Self::Value(_) => true,
        }
    }

    fn to_html(&self) -> String {
        match self {
            Self::Table(table) => table_html(table),
            Self::Value(Value::Object(map)) => table_html(&Table::from_records([map.clone()])),
            Self::Value(other) => format!("<pre>{}</pre>", escape_html(&value_to_text(other))),
        }
    }
}

impl From<Table> for ReportValue {
    fn from(table: Table) -> Self {
        Self::Table(table)
    }
}

impl From<Value> for ReportValue {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Keyed report values.
pub type ReportContext = BTreeMap<String, ReportValue>;

/// Results captured during an analysis session.
#[derive(Debug, Clone, Default)]
pub struct ReportRegistry {
    data: ReportContext,
}

impl ReportRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any earlier value.
    pub fn capture(&mut self, key: impl Into<String>, value: impl Into<ReportValue>) {
        self.data.insert(key.into(), value.into());
    }

    /// Copy of everything captured so far.
    #[must_use]
    pub fn snapshot(&self) -> ReportContext {
        self.data.clone()
    }

    /// Forget all captured values.
    pub fn reset(&mut self) {
        self.data.clear();
    }
}

/// A named report with its own context.
#[derive(Debug, Clone, PartialEq)]
pub struct NotebookTemplate {
    name: String,
    context: ReportContext,
}

/// Start a report called `name`.
#[must_use]
pub fn notebook(name: &str) -> NotebookTemplate {
    NotebookTemplate { name: name.to_string(), context: ReportContext::new() }
}

impl NotebookTemplate {
    /// Report name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Template-level context.
    #[must_use]
    pub fn context(&self) -> &ReportContext {
        &self.context
    }

    /// Add a template-level context value.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<ReportValue>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Write the report to `out`, creating parent directories.
    pub fn render(
        &self,
        registry: &ReportRegistry,
        out: &Path,
        context: Option<&ReportContext>,
    ) -> MetricsResult<PathBuf> {
        let mut combined = registry.snapshot();
        combined.extend(self.context.clone());
        if let Some(context) = context {
            combined.extend(context.clone());
        }

        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let html = render_document(&self.name, &combined, Some(Utc::now()));
        fs::write(out, html)?;
        tracing::info!(path = %out.display(), keys = combined.len(), "Rendered report");
        Ok(out.to_path_buf())
    }
}

/// HTML for a report named `name` over `context`.
#[must_use]
pub fn render_html(name: &str, context: &ReportContext) -> String {
    render_document(name, context, None)
}

fn render_document(name: &str, context: &ReportContext, generated: Option<DateTime<Utc>>) -> String {
    let mut parts = vec!["<html><body>".to_string(), format!("<h1>{} Report</h1>", escape_html(&title_case(name)))];
    let sections: Vec<String> = SECTIONS
        .iter()
        .filter_map(|(key, title)| {
            let value = context.get(*key).filter(|v| v.has_content())?;
            Some(format!("<section><h2>{title}</h2>{}</section>", value.to_html()))
        })
        .collect();
    if sections.is_empty() {
        parts.push("<p>No data available.</p>".to_string());
    }
    parts.extend(sections);
    if let Some(at) = generated {
        parts.push(format!("<footer>Generated {}</footer>", at.format("%Y-%m-%d %H:%M UTC")));
    }
    parts.push("</body></html>".to_string());
    parts.join("\n")
}

fn table_html(table: &Table) -> String {
    let mut html = String::from("<table><thead><tr>");
    for column in table.columns() {
        let _ = write!(html, "<th>{}</th>", escape_html(column));
    }
    html.push_str("</tr></thead><tbody>");
    for row in table.rows() {
        html.push_str("<tr>");
        for value in row.values() {
            let _ = write!(html, "<td>{}</td>", escape_html(&value_to_text(value)));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Upper-case the first letter of every run of letters, lower-case the rest.
fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_letter = false;
    for c in text.chars() {
        if previous_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        previous_letter = c.is_alphabetic();
    }
    out
}
