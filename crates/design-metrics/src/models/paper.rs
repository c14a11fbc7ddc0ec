//! Paper record as found in corpus exports.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A research paper row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// Corpus-local paper identifier.
    #[serde(default, deserialize_with = "text_or_number")]
    pub paper_id: String,

    /// Paper title.
    #[serde(default, deserialize_with = "optional_text")]
    pub title: Option<String>,

    /// Paper abstract.
    #[serde(default, deserialize_with = "optional_text")]
    pub r#abstract: Option<String>,

    /// Publication year.
    #[serde(default, deserialize_with = "optional_year")]
    pub year: Option<i32>,

    /// Publication venue (journal or conference).
    #[serde(default, deserialize_with = "optional_text")]
    pub venue: Option<String>,

    /// Author names in order.
    #[serde(default, deserialize_with = "string_list")]
    pub authors: Vec<String>,

    /// Author-supplied keywords.
    #[serde(default, deserialize_with = "string_list")]
    pub keywords: Vec<String>,

    /// Digital Object Identifier.
    #[serde(default, deserialize_with = "optional_text")]
    pub doi: Option<String>,
}

impl Paper {
    /// Get the paper title, falling back to "Untitled" if not available.
    #[must_use]
    pub fn title_or_default(&self) -> &str {
        self.title.as_deref().filter(|t| !t.trim().is_empty()).unwrap_or("Untitled")
    }

    /// Get the first author's name if available.
    #[must_use]
    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(String::as_str)
    }

    /// Get author names as a comma-separated string.
    #[must_use]
    pub fn author_names(&self) -> String {
        self.authors.join(", ")
    }

    /// Get the DOI if available.
    #[must_use]
    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref().filter(|d| !d.is_empty())
    }
}

fn text_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn optional_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i32>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Lists may arrive as JSON arrays or as `;`-separated strings.
fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        Value::String(s) => {
            s.split(';').map(str::trim).filter(|p| !p.is_empty()).map(String::from).collect()
        }
        _ => Vec::new(),
    })
}
