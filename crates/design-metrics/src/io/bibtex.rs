//! BibTeX parsing and writing.
//!
//! The parser covers the entry shapes found in reference-manager exports:
//! braced and quoted values with nested braces, numbers, `@string` macros and
//! `#` concatenation. `@comment` and `@preamble` blocks are skipped. It is not
//! a TeX interpreter: accents and commands inside values are left untouched.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{MetricsError, MetricsResult};
use crate::models::Paper;
use crate::table::{Record, Table};

/// One parsed BibTeX entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BibEntry {
    /// Lower-cased entry type (`article`, `inproceedings`, ...).
    pub entry_type: String,
    /// Citation key as written.
    pub citation_key: String,
    /// Lower-cased field names with their values, in source order.
    pub fields: Vec<(String, String)>,
}

impl BibEntry {
    /// Value of `name` (case-insensitive).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        let name = name.to_lowercase();
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }

    /// The entry as a flat record with `ENTRYTYPE` and `ID` keys.
    #[must_use]
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("ENTRYTYPE".into(), Value::String(self.entry_type.clone()));
        record.insert("ID".into(), Value::String(self.citation_key.clone()));
        for (name, value) in &self.fields {
            record.insert(name.clone(), Value::String(value.clone()));
        }
        record
    }

    /// Render the entry as BibTeX source with braced values.
    #[must_use]
    pub fn to_bibtex(&self) -> String {
        let mut output = format!("@{}{{{},\n", self.entry_type, self.citation_key);
        for (name, value) in &self.fields {
            output.push_str(&format!("  {name} = {{{value}}},\n"));
        }
        output.push_str("}\n");
        output
    }

    /// Map common fields onto a [`Paper`].
    #[must_use]
    pub fn to_paper(&self) -> Paper {
        let authors = self
            .field("author")
            .map(|a| {
                a.split(" and ")
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        let keywords = self
            .field("keywords")
            .map(|k| {
                k.split([',', ';'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        Paper {
            paper_id: self.citation_key.clone(),
            title: self.field("title").map(String::from),
            r#abstract: self.field("abstract").map(String::from),
            year: self.field("year").and_then(|y| y.trim().parse().ok()),
            venue: self.field("journal").or_else(|| self.field("booktitle")).map(String::from),
            authors,
            keywords,
            doi: self.field("doi").map(String::from),
        }
    }
}

/// Entries as a table: `ENTRYTYPE`, `ID`, then one column per field name.
#[must_use]
pub fn entries_to_table(entries: &[BibEntry]) -> Table {
    Table::from_records(entries.iter().map(BibEntry::to_record))
}

/// Parse every entry in `text`.
///
/// Errors carry the 1-based line of the problem: a malformed `@type{` header,
/// a field without `=`, an entry opened inside another entry, or an entry or
/// value still open at the end of input.
pub fn parse_bibtex_entries(text: &str) -> MetricsResult<Vec<BibEntry>> {
    let mut parser = Parser::new(text);
    let mut entries = Vec::new();

    while let Some(c) = parser.skip_whitespace() {
        match c {
            '%' => parser.skip_line(),
            '@' => {
                if let Some(entry) = parser.entry()? {
                    entries.push(entry);
                }
            }
            _ => parser.skip_line(),
        }
    }

    tracing::debug!(entries = entries.len(), macros = parser.macros.len(), "Parsed BibTeX");
    Ok(entries)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    macros: HashMap<String, String>,
}

impl Parser {
    fn new(text: &str) -> Self {
        Self { chars: text.chars().collect(), pos: 0, line: 1, macros: HashMap::new() }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_whitespace(&mut self) -> Option<char> {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                return Some(c);
            }
            self.bump();
        }
        None
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.bump() {
            if c == '\n' {
                break;
            }
        }
    }

    fn identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '.' | '+' | '/') {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    /// Parse one `@...` block. Returns `None` for blocks that carry no entry.
    fn entry(&mut self) -> MetricsResult<Option<BibEntry>> {
        let start = self.line;
        self.bump();
        let entry_type = self.identifier().to_lowercase();
        if entry_type.is_empty() {
            return Err(MetricsError::bibtex(start, "Malformed BibTeX entry header"));
        }
        let close = match self.skip_whitespace() {
            Some('{') => '}',
            Some('(') => ')',
            _ => return Err(MetricsError::bibtex(start, "Malformed BibTeX entry header")),
        };
        self.bump();

        match entry_type.as_str() {
            "comment" | "preamble" => {
                self.skip_block(close, start)?;
                Ok(None)
            }
            "string" => {
                self.string_macro(close, start)?;
                Ok(None)
            }
            _ => self.regular_entry(entry_type, close, start).map(Some),
        }
    }

    fn skip_block(&mut self, close: char, start: usize) -> MetricsResult<()> {
        let open = if close == '}' { '{' } else { '(' };
        let mut depth = 1usize;
        while let Some(c) = self.bump() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        Err(MetricsError::bibtex(start, "Unterminated BibTeX entry"))
    }

    fn string_macro(&mut self, close: char, start: usize) -> MetricsResult<()> {
        self.skip_whitespace();
        let name = self.identifier().to_lowercase();
        if name.is_empty() {
            return Err(MetricsError::bibtex(self.line, "Expected a macro name in @string"));
        }
        if self.skip_whitespace() != Some('=') {
            return Err(MetricsError::bibtex(self.line, format!("Missing '=' after macro '{name}'")));
        }
        self.bump();
        let value = self.value(start)?;
        match self.skip_whitespace() {
            Some(c) if c == close => {
                self.bump();
                self.macros.insert(name, value);
                Ok(())
            }
            Some(_) => Err(MetricsError::bibtex(self.line, "Expected end of @string")),
            None => Err(MetricsError::bibtex(start, "Unterminated BibTeX entry")),
        }
    }

    fn regular_entry(&mut self, entry_type: String, close: char, start: usize) -> MetricsResult<BibEntry> {
        self.skip_whitespace();
        let mut citation_key = String::new();
        loop {
            match self.peek() {
                None => return Err(MetricsError::bibtex(start, "Unterminated BibTeX entry")),
                Some(',') => {
                    self.bump();
                    break;
                }
                Some(c) if c == close => break,
                Some('@' | '=' | '{' | '}' | '\n') => {
                    return Err(MetricsError::bibtex(self.line, "Malformed BibTeX entry header"));
                }
                Some(c) => {
                    citation_key.push(c);
                    self.bump();
                }
            }
        }
        let citation_key = citation_key.trim().to_string();

        let mut fields: Vec<(String, String)> = Vec::new();
        loop {
            match self.skip_whitespace() {
                None => return Err(MetricsError::bibtex(start, "Unterminated BibTeX entry")),
                Some(c) if c == close => {
                    self.bump();
                    break;
                }
                Some('@') => {
                    return Err(MetricsError::bibtex(self.line, "Nested BibTeX entries detected"));
                }
                Some(',') => {
                    self.bump();
                    continue;
                }
                Some(_) => {}
            }

            let name = self.identifier().to_lowercase();
            if name.is_empty() {
                return Err(MetricsError::bibtex(self.line, "Expected a field name"));
            }
            if self.skip_whitespace() != Some('=') {
                return Err(MetricsError::bibtex(self.line, format!("Missing '=' after field '{name}'")));
            }
            self.bump();
            let value = self.value(start)?;

            match fields.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value,
                None => fields.push((name, value)),
            }

            match self.skip_whitespace() {
                Some(',') => {
                    self.bump();
                }
                Some(c) if c == close => {}
                Some('@') => {
                    return Err(MetricsError::bibtex(self.line, "Nested BibTeX entries detected"));
                }
                Some(_) => {
                    return Err(MetricsError::bibtex(self.line, "Expected ',' between fields"));
                }
                None => return Err(MetricsError::bibtex(start, "Unterminated BibTeX entry")),
            }
        }

        Ok(BibEntry { entry_type, citation_key, fields })
    }

    /// Parse `part (# part)*` and collapse whitespace.
    fn value(&mut self, start: usize) -> MetricsResult<String> {
        let mut out = String::new();
        loop {
            let value_line = self.line;
            match self.skip_whitespace() {
                None => return Err(MetricsError::bibtex(start, "Unterminated BibTeX entry")),
                Some('{') => {
                    self.bump();
                    out.push_str(&self.delimited('}', value_line)?);
                }
                Some('"') => {
                    self.bump();
                    out.push_str(&self.delimited('"', value_line)?);
                }
                Some(c) if c.is_ascii_digit() => {
                    while let Some(d) = self.peek().filter(char::is_ascii_digit) {
                        out.push(d);
                        self.bump();
                    }
                }
                Some(c) if c.is_alphabetic() => {
                    let name = self.identifier();
                    match self.macros.get(&name.to_lowercase()) {
                        Some(expanded) => out.push_str(expanded),
                        None => out.push_str(&name),
                    }
                }
                Some(c) => {
                    return Err(MetricsError::bibtex(self.line, format!("Unexpected character '{c}' in value")));
                }
            }
            if self.skip_whitespace() == Some('#') {
                self.bump();
            } else {
                break;
            }
        }
        Ok(out.split_whitespace().collect::<Vec<_>>().join(" "))
    }

    /// Read up to the closing delimiter at brace depth zero; inner braces are kept.
    fn delimited(&mut self, terminator: char, value_line: usize) -> MetricsResult<String> {
        let mut depth = 0usize;
        let mut out = String::new();
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                c if c == terminator && depth == 0 => return Ok(out),
                '}' => {
                    return Err(MetricsError::bibtex(self.line, "Unbalanced '}' in value"));
                }
                _ => {}
            }
            out.push(c);
        }
        Err(MetricsError::bibtex(value_line, "Unterminated BibTeX value"))
    }
}
