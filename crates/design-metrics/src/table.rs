//! Column-ordered tables of JSON cells.
//!
//! A [`Table`] is the tabular value passed between the analytics modules:
//! papers, authors, authorships, per-page PDF text, trend counts and so on.
//! Cells are [`serde_json::Value`]s and `Null` marks a missing value.

use std::cmp::Ordering;
use std::io::Read;
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Map, Number, Value};

use crate::error::{MetricsError, MetricsResult};
use crate::utils::Matrix;

/// A JSON object keyed by column name.
pub type Record = Map<String, Value>;

/// An ordered set of columns and rows of equal width.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a [String],
    values: &'a [Value],
    index: usize,
}

impl<'a> Row<'a> {
    /// Cell for `column`, or `None` when the column does not exist.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.columns.iter().position(|c| c == column).map(|i| &self.values[i])
    }

    /// Cell rendered as text; missing columns and nulls become "".
    #[must_use]
    pub fn text(&self, column: &str) -> String {
        self.get(column).map(value_to_text).unwrap_or_default()
    }

    /// Cell values in column order.
    #[must_use]
    pub const fn values(&self) -> &'a [Value] {
        self.values
    }

    /// Position of the row in its table.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }
}

impl Table {
    /// An empty table with the given columns.
    #[must_use]
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { columns: columns.into_iter().map(Into::into).collect(), rows: Vec::new() }
    }

    /// Build from columns and rows, checking every row width.
    pub fn from_rows<I, S>(columns: I, rows: Vec<Vec<Value>>) -> MetricsResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Build from JSON objects. Columns appear in first-seen order and
    /// absent keys become `Null`.
    #[must_use]
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = Record>,
    {
        let records: Vec<Record> = records.into_iter().collect();
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| {
                columns.iter().map(|c| record.get(c).cloned().unwrap_or(Value::Null)).collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Append a row. Its width must equal the column count.
    pub fn push_row(&mut self, row: Vec<Value>) -> MetricsResult<()> {
        if row.len() != self.columns.len() {
            return Err(MetricsError::validation(
                "row",
                format!("expected {} cells, got {}", self.columns.len(), row.len()),
            ));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Index of `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// True when `name` is a column.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of `name`, or a missing-column error labelled with `table`.
    pub fn require_column(&self, name: &str, table: &str) -> MetricsResult<usize> {
        self.column_index(name).ok_or_else(|| MetricsError::missing_column(table, name))
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Row<'_> {
        Row { columns: &self.columns, values: &self.rows[index], index }
    }

    /// Iterate over rows.
    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows
            .iter()
            .enumerate()
            .map(|(index, values)| Row { columns: &self.columns, values, index })
    }

    /// Cells of one column, or `None` if it does not exist.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| &r[idx]).collect())
    }

    /// Same columns, no rows.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self { columns: self.columns.clone(), rows: Vec::new() }
    }

    /// Keep rows whose mask entry is true.
    #[must_use]
    pub fn filter_rows(&self, mask: &[bool]) -> Self {
        let rows = self
            .rows
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(row, _)| row.clone())
            .collect();
        Self { columns: self.columns.clone(), rows }
    }

    /// Keep rows matching `predicate`.
    #[must_use]
    pub fn filter<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&Row<'_>) -> bool,
    {
        let mask: Vec<bool> = self.rows().map(|row| predicate(&row)).collect();
        self.filter_rows(&mask)
    }

    /// Rows at `indices`, in that order.
    #[must_use]
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        let rows = indices.iter().filter_map(|&i| self.rows.get(i).cloned()).collect();
        Self { columns: self.columns.clone(), rows }
    }

    /// Rename columns. Pairs whose source is absent are ignored; a rename
    /// onto an existing column is skipped.
    pub fn rename_columns(&mut self, pairs: &[(&str, &str)]) {
        for (from, to) in pairs {
            if from == to || self.has_column(to) {
                continue;
            }
            if let Some(idx) = self.column_index(from) {
                self.columns[idx] = (*to).to_string();
            }
        }
    }

    /// Insert a column at `index`.
    pub fn insert_column(&mut self, index: usize, name: &str, values: Vec<Value>) -> MetricsResult<()> {
        if self.has_column(name) {
            return Err(MetricsError::validation(name, "column already exists"));
        }
        self.check_column_len(name, &values)?;
        let index = index.min(self.columns.len());
        self.columns.insert(index, name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(index, value);
        }
        Ok(())
    }

    /// Replace the values of `name`, appending the column if needed.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) -> MetricsResult<()> {
        self.check_column_len(name, &values)?;
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Remove a column if present.
    pub fn drop_column(&mut self, name: &str) {
        if let Some(idx) = self.column_index(name) {
            self.columns.remove(idx);
            for row in &mut self.rows {
                row.remove(idx);
            }
        }
    }

    /// Keep only the listed columns, in that order. Absent names are skipped.
    #[must_use]
    pub fn select(&self, names: &[&str]) -> Self {
        let indices: Vec<usize> = names.iter().filter_map(|n| self.column_index(n)).collect();
        Self {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self.rows.iter().map(|r| indices.iter().map(|&i| r[i].clone()).collect()).collect(),
        }
    }

    /// Append every row of `other`, which must have identical columns.
    pub fn extend(&mut self, other: Self) -> MetricsResult<()> {
        if self.columns != other.columns {
            return Err(MetricsError::validation("table", "cannot append rows with different columns"));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Rows as JSON objects.
    #[must_use]
    pub fn to_records(&self) -> Vec<Record> {
        self.rows
            .iter()
            .map(|row| self.columns.iter().cloned().zip(row.iter().cloned()).collect())
            .collect()
    }

    /// Numeric columns as a matrix. Nulls and non-numeric cells are rejected.
    pub fn to_matrix(&self, columns: &[&str], table: &str) -> MetricsResult<Matrix> {
        let indices = columns
            .iter()
            .map(|c| self.require_column(c, table))
            .collect::<MetricsResult<Vec<_>>>()?;
        let mut data = Vec::with_capacity(self.rows.len() * indices.len());
        for row in &self.rows {
            for (&idx, name) in indices.iter().zip(columns) {
                let value = value_as_f64(&row[idx]).ok_or_else(|| {
                    MetricsError::validation(*name, "must only contain finite numeric values")
                })?;
                data.push(value);
            }
        }
        Matrix::from_vec(self.rows.len(), indices.len(), data)
    }

    /// Read a CSV file with a header row.
    pub fn read_csv(path: &Path) -> MetricsResult<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Parse CSV from any reader. Empty cells become `Null`; integers and
    /// finite floats become numbers.
    pub fn from_csv_reader<R: Read>(reader: R) -> MetricsResult<Self> {
        let mut reader = csv::ReaderBuilder::new().flexible(false).from_reader(reader);
        let columns: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut table = Self::new(columns);
        for record in reader.records() {
            let record = record?;
            table.rows.push(record.iter().map(infer_cell).collect());
        }
        Ok(table)
    }

    /// Read a JSON file holding an array of objects.
    pub fn read_json(path: &Path) -> MetricsResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a JSON array of objects.
    pub fn from_json_str(text: &str) -> MetricsResult<Self> {
        let records: Vec<Record> = serde_json::from_str(text)?;
        Ok(Self::from_records(records))
    }

    /// Render as CSV with a header row.
    pub fn to_csv_string(&self) -> MetricsResult<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(value_to_text))?;
        }
        let bytes = writer.into_inner().map_err(|e| MetricsError::Io(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// JSON array of records.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(self.to_records().into_iter().map(Value::Object).collect())
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows.len()))?;
        for row in &self.rows {
            seq.serialize_element(&OrderedRow { columns: &self.columns, values: row })?;
        }
        seq.end()
    }
}

struct OrderedRow<'a> {
    columns: &'a [String],
    values: &'a [Value],
}

impl Serialize for OrderedRow<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (column, value) in self.columns.iter().zip(self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

impl Table {
    fn check_column_len(&self, name: &str, values: &[Value]) -> MetricsResult<()> {
        if values.len() == self.rows.len() {
            Ok(())
        } else {
            Err(MetricsError::validation(
                name,
                format!("expected {} values, got {}", self.rows.len(), values.len()),
            ))
        }
    }
}

fn infer_cell(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    let trimmed = raw.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Value::from(i);
    }
    if let Ok(f) = trimmed.parse::<f64>() {
        if let Some(n) = Number::from_f64(f) {
            return Value::Number(n);
        }
    }
    Value::String(raw.to_string())
}

/// Text form of a cell. `Null` is "", arrays join their items with ", ".
#[must_use]
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(value_to_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

/// Numeric value of a cell. Numeric strings are accepted.
#[must_use]
pub fn value_as_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Total order over cells: numbers, then strings, then booleans, then
/// anything else; `Null` sorts last.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    const fn rank(v: &Value) -> u8 {
        match v {
            Value::Number(_) => 0,
            Value::String(_) => 1,
            Value::Bool(_) => 2,
            Value::Array(_) | Value::Object(_) => 3,
            Value::Null => 4,
        }
    }
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            x.as_f64().unwrap_or(f64::NAN).total_cmp(&y.as_f64().unwrap_or(f64::NAN))
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ if rank(a) == rank(b) => a.to_string().cmp(&b.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}
