//! Time series and frequency tables over bibliographic subsets.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde_json::Value;

use crate::error::{MetricsError, MetricsResult};
use crate::table::{Table, compare_values, value_as_f64, value_to_text};

/// Group rows by `by` plus the `groupby` columns and count them, or sum
/// `weight` when given. Missing values form their own group.
///
/// The result has the grouping columns followed by `count` (or `value`),
/// sorted by the grouping columns.
pub fn trend(table: &Table, by: &str, groupby: &[&str], weight: Option<&str>) -> MetricsResult<Table> {
    let mut grouping = vec![by];
    grouping.extend(groupby.iter().copied().filter(|c| *c != by));
    let indices = grouping
        .iter()
        .map(|c| table.require_column(c, "table"))
        .collect::<MetricsResult<Vec<_>>>()?;
    let weight_index = weight.map(|w| table.require_column(w, "table")).transpose()?;

    let mut groups: Vec<(Vec<Value>, f64, i64)> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    for row in table.rows() {
        let key: Vec<Value> = indices.iter().map(|&i| row.values()[i].clone()).collect();
        let signature = serde_json::to_string(&key)?;
        let slot = *lookup.entry(signature).or_insert_with(|| {
            groups.push((key, 0.0, 0));
            groups.len() - 1
        });
        groups[slot].2 += 1;
        if let Some(w) = weight_index {
            groups[slot].1 += value_as_f64(&row.values()[w]).unwrap_or(0.0);
        }
    }

    groups.sort_by(|a, b| {
        a.0.iter()
            .zip(&b.0)
            .map(|(x, y)| compare_values(x, y))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });

    let measure = if weight.is_some() { "value" } else { "count" };
    let mut columns: Vec<String> = grouping.iter().map(|c| (*c).to_string()).collect();
    columns.push(measure.to_string());
    let mut result = Table::new(columns);
    for (mut key, sum, count) in groups {
        key.push(if weight.is_some() { Value::from(sum) } else { Value::from(count) });
        result.push_row(key)?;
    }
    tracing::debug!(by, groups = result.len(), measure, "Computed trend");
    Ok(result)
}

/// The `k` most frequent values of `field`.
///
/// List cells contribute each item; string cells are split on `separator`
/// when given. Blank values are dropped and ties keep first-seen order.
pub fn topk(table: &Table, field: &str, k: usize, separator: Option<&str>) -> MetricsResult<Table> {
    let index = table.require_column(field, "table")?;
    if k == 0 {
        return Err(MetricsError::validation("k", "k must be positive"));
    }

    let mut counts: Vec<(String, i64)> = Vec::new();
    let mut lookup: HashMap<String, usize> = HashMap::new();
    let mut add = |value: &str| {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        match lookup.get(value) {
            Some(&slot) => counts[slot].1 += 1,
            None => {
                lookup.insert(value.to_string(), counts.len());
                counts.push((value.to_string(), 1));
            }
        }
    };

    for row in table.rows() {
        match &row.values()[index] {
            Value::Null => {}
            Value::Array(items) => {
                items.iter().filter(|v| !v.is_null()).for_each(|v| add(value_to_text(v).as_str()));
            }
            Value::String(s) => match separator {
                Some(sep) => s.split(sep).for_each(&mut add),
                None => add(s.as_str()),
            },
            other => add(value_to_text(other).as_str()),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(k);

    let mut result = Table::new([field, "count"]);
    for (value, count) in counts {
        result.push_row(vec![Value::String(value), Value::from(count)])?;
    }
    Ok(result)
}
