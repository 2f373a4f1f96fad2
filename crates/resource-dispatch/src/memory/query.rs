//! Composable queries over serialized rows.

use crate::params::SortDirection;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals the value. Strings match numbers and booleans by their text.
    Eq(String, Value),
    /// Field is an array containing the value (same loose matching).
    Contains(String, Value),
}

impl Condition {
    fn matches(&self, row: &Value) -> bool {
        match self {
            Condition::Eq(field, expected) => row
                .get(field)
                .is_some_and(|actual| loosely_equal(actual, expected)),
            Condition::Contains(field, expected) => row
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.iter().any(|item| loosely_equal(item, expected))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryQuery {
    conditions: Vec<Condition>,
    order: Vec<(String, SortDirection)>,
    offset: u64,
    limit: Option<u64>,
}

impl MemoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push(Condition::Eq(field.into(), value.into()));
        self
    }

    pub fn where_contains(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Contains(field.into(), value.into()));
        self
    }

    /// Adds a sort key. Earlier keys take precedence.
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push((field.into(), direction));
        self
    }

    pub fn window(mut self, offset: u64, limit: u64) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    /// The same query without its window, as used for counting.
    pub fn unwindowed(&self) -> Self {
        Self {
            offset: 0,
            limit: None,
            ..self.clone()
        }
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn ordering(&self) -> &[(String, SortDirection)] {
        &self.order
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.conditions.iter().all(|condition| condition.matches(row))
    }

    /// Filters, orders and windows `rows`, returning the selected indices.
    pub(crate) fn select(&self, rows: &[&Value]) -> Vec<usize> {
        let mut selected: Vec<usize> = (0..rows.len()).filter(|&i| self.matches(rows[i])).collect();

        if !self.order.is_empty() {
            // Stable sort keeps insertion (id) order among equal keys.
            selected.sort_by(|&a, &b| {
                self.order
                    .iter()
                    .map(|(field, direction)| {
                        let ordering = compare_values(rows[a].get(field), rows[b].get(field));
                        match direction {
                            SortDirection::Ascending => ordering,
                            SortDirection::Descending => ordering.reverse(),
                        }
                    })
                    .find(|ordering| ordering.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        let limit = self.limit.unwrap_or(u64::MAX);
        selected
            .into_iter()
            .skip(self.offset as usize)
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect()
    }
}

fn loosely_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
            n.to_string() == *s
        }
        (Value::Bool(b), Value::String(s)) | (Value::String(s), Value::Bool(b)) => {
            b.to_string() == *s
        }
        _ => actual == expected,
    }
}

/// Missing and null sort first; numbers numerically; strings lexically.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    fn rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(_) => 4,
        }
    }

    match (a, b) {
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows() -> Vec<Value> {
        vec![
            json!({ "id": 1, "title": "b", "rating": 3, "tags": ["rust"] }),
            json!({ "id": 2, "title": "a", "rating": 5, "tags": [] }),
            json!({ "id": 3, "title": "c", "rating": 3, "tags": ["rust", "async"] }),
        ]
    }

    fn titles(query: &MemoryQuery) -> Vec<String> {
        let rows = rows();
        let refs: Vec<&Value> = rows.iter().collect();
        query
            .select(&refs)
            .into_iter()
            .map(|i| rows[i]["title"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn string_filters_match_numeric_fields() {
        let query = MemoryQuery::new().where_eq("id", "2");
        assert_eq!(titles(&query), ["a"]);
    }

    #[test]
    fn contains_checks_array_membership() {
        let query = MemoryQuery::new().where_contains("tags", "rust");
        assert_eq!(titles(&query), ["b", "c"]);
    }

    #[test]
    fn multi_key_ordering_then_window() {
        let query = MemoryQuery::new()
            .order_by("rating", SortDirection::Descending)
            .order_by("title", SortDirection::Ascending);
        assert_eq!(titles(&query), ["a", "b", "c"]);

        let second_page = query.window(1, 1);
        assert_eq!(titles(&second_page), ["b"]);
        assert_eq!(titles(&second_page.unwindowed()).len(), 3);
    }
}
