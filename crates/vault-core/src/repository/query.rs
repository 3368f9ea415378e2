//! Query Building
//!
//! Filter predicates and ordering shared by every backend. The hosted
//! backend renders them as PostgREST query parameters; the in-memory
//! backend evaluates them directly against JSON rows.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::Table;

/// Row predicate
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn is_in<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In(column.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(column, _) | Filter::In(column, _) => column,
        }
    }

    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Filter::Eq(column, value) => row.get(column) == Some(value),
            Filter::In(column, values) => row
                .get(column)
                .map(|field| values.contains(field))
                .unwrap_or(false),
        }
    }

    /// PostgREST operator expression, e.g. `eq.abc` or `in.("a","b")`
    pub fn to_expression(&self) -> String {
        match self {
            Filter::Eq(_, value) => format!("eq.{}", plain(value)),
            Filter::In(_, values) => {
                let items: Vec<String> = values.iter().map(quoted).collect();
                format!("in.({})", items.join(","))
            }
        }
    }

    /// `column=expression`, the form used in realtime subscription filters
    pub fn to_realtime_filter(&self) -> String {
        format!("{}={}", self.column(), self.to_expression())
    }
}

fn plain(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s.replace('"', "\\\"")),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub direction: Direction,
}

impl Order {
    pub fn to_expression(&self) -> String {
        let dir = match self.direction {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        };
        format!("{}.{}", self.column, dir)
    }

    /// Compare two rows by this order's column
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        let ord = compare_values(a.get(&self.column), b.get(&self.column));
        match self.direction {
            Direction::Ascending => ord,
            Direction::Descending => ord.reverse(),
        }
    }
}

/// Missing/null sorts first; timestamps compare chronologically
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(dx), Ok(dy)) => dx.cmp(&dy),
                _ => x.cmp(y),
            }
        }
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

/// A select against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: Table,
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: Table) -> Self {
        Self {
            table,
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn order(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some(Order {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// PostgREST query string pairs
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(filter_params(&self.filters));
        if let Some(order) = &self.order {
            params.push(("order".to_string(), order.to_expression()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

pub fn filter_params(filters: &[Filter]) -> Vec<(String, String)> {
    filters
        .iter()
        .map(|f| (f.column().to_string(), f.to_expression()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params() {
        let query = Query::from(Table::Threads)
            .eq("memory_id", "m-1")
            .filter(Filter::is_in("id", ["a", "b"]))
            .order("created_at", Direction::Ascending)
            .limit(10);
        assert_eq!(
            query.to_params(),
            vec![
                ("select".to_string(), "*".to_string()),
                ("memory_id".to_string(), "eq.m-1".to_string()),
                ("id".to_string(), "in.(\"a\",\"b\")".to_string()),
                ("order".to_string(), "created_at.asc".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_filter_matching() {
        let row = json!({"id": "a", "memory_id": "m-1"});
        assert!(Filter::eq("memory_id", "m-1").matches(&row));
        assert!(!Filter::eq("memory_id", "m-2").matches(&row));
        assert!(Filter::is_in("id", ["a", "c"]).matches(&row));
        assert!(!Filter::eq("missing", "x").matches(&row));
    }

    #[test]
    fn test_timestamp_order_is_chronological() {
        // lexical order would put the +02:00 value last
        let early = json!({"created_at": "2024-01-01T11:00:00+02:00"});
        let late = json!({"created_at": "2024-01-01T10:00:00Z"});
        let order = Order {
            column: "created_at".into(),
            direction: Direction::Ascending,
        };
        assert_eq!(order.compare(&early, &late), Ordering::Less);
    }

    #[test]
    fn test_realtime_filter() {
        assert_eq!(Filter::eq("memory_id", "m-9").to_realtime_filter(), "memory_id=eq.m-9");
    }
}
