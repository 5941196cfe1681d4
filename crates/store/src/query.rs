//! Query model shared by every store backend.
//!
//! Filters, ordering and limits are encoded as URL query pairs for the HTTP
//! backend and evaluated directly by the in-memory backend.

use serde_json::Value;

/// Hard provider limit on the number of elements in an `in` filter.
///
/// Queries carrying a larger disjunction are rejected server-side; callers
/// with longer id lists go through [`crate::query_in_batches`].
pub const IN_FILTER_LIMIT: usize = 30;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn display(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// Ordering on a single field.
///
/// Equal field values fall back to the document id so result order is
/// stable across backends and across merged batch queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ordering {
    pub field: String,
    pub direction: SortDirection,
}

impl Ordering {
    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Descending,
        }
    }

    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Ascending,
        }
    }
}

/// A single filter clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the given value.
    Eq(String, Value),
    /// Field value is one of the given strings.
    In(String, Vec<String>),
}

/// A query against one collection: zero or more filters, optional ordering
/// and an optional result limit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub ordering: Option<Ordering>,
    pub limit: Option<u32>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter.
    pub fn eq(self, field: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::Eq(field.to_string(), value.into()))
    }

    /// Add a filter clause.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Order results by a field, newest-first style descending.
    pub fn order_desc(mut self, field: &str) -> Self {
        self.ordering = Some(Ordering::descending(field));
        self
    }

    /// Order results by a field, ascending.
    pub fn order_asc(mut self, field: &str) -> Self {
        self.ordering = Some(Ordering::ascending(field));
        self
    }

    /// Limit the number of results.
    pub fn limit(mut self, count: u32) -> Self {
        self.limit = Some(count);
        self
    }

    /// Encode the query as URL query pairs for the HTTP backend.
    pub(crate) fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        for filter in &self.filters {
            match filter {
                Filter::Eq(field, value) => {
                    pairs.push((field.clone(), format!("eq.{}", scalar_repr(value))));
                }
                Filter::In(field, values) => {
                    pairs.push((field.clone(), format!("in.({})", values.join(","))));
                }
            }
        }
        if let Some(ordering) = &self.ordering {
            pairs.push((
                "order".to_string(),
                format!("{}.{}", ordering.field, ordering.direction.display()),
            ));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }
}

fn scalar_repr(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Sort documents in place under the given ordering, with a document-id
/// tie-break for equal field values.
pub fn sort_documents(docs: &mut [Value], ordering: &Ordering) {
    use std::cmp::Ordering as O;
    docs.sort_by(|a, b| {
        // Documents missing the sort field go last regardless of direction.
        let field_cmp = match (a.get(&ordering.field), b.get(&ordering.field)) {
            (Some(_), None) => O::Less,
            (None, Some(_)) => O::Greater,
            (None, None) => O::Equal,
            (Some(x), Some(y)) => {
                let cmp = compare_values(x, y);
                match ordering.direction {
                    SortDirection::Ascending => cmp,
                    SortDirection::Descending => cmp.reverse(),
                }
            }
        };
        field_cmp.then_with(|| {
            let a_id = a.get("id").and_then(Value::as_str).unwrap_or_default();
            let b_id = b.get("id").and_then(Value::as_str).unwrap_or_default();
            a_id.cmp(b_id)
        })
    });
}

// Timestamps are RFC 3339 strings, so string comparison orders them
// chronologically. Numbers compare numerically.
fn compare_values(a: &Value, b: &Value) -> std::cmp::Ordering {
    use std::cmp::Ordering as O;
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(f64::NAN)
            .partial_cmp(&y.as_f64().unwrap_or(f64::NAN))
            .unwrap_or(O::Equal),
        _ => O::Equal,
    }
}
