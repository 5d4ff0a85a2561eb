//! Compiled query tree and its Query DSL rendering.

use serde_json::{Map, Number, Value, json};

/// Boolean query tree produced from a filter object.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledQuery {
    /// Exact match on one value.
    Term { field: String, value: Value },
    /// Exact match on any of the values.
    Terms { field: String, values: Vec<Value> },
    /// Exclusive numeric range.
    Range {
        field: String,
        gt: f64,
        lt: Option<f64>,
    },
    /// Wildcard containment through `query_string`.
    TextMatch { field: String, pattern: String },
    Bool {
        must: Vec<CompiledQuery>,
        should: Vec<CompiledQuery>,
    },
    /// Query evaluated against the objects under `path`.
    Nested {
        path: String,
        query: Box<CompiledQuery>,
        inner_hits_size: u32,
    },
}

impl CompiledQuery {
    /// Conjunction of `self` and `other`.
    ///
    /// A conjunction built by a previous call is extended in place so that
    /// folding many leaves yields one flat `must` list in insertion order.
    pub fn and(self, other: CompiledQuery) -> CompiledQuery {
        match self {
            CompiledQuery::Bool { mut must, should } if should.is_empty() => {
                must.push(other);
                CompiledQuery::Bool { must, should }
            }
            first => CompiledQuery::Bool {
                must: vec![first, other],
                should: Vec::new(),
            },
        }
    }

    /// An empty boolean query (matches everything).
    pub fn match_all() -> CompiledQuery {
        CompiledQuery::Bool {
            must: Vec::new(),
            should: Vec::new(),
        }
    }

    /// Renders the tree as Query DSL.
    pub fn to_json(&self) -> Value {
        match self {
            CompiledQuery::Term { field, value } => json!({ "term": { field: value } }),
            CompiledQuery::Terms { field, values } => json!({ "terms": { field: values } }),
            CompiledQuery::Range { field, gt, lt } => {
                let mut bounds = Map::new();
                bounds.insert("gt".to_string(), number(*gt));
                if let Some(lt) = lt {
                    bounds.insert("lt".to_string(), number(*lt));
                }
                json!({ "range": { field: Value::Object(bounds) } })
            }
            CompiledQuery::TextMatch { field, pattern } => json!({
                "query_string": {
                    "default_field": field,
                    "query": pattern,
                }
            }),
            CompiledQuery::Bool { must, should } => {
                let mut clauses = Map::new();
                if !must.is_empty() {
                    clauses.insert(
                        "must".to_string(),
                        Value::Array(must.iter().map(CompiledQuery::to_json).collect()),
                    );
                }
                if !should.is_empty() {
                    clauses.insert(
                        "should".to_string(),
                        Value::Array(should.iter().map(CompiledQuery::to_json).collect()),
                    );
                }
                json!({ "bool": Value::Object(clauses) })
            }
            CompiledQuery::Nested {
                path,
                query,
                inner_hits_size,
            } => json!({
                "nested": {
                    "path": path,
                    "query": query.to_json(),
                    "inner_hits": { "size": inner_hits_size },
                }
            }),
        }
    }
}

/// Renders integral floats as integers (`5` rather than `5.0`).
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::Number((value as i64).into())
    } else {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}
