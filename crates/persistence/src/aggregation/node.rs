//! Aggregation tree nodes.

use serde_json::{Map, Value, json};

use crate::query::CompiledQuery;
use crate::types::GROUP_BY_KEY;

/// Bucket size requested for terms aggregations.
///
/// Every distinct term is returned; high-cardinality fields pay for it.
pub const TERMS_SIZE: i32 = i32::MAX;

/// One named aggregation of a request.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregationNode {
    /// Distinct values of a root-level field.
    Terms {
        name: String,
        field: String,
        order_key: String,
    },
    /// Distinct values of a field under a nested path.
    ///
    /// `scope`, when present, restricts the nested objects counted and is
    /// rendered as a `group_by` filter container around the terms.
    NestedTerms {
        name: String,
        path: String,
        inner_name: String,
        field: String,
        order_key: String,
        scope: Option<CompiledQuery>,
    },
    Min { name: String, field: String },
    Max { name: String, field: String },
    Avg { name: String, field: String },
}

impl AggregationNode {
    pub fn name(&self) -> &str {
        match self {
            AggregationNode::Terms { name, .. }
            | AggregationNode::NestedTerms { name, .. }
            | AggregationNode::Min { name, .. }
            | AggregationNode::Max { name, .. }
            | AggregationNode::Avg { name, .. } => name,
        }
    }

    /// Renders the aggregation body (without its name).
    pub fn to_json(&self) -> Value {
        match self {
            AggregationNode::Terms {
                field, order_key, ..
            } => terms(field, order_key),
            AggregationNode::NestedTerms {
                path,
                inner_name,
                field,
                order_key,
                scope,
                ..
            } => {
                let inner = json!({ inner_name: terms(field, order_key) });
                let aggs = match scope {
                    Some(scope) => json!({
                        GROUP_BY_KEY: {
                            "filter": scope.to_json(),
                            "aggs": inner,
                        }
                    }),
                    None => inner,
                };
                json!({
                    "nested": { "path": path },
                    "aggs": aggs,
                })
            }
            AggregationNode::Min { field, .. } => json!({ "min": { "field": field } }),
            AggregationNode::Max { field, .. } => json!({ "max": { "field": field } }),
            AggregationNode::Avg { field, .. } => json!({ "avg": { "field": field } }),
        }
    }
}

fn terms(field: &str, order_key: &str) -> Value {
    json!({
        "terms": {
            "field": field,
            "size": TERMS_SIZE,
            "order": { order_key: "asc" },
        }
    })
}

/// Renders the `aggs` object of a request.
pub fn render(nodes: &[AggregationNode]) -> Value {
    let mut aggs = Map::new();
    for node in nodes {
        aggs.insert(node.name().to_string(), node.to_json());
    }
    Value::Object(aggs)
}
