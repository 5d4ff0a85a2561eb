//! Aggregation compilation from annotated properties.

use crate::query::{CompiledFilters, CompiledQuery};
use crate::schema::{DocumentSchema, KEY_ORDER, PropertyDescriptor};

use super::node::AggregationNode;

/// Builds the aggregation tree of an entity type.
#[derive(Debug, Clone)]
pub struct AggregationCompiler {
    schema: DocumentSchema,
}

impl AggregationCompiler {
    pub fn new(schema: DocumentSchema) -> Self {
        Self { schema }
    }

    /// One or two nodes per aggregation target, in declaration order.
    ///
    /// Nested targets pick up the nested query the filter compiled for the
    /// same path as their scope.
    pub fn compile(&self, filters: &CompiledFilters) -> Vec<AggregationNode> {
        let mut nodes = Vec::new();
        for descriptor in self.schema.aggregate_targets() {
            compile_target(descriptor, filters, &mut nodes);
        }
        nodes
    }
}

fn compile_target(
    descriptor: &PropertyDescriptor,
    filters: &CompiledFilters,
    nodes: &mut Vec<AggregationNode>,
) {
    let field = descriptor.exact_field();
    let order_key = descriptor
        .aggregate_order
        .clone()
        .unwrap_or_else(|| KEY_ORDER.to_string());

    if let Some(path) = descriptor.wire_nested_path() {
        let scope = filters.nested_for(&path).and_then(|node| match node {
            CompiledQuery::Nested { query, .. } => Some(query.as_ref().clone()),
            _ => None,
        });
        nodes.push(AggregationNode::NestedTerms {
            name: descriptor.name.clone(),
            path,
            inner_name: descriptor.wire_name(),
            field,
            order_key,
            scope,
        });
        return;
    }

    if descriptor.value_type.is_numeric() {
        nodes.push(AggregationNode::Min {
            name: format!("{}Min", descriptor.name),
            field: field.clone(),
        });
        nodes.push(AggregationNode::Max {
            name: format!("{}Max", descriptor.name),
            field,
        });
        return;
    }

    if descriptor.value_type.is_boolean() {
        nodes.push(AggregationNode::Avg {
            name: format!("{}Avg", descriptor.name),
            field,
        });
        return;
    }

    nodes.push(AggregationNode::Terms {
        name: descriptor.name.clone(),
        field,
        order_key,
    });
}
