//! Recursive descent over a declared entity schema.

use std::collections::HashSet;

use tracing::debug;

use crate::error::SchemaError;

use super::descriptor::PropertyDescriptor;
use super::naming::camel_path;
use super::types::{TypeSchema, ValueType};

/// Builds the flat descriptor list of an entity type.
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Walks `root` and every reachable nested type.
    ///
    /// Each property yields one descriptor keyed by its dotted path.
    /// Sequences recurse into their element type under the property's own
    /// path; objects recurse into their schema under the same path. A type
    /// already on the descent stack is recorded but not entered again.
    pub fn build(root: &TypeSchema) -> Result<Vec<PropertyDescriptor>, SchemaError> {
        let mut descriptors = Vec::new();
        let mut stack = Vec::new();
        walk(root, None, &mut stack, &mut descriptors)?;
        Ok(descriptors)
    }
}

fn walk(
    schema: &TypeSchema,
    current_path: Option<&str>,
    stack: &mut Vec<String>,
    out: &mut Vec<PropertyDescriptor>,
) -> Result<(), SchemaError> {
    if schema.name.trim().is_empty() {
        return Err(SchemaError::MissingTypeName {
            path: current_path.unwrap_or("<root>").to_string(),
        });
    }

    stack.push(schema.name.clone());
    let mut seen = HashSet::new();

    for property in &schema.properties {
        if property.name.trim().is_empty() {
            return Err(SchemaError::MissingPropertyName {
                type_name: schema.name.clone(),
            });
        }
        if !seen.insert(property.name.as_str()) {
            return Err(SchemaError::DuplicateProperty {
                type_name: schema.name.clone(),
                name: property.name.clone(),
            });
        }

        let full_path = match current_path {
            Some(path) => format!("{}.{}", path, property.name),
            None => property.name.clone(),
        };

        if let Some(spec) = &property.aggregate {
            if spec.order.trim().is_empty() {
                return Err(SchemaError::EmptyAggregateOrder { path: full_path });
            }
        }

        out.push(PropertyDescriptor {
            declaring_type: schema.name.clone(),
            name: property.name.clone(),
            full_path: full_path.clone(),
            value_type: property.value_type.clone(),
            nested_path: current_path.map(str::to_string),
            is_aggregate_target: property.aggregate.is_some(),
            aggregate_group_by: property
                .aggregate
                .as_ref()
                .and_then(|spec| spec.group_by.as_deref())
                .map(camel_path),
            aggregate_order: property
                .aggregate
                .as_ref()
                .map(|spec| camel_path(&spec.order)),
        });

        if let ValueType::Object(schema_fn) = element_type(&property.value_type) {
            let child = schema_fn();
            if stack.contains(&child.name) {
                debug!(
                    path = %full_path,
                    type_name = %child.name,
                    "Recursive type reference, not descending"
                );
                continue;
            }
            walk(&child, Some(&full_path), stack, out)?;
        }
    }

    stack.pop();
    Ok(())
}

/// Strips optional and sequence wrappers down to the innermost element type.
fn element_type(value_type: &ValueType) -> &ValueType {
    match value_type {
        ValueType::Optional(inner) | ValueType::List(inner) => element_type(inner),
        other => other,
    }
}
